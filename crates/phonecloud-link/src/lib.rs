//! # phonecloud-link - Multiplexed Device Link
//!
//! Everything that talks to the PhoneCloud party channel: one WebSocket that
//! carries the traffic of every device in a session.
//!
//! Depends on [`phonecloud_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Connection
//! - [`ConnectionManager`] - Owns the transport, reconnects at a fixed interval
//! - [`ConnectionConfig`] - Endpoint, credential, reconnect delay
//! - [`ReconnectGuard`] - Single-slot reconnect scheduling
//!
//! ### Devices
//! - [`DeviceRegistry`] - Subscription id and status of every known device
//!
//! ### Requests
//! - [`RequestCorrelator`] - Matches replies to requests by id, with deadlines
//! - [`ActionHandle`] - Future resolving to an [`ActionResult`]
//!
//! ### Actions
//! - [`DeviceActions`] - Typed action vocabulary bound to one device
//! - [`actions::catalog`] - Wire ids and default deadlines
//!
//! ### Protocol
//! - [`parse_envelope()`] - Parse an inbound frame
//! - [`build_endpoint()`] - Build the connection URL
//!
//! [`ActionResult`]: phonecloud_core::ActionResult

pub mod actions;
pub mod client;
pub mod correlator;
pub mod protocol;
pub mod registry;

pub use actions::{
    AppListKind, CommandPermission, CoordinateKind, DeviceActions, NodeLocator, ProxyKind,
    ProxySettings, RetryPolicy, ScrollDirection, WriteMode, DEFAULT_ACTION_TIMEOUT,
};
pub use client::{
    ConnectionConfig, ConnectionManager, ConnectionState, ReconnectGuard, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_EVENT_CAPACITY, DEFAULT_RECONNECT_DELAY,
};
pub use correlator::{ActionHandle, RequestCorrelator, RequestIdGenerator};
pub use protocol::{
    build_endpoint, parse_envelope, CompletionPayload, InboundMessage, SubscriptionPayload,
    DEFAULT_ENDPOINT,
};
pub use registry::DeviceRegistry;
