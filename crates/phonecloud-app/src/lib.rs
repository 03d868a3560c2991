//! # phonecloud-app - Session Orchestration
//!
//! Drives device fleets on top of [`phonecloud_link`]: configuration, the
//! session context, per-device retry harnesses and workflows.
//!
//! ## Public API
//!
//! ### Configuration
//! - [`config::load_settings()`] - Load `.phonecloud/config.toml`
//! - [`config::Settings`] - Connection, retry and device settings
//!
//! ### Session
//! - [`Session`] - One connection, explicit start/stop
//!
//! ### Workflows
//! - [`Workflow`] - Automation trait run per device
//! - [`WorkflowContext`] - Actions, progress reporting, helpers
//! - [`ScriptedWorkflow`] - Workflow loaded from a TOML step list
//!
//! ### Execution
//! - [`RetryHarness`] - Restart-on-failure state machine for one device
//! - [`FleetRunner`] - One harness per device, concurrently

pub mod config;
pub mod retry;
pub mod runner;
pub mod session;
pub mod workflow;

pub use config::Settings;
pub use retry::{
    run_with_retry, HarnessOutcome, HarnessPolicy, HarnessState, RetryHarness,
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, STALLED_LABEL,
};
pub use runner::{DeviceReport, FleetRunner, DEFAULT_SUBSCRIBE_WAIT};
pub use session::Session;
pub use workflow::{
    random_number, random_string, Expectation, LocalWorkflow, RandomStringOptions,
    ScriptedWorkflow, Workflow, WorkflowContext, WorkflowStep,
};
