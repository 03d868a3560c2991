//! Wire types for the PhoneCloud party channel.
//!
//! Every frame is a JSON envelope `{type, payload}` where `type` is one of
//! `SUBSCRIBE`, `UNSUBSCRIBE` or `MESSAGE`. Outbound action requests carry the
//! device's subscription id at the top level and an `ACTION_CONTROL` payload;
//! replies come back as `MESSAGE` envelopes whose payload echoes the
//! `request_id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded::byte_serialize;
use url::Url;

use phonecloud_core::prelude::*;
use phonecloud_core::ActionResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default party-channel endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://phonecloud.dynns.com/ws/party";

/// Envelope kind for outbound action requests and inbound replies.
pub const KIND_MESSAGE: &str = "MESSAGE";

/// Payload kind for outbound action requests.
pub const KIND_ACTION_CONTROL: &str = "ACTION_CONTROL";

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Payload of an outbound action request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionControl {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub request_id: String,
    pub action_id: String,
    pub args: Value,
}

/// Outbound `MESSAGE` envelope addressed to one device subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionEnvelope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub subscription_id: String,
    pub payload: ActionControl,
}

impl ActionEnvelope {
    pub fn new(
        subscription_id: impl Into<String>,
        request_id: impl Into<String>,
        action_id: impl Into<String>,
        args: Value,
    ) -> Self {
        Self {
            kind: KIND_MESSAGE,
            subscription_id: subscription_id.into(),
            payload: ActionControl {
                kind: KIND_ACTION_CONTROL,
                request_id: request_id.into(),
                action_id: action_id.into(),
                args,
            },
        }
    }

    /// Serialize to the text frame sent on the wire.
    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Payload of `SUBSCRIBE` and `UNSUBSCRIBE` envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionPayload {
    pub device_id: String,
    /// Server-issued subscription id
    #[serde(rename = "id", default)]
    pub subscription_id: String,
}

/// Reply to an action request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionPayload {
    pub request_id: String,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Value,
}

impl CompletionPayload {
    /// Interpret a `MESSAGE` payload as a completion, if it carries a
    /// string `request_id`.
    ///
    /// A reply whose other fields are malformed still resolves its request,
    /// as a failure carrying a protocol error.
    pub fn from_message(payload: &Value) -> Option<Self> {
        let request_id = payload.get("request_id").and_then(Value::as_str)?;
        match serde_json::from_value(payload.clone()) {
            Ok(completion) => Some(completion),
            Err(err) => {
                debug!("Malformed reply for {}: {}", request_id, err);
                Some(Self {
                    request_id: request_id.to_string(),
                    status: false,
                    result: Value::Null,
                    error: Value::String(
                        Error::protocol(format!("malformed reply: {}", err)).to_string(),
                    ),
                })
            }
        }
    }

    pub fn into_action_result(self) -> ActionResult {
        let error = match self.error {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        };
        ActionResult::new(self.status, self.result, error)
    }
}

/// A parsed inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Subscribe(SubscriptionPayload),
    Unsubscribe(SubscriptionPayload),
    /// `MESSAGE` payload; may or may not be a completion.
    Message(Value),
    /// Anything that is not a well-formed envelope.
    Unknown(String),
}

/// Parse a text frame into an [`InboundMessage`].
///
/// Never fails: malformed input becomes [`InboundMessage::Unknown`].
pub fn parse_envelope(text: &str) -> InboundMessage {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return InboundMessage::Unknown(text.to_string()),
    };

    let kind = value.get("type").and_then(Value::as_str).unwrap_or("");
    let payload = value.get("payload").cloned().unwrap_or(Value::Null);

    match kind {
        "SUBSCRIBE" => match serde_json::from_value(payload) {
            Ok(p) => InboundMessage::Subscribe(p),
            Err(_) => InboundMessage::Unknown(text.to_string()),
        },
        "UNSUBSCRIBE" => match serde_json::from_value(payload) {
            Ok(p) => InboundMessage::Unsubscribe(p),
            Err(_) => InboundMessage::Unknown(text.to_string()),
        },
        KIND_MESSAGE => InboundMessage::Message(payload),
        _ => InboundMessage::Unknown(text.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Build the connection URL for `device_ids` using `access_token`.
///
/// Produces `<base>?Access-Token=<token>&Device-Ids=<id,id,...>`. Ids are
/// percent-encoded individually; the separating commas are kept literal.
pub fn build_endpoint(base: &str, access_token: &str, device_ids: &[String]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| Error::config(format!("invalid endpoint '{}': {}", base, e)))?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(Error::config(format!(
                "endpoint must use ws:// or wss://, got {}://",
                other
            )))
        }
    }

    let token: String = byte_serialize(access_token.as_bytes()).collect();
    let ids = device_ids
        .iter()
        .map(|id| byte_serialize(id.as_bytes()).collect::<String>())
        .collect::<Vec<_>>()
        .join(",");

    url.set_query(Some(&format!("Access-Token={}&Device-Ids={}", token, ids)));
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_envelope_shape() {
        let envelope = ActionEnvelope::new("sub-1", "req-1", "open_app", json!({"a": 1}));
        let value: Value = serde_json::from_str(&envelope.to_frame().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "MESSAGE",
                "subscription_id": "sub-1",
                "payload": {
                    "type": "ACTION_CONTROL",
                    "request_id": "req-1",
                    "action_id": "open_app",
                    "args": {"a": 1}
                }
            })
        );
    }

    #[test]
    fn test_parse_subscribe() {
        let msg = parse_envelope(r#"{"type":"SUBSCRIBE","payload":{"device_id":"d1","id":"s1"}}"#);
        assert_eq!(
            msg,
            InboundMessage::Subscribe(SubscriptionPayload {
                device_id: "d1".into(),
                subscription_id: "s1".into(),
            })
        );
    }

    #[test]
    fn test_parse_unsubscribe_without_id() {
        let msg = parse_envelope(r#"{"type":"UNSUBSCRIBE","payload":{"device_id":"d1"}}"#);
        match msg {
            InboundMessage::Unsubscribe(p) => {
                assert_eq!(p.device_id, "d1");
                assert!(p.subscription_id.is_empty());
            }
            other => panic!("expected Unsubscribe, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_message_and_completion() {
        let msg = parse_envelope(
            r#"{"type":"MESSAGE","payload":{"request_id":"r1","status":true,"result":42}}"#,
        );
        let InboundMessage::Message(payload) = msg else {
            panic!("expected Message");
        };
        let completion = CompletionPayload::from_message(&payload).unwrap();
        assert_eq!(completion.request_id, "r1");

        let result = completion.into_action_result();
        assert!(result.status);
        assert_eq!(result.result, json!(42));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_message_without_request_id_is_not_completion() {
        assert!(CompletionPayload::from_message(&json!({"battery": 80})).is_none());
        assert!(CompletionPayload::from_message(&json!({"request_id": 7})).is_none());
    }

    #[test]
    fn test_completion_with_non_boolean_status_fails() {
        let completion = CompletionPayload::from_message(
            &json!({"request_id": "r3", "status": 1, "result": "ok"}),
        )
        .unwrap();
        assert_eq!(completion.request_id, "r3");

        let result = completion.into_action_result();
        assert!(!result.status);
        assert_eq!(result.result, Value::Null);
        let error = result.error.unwrap();
        assert!(error.starts_with("Protocol error: malformed reply"), "{}", error);
    }

    #[test]
    fn test_completion_failure_keeps_error_text() {
        let completion = CompletionPayload::from_message(
            &json!({"request_id": "r2", "status": false, "error": "node not found"}),
        )
        .unwrap();
        let result = completion.into_action_result();
        assert!(!result.status);
        assert_eq!(result.error.as_deref(), Some("node not found"));
    }

    #[test]
    fn test_parse_malformed_is_unknown() {
        assert!(matches!(parse_envelope("not json"), InboundMessage::Unknown(_)));
        assert!(matches!(
            parse_envelope(r#"{"type":"PING"}"#),
            InboundMessage::Unknown(_)
        ));
        assert!(matches!(
            parse_envelope(r#"{"type":"SUBSCRIBE","payload":{"id":"s1"}}"#),
            InboundMessage::Unknown(_)
        ));
    }

    #[test]
    fn test_build_endpoint() {
        let url = build_endpoint(
            DEFAULT_ENDPOINT,
            "tok en",
            &["d1".to_string(), "d2".to_string()],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "wss://phonecloud.dynns.com/ws/party?Access-Token=tok+en&Device-Ids=d1,d2"
        );
    }

    #[test]
    fn test_build_endpoint_rejects_http() {
        let err = build_endpoint("https://example.com/ws", "t", &[]).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
