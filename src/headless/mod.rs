//! Headless mode - NDJSON event output
//!
//! Session events and run summaries are written to stdout as NDJSON
//! (newline-delimited JSON), one event per line. Each event has an "event"
//! field naming its type and a millisecond "timestamp".
//!
//! # Example Output
//!
//! ```json
//! {"event":"connected","timestamp":1704700001000}
//! {"event":"device_subscribed","device_id":"dev-1","subscription_id":"s-1","timestamp":1704700001200}
//! {"event":"workflow_started","device_id":"dev-1","workflow":"warm-up","timestamp":1704700002000}
//! {"event":"run_finished","completed":1,"exhausted":0,"cancelled":0,"timestamp":1704700009000}
//! ```

pub mod runner;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use phonecloud_app::{DeviceReport, HarnessOutcome};
use phonecloud_core::SessionEvent;

/// Events produced by the headless runner itself
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// Workflow started on the selected devices
    RunStarted {
        workflow: String,
        devices: Vec<String>,
    },

    /// A device's harness ended
    DeviceFinished {
        device_id: String,
        outcome: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        attempts: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Every device's harness ended
    RunFinished {
        completed: usize,
        exhausted: usize,
        cancelled: usize,
    },
}

impl RunEvent {
    pub fn device_finished(report: &DeviceReport) -> Self {
        let (outcome, attempts, error) = match &report.outcome {
            HarnessOutcome::Completed => ("completed", None, None),
            HarnessOutcome::Exhausted {
                attempts,
                last_error,
            } => ("exhausted", Some(*attempts), Some(last_error.clone())),
            HarnessOutcome::Cancelled => ("cancelled", None, None),
        };
        RunEvent::DeviceFinished {
            device_id: report.device_id.clone(),
            outcome,
            attempts,
            error,
        }
    }

    pub fn run_finished(reports: &[DeviceReport]) -> Self {
        let count = |pred: fn(&HarnessOutcome) -> bool| {
            reports.iter().filter(|r| pred(&r.outcome)).count()
        };
        RunEvent::RunFinished {
            completed: count(HarnessOutcome::is_completed),
            exhausted: count(HarnessOutcome::is_exhausted),
            cancelled: count(|o| matches!(o, HarnessOutcome::Cancelled)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum EventBody {
    Session(SessionEvent),
    Run(RunEvent),
}

/// One NDJSON line
#[derive(Debug, Clone, Serialize)]
pub struct HeadlessEvent {
    #[serde(flatten)]
    body: EventBody,
    timestamp: i64,
}

impl HeadlessEvent {
    pub fn session(event: SessionEvent) -> Self {
        Self {
            body: EventBody::Session(event),
            timestamp: Self::now(),
        }
    }

    pub fn run(event: RunEvent) -> Self {
        Self {
            body: EventBody::Run(event),
            timestamp: Self::now(),
        }
    }

    /// Emit this event to stdout as a single JSON line
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        // Flush so consumers see events as they happen
        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn to_value(event: &HeadlessEvent) -> Value {
        serde_json::to_value(event).unwrap()
    }

    #[test]
    fn test_session_event_is_flattened() {
        let value = to_value(&HeadlessEvent::session(SessionEvent::DeviceSubscribed {
            device_id: "d1".to_string(),
            subscription_id: "s1".to_string(),
        }));

        assert_eq!(value["event"], "device_subscribed");
        assert_eq!(value["device_id"], "d1");
        assert_eq!(value["subscription_id"], "s1");
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_unit_session_event() {
        let value = to_value(&HeadlessEvent::session(SessionEvent::Connected));
        assert_eq!(value["event"], "connected");
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn test_device_finished_fields() {
        let report = DeviceReport {
            device_id: "d1".to_string(),
            outcome: HarnessOutcome::Exhausted {
                attempts: 5,
                last_error: "boom".to_string(),
            },
        };
        let value = to_value(&HeadlessEvent::run(RunEvent::device_finished(&report)));

        assert_eq!(value["event"], "device_finished");
        assert_eq!(value["outcome"], "exhausted");
        assert_eq!(value["attempts"], 5);
        assert_eq!(value["error"], "boom");

        let completed = DeviceReport {
            device_id: "d2".to_string(),
            outcome: HarnessOutcome::Completed,
        };
        let value = to_value(&HeadlessEvent::run(RunEvent::device_finished(&completed)));
        assert!(value.get("attempts").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_run_finished_counts() {
        let reports = vec![
            DeviceReport {
                device_id: "a".to_string(),
                outcome: HarnessOutcome::Completed,
            },
            DeviceReport {
                device_id: "b".to_string(),
                outcome: HarnessOutcome::Cancelled,
            },
            DeviceReport {
                device_id: "c".to_string(),
                outcome: HarnessOutcome::Completed,
            },
        ];
        let value = to_value(&HeadlessEvent::run(RunEvent::run_finished(&reports)));

        assert_eq!(value["event"], "run_finished");
        assert_eq!(value["completed"], 2);
        assert_eq!(value["exhausted"], 0);
        assert_eq!(value["cancelled"], 1);
    }
}
