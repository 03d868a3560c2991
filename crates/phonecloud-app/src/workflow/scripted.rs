//! Workflows described as ordered action steps in a TOML file.
//!
//! ```toml
//! name = "warm-up"
//!
//! [[steps]]
//! action = "open_app"
//! args = { package_name = "com.example" }
//! label = "Opening app"
//!
//! [[steps]]
//! sleep_ms = 2000
//!
//! [[steps]]
//! action = "find_node_exist"
//! args = { type = "TEXT", keyword = "Welcome", retry = { count = 10, after_ms = 500 } }
//! timeout_ms = 15000
//! expect = "truthy"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use phonecloud_core::prelude::*;

use super::{Workflow, WorkflowContext};

/// What a step's result must look like for the workflow to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expectation {
    /// `status` is true
    #[default]
    Ok,
    /// `status` is true and the result is truthy
    Truthy,
    /// Any outcome, including failure and timeout
    Any,
}

/// One step: either an action or a pause.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowStep {
    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub args: Value,

    /// Deadline override; the catalog default applies otherwise
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Progress label reported before the step runs
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub expect: Expectation,

    #[serde(default)]
    pub sleep_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkflowFile {
    name: String,
    #[serde(default)]
    steps: Vec<WorkflowStep>,
}

/// A workflow loaded from TOML and executed through the raw action entry
/// point.
#[derive(Debug, Clone)]
pub struct ScriptedWorkflow {
    name: String,
    steps: Vec<WorkflowStep>,
}

impl ScriptedWorkflow {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: WorkflowFile = toml::from_str(content)?;

        if file.steps.is_empty() {
            return Err(Error::config(format!(
                "workflow '{}' has no steps",
                file.name
            )));
        }
        for (index, step) in file.steps.iter().enumerate() {
            match (&step.action, step.sleep_ms) {
                (Some(action), None) if !action.trim().is_empty() => {}
                (None, Some(_)) => {}
                _ => {
                    return Err(Error::config(format!(
                        "workflow '{}' step {}: set exactly one of `action` or `sleep_ms`",
                        file.name,
                        index + 1
                    )))
                }
            }
        }

        Ok(Self {
            name: file.name,
            steps: file.steps,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workflow {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    async fn run_step(&self, ctx: &WorkflowContext, index: usize, step: &WorkflowStep) -> Result<()> {
        if let Some(label) = &step.label {
            ctx.report(label.clone());
        }

        let action = match (&step.action, step.sleep_ms) {
            (Some(action), _) => action,
            (None, Some(ms)) => {
                ctx.sleep(Duration::from_millis(ms)).await;
                return Ok(());
            }
            (None, None) => return Ok(()),
        };

        let timeout = step.timeout_ms.map(Duration::from_millis);
        let result = ctx.invoke(action, step.args.clone(), timeout).await?;
        trace!(
            "[{}] step {} {} -> status={}",
            ctx.device_id(),
            index + 1,
            action,
            result.status
        );

        match step.expect {
            Expectation::Ok => {
                result.into_result(action)?;
            }
            Expectation::Truthy => {
                if !result.is_truthy() {
                    let message = result
                        .error
                        .unwrap_or_else(|| format!("unexpected result {}", result.result));
                    return Err(Error::action_failed(action, message));
                }
            }
            Expectation::Any => {}
        }
        Ok(())
    }
}

impl Workflow for ScriptedWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &WorkflowContext) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            self.run_step(ctx, index, step).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::LocalWorkflow;
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    const SCRIPT: &str = r#"
name = "check-app"

[[steps]]
action = "open_app"
args = { package_name = "com.example" }
label = "Opening app"

[[steps]]
sleep_ms = 1

[[steps]]
action = "check_app_running"
args = { package_name = "com.example" }
timeout_ms = 2000
expect = "truthy"
"#;

    #[test]
    fn test_parse_script() {
        let workflow = ScriptedWorkflow::from_toml_str(SCRIPT).unwrap();
        assert_eq!(LocalWorkflow::name(&workflow), "check-app");
        assert_eq!(workflow.steps().len(), 3);
        assert_eq!(workflow.steps()[0].expect, Expectation::Ok);
        assert_eq!(workflow.steps()[1].sleep_ms, Some(1));
        assert_eq!(workflow.steps()[2].expect, Expectation::Truthy);
        assert_eq!(workflow.steps()[2].timeout_ms, Some(2000));
    }

    #[test]
    fn test_finder_step_args_match_typed_action() {
        let script = r#"
name = "welcome"

[[steps]]
action = "find_node_exist"
args = { type = "TEXT", keyword = "Welcome", retry = { count = 10, after_ms = 500 } }
expect = "truthy"
"#;
        let workflow = ScriptedWorkflow::from_toml_str(script).unwrap();
        let step = &workflow.steps()[0];

        // Same shape DeviceActions::find_node_exist puts on the wire
        let expected = json!({
            "type": phonecloud_link::NodeLocator::Text,
            "keyword": "Welcome",
            "retry": phonecloud_link::RetryPolicy::new(10, 500),
        });
        assert_eq!(step.args, expected);
    }

    #[test]
    fn test_step_must_be_action_or_sleep() {
        let both = r#"
name = "bad"
[[steps]]
action = "home"
sleep_ms = 10
"#;
        assert!(matches!(
            ScriptedWorkflow::from_toml_str(both),
            Err(Error::Config { .. })
        ));

        let neither = "name = \"bad\"\n[[steps]]\nlabel = \"x\"\n";
        assert!(ScriptedWorkflow::from_toml_str(neither).is_err());

        assert!(ScriptedWorkflow::from_toml_str("name = \"empty\"\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempdir().unwrap();
        let result = ScriptedWorkflow::load(&temp.path().join("nope.toml"));
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("flow.toml");
        std::fs::write(&path, SCRIPT).unwrap();
        assert_eq!(ScriptedWorkflow::load(&path).unwrap().steps().len(), 3);
    }

    /// Answer the next `frames` outbound action frames with `responder(action_id)`.
    fn spawn_device(
        ctx: WorkflowContext,
        mut outbound: tokio::sync::mpsc::UnboundedReceiver<String>,
        frames: usize,
        responder: fn(&str) -> (bool, Value),
    ) -> tokio::task::JoinHandle<Vec<String>> {
        tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..frames {
                let Some(frame) = outbound.recv().await else {
                    break;
                };
                let frame: Value = serde_json::from_str(&frame).unwrap();
                let payload = &frame["payload"];
                let action = payload["action_id"].as_str().unwrap().to_string();
                let (status, result) = responder(&action);
                let completion = phonecloud_link::CompletionPayload::from_message(&json!({
                    "request_id": payload["request_id"],
                    "status": status,
                    "result": result,
                    "error": if status { Value::Null } else { json!("boom") },
                }))
                .unwrap();
                ctx.actions().correlator().complete(completion);
                seen.push(action);
            }
            seen
        })
    }

    #[tokio::test]
    async fn test_run_all_steps() {
        let (ctx, outbound) = subscribed_context();
        let device = spawn_device(ctx.clone(), outbound, 2, |_| (true, json!(true)));

        let workflow = ScriptedWorkflow::from_toml_str(SCRIPT).unwrap();
        Workflow::run(&workflow, &ctx).await.unwrap();
        assert_eq!(ctx.registry().get("d1").unwrap().action, "Opening app");

        let seen = device.await.unwrap();
        assert_eq!(seen, vec!["open_app", "check_app_running"]);
    }

    #[tokio::test]
    async fn test_falsy_result_fails_truthy_step() {
        let (ctx, outbound) = subscribed_context();
        let _device = spawn_device(ctx.clone(), outbound, 2, |action| match action {
            "check_app_running" => (true, json!(false)),
            _ => (true, Value::Null),
        });

        let workflow = ScriptedWorkflow::from_toml_str(SCRIPT).unwrap();
        let err = Workflow::run(&workflow, &ctx).await.unwrap_err();
        assert!(matches!(err, Error::ActionFailed { ref action, .. } if action == "check_app_running"));
    }

    #[tokio::test]
    async fn test_failed_status_stops_at_first_step() {
        let (ctx, outbound) = subscribed_context();
        let _device = spawn_device(ctx.clone(), outbound, 1, |_| (false, Value::Null));

        let workflow = ScriptedWorkflow::from_toml_str(SCRIPT).unwrap();
        let err = Workflow::run(&workflow, &ctx).await.unwrap_err();
        assert!(matches!(err, Error::ActionFailed { ref action, ref message }
            if action == "open_app" && message == "boom"));
    }
}
