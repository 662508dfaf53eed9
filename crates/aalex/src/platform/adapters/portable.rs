use std::process::{Command, ExitStatus, Stdio};

use async_trait::async_trait;
use serde_json::Value;

use super::Effector;
use crate::command::ActionKind;
use crate::error::{CoreError, CoreResult};
use crate::platform::types::EffectRequest;

/// Effector backed by the platform opener and plain process spawning.
#[derive(Debug, Default)]
pub struct SystemEffector;

impl SystemEffector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Effector for SystemEffector {
    fn id(&self) -> &str {
        std::env::consts::OS
    }

    async fn invoke(&self, kind: ActionKind, payload: &Value) -> CoreResult<String> {
        let request: EffectRequest = serde_json::from_value(payload.clone()).map_err(|error| {
            CoreError::InvalidInput(format!("unsupported {} payload: {error}", kind.as_str()))
        })?;
        tracing::debug!("effector {} request {:?}", kind.as_str(), request);
        match request {
            EffectRequest::Open { open } => {
                let target = open.clone();
                tokio::task::spawn_blocking(move || open_target_native(&target))
                    .await
                    .map_err(|error| CoreError::Internal(format!("open task failed: {error}")))??;
                Ok(format!("Opened {open}."))
            }
            EffectRequest::Run { run, args } => {
                spawn_detached(&run, &args)?;
                Ok(format!("Started {run}."))
            }
        }
    }
}

fn spawn_detached(program: &str, args: &[String]) -> CoreResult<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|error| CoreError::Internal(format!("failed to run {program}: {error}")))?;
    // Reap in the background so finished programs do not linger as zombies.
    std::thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(())
}

fn ensure_command_success(status: ExitStatus, command_label: &str) -> CoreResult<()> {
    if status.success() {
        Ok(())
    } else {
        Err(CoreError::Internal(format!(
            "{command_label} failed with status {status}"
        )))
    }
}

#[cfg(target_os = "macos")]
fn open_target_native(target: &str) -> CoreResult<()> {
    let status = Command::new("open")
        .arg(target)
        .status()
        .map_err(|error| CoreError::Internal(format!("failed to run open: {error}")))?;
    ensure_command_success(status, "open")
}

#[cfg(target_os = "linux")]
fn open_target_native(target: &str) -> CoreResult<()> {
    let status = Command::new("xdg-open")
        .arg(target)
        .status()
        .map_err(|error| CoreError::Internal(format!("failed to run xdg-open: {error}")))?;
    ensure_command_success(status, "xdg-open")
}

#[cfg(target_os = "windows")]
fn open_target_native(target: &str) -> CoreResult<()> {
    let status = Command::new("cmd")
        .arg("/C")
        .arg("start")
        .arg("")
        .arg(target)
        .status()
        .map_err(|error| CoreError::Internal(format!("failed to run start: {error}")))?;
    ensure_command_success(status, "start")
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn open_target_native(_target: &str) -> CoreResult<()> {
    Err(CoreError::Internal(
        "open is not supported on this platform".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn unsupported_payload_returns_invalid_input() {
        let effector = SystemEffector::new();
        let error = effector
            .invoke(ActionKind::Effector, &json!({ "volume": 11 }))
            .await
            .expect_err("volume is not an effect request");
        match error {
            CoreError::InvalidInput(message) => {
                assert!(message.starts_with("unsupported effector payload"))
            }
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_program_reports_internal_error() {
        let effector = SystemEffector::new();
        let result = effector
            .invoke(
                ActionKind::Effector,
                &json!({ "run": "aalex-definitely-not-a-program" }),
            )
            .await;
        assert!(matches!(
            result,
            Err(CoreError::Internal(message)) if message.starts_with("failed to run aalex-definitely-not-a-program")
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_request_starts_program() {
        let effector = SystemEffector::new();
        let response = effector
            .invoke(ActionKind::Effector, &json!({ "run": "true" }))
            .await
            .expect("true should start");
        assert_eq!(response, "Started true.");
    }

    #[test]
    fn failed_status_is_reported() {
        #[cfg(unix)]
        {
            let status = Command::new("false").status().expect("run false");
            let error = ensure_command_success(status, "false").unwrap_err();
            assert!(error.to_string().contains("false failed with status"));
        }
    }
}
