use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Starting,
    Running,
    Stopped,
    Crashed,
}

impl ProcessState {
    /// Starting and Running records count toward the single-instance rule.
    pub fn is_active(&self) -> bool {
        matches!(self, ProcessState::Starting | ProcessState::Running)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Starting => "starting",
            ProcessState::Running => "running",
            ProcessState::Stopped => "stopped",
            ProcessState::Crashed => "crashed",
        }
    }
}

/// One launch of one component, as seen by the supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: Uuid,
    pub component_id: String,
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub state: ProcessState,
    pub exit_code: Option<i32>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ProcessRecord {
    pub(crate) fn starting(component_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            component_id: component_id.to_string(),
            pid: None,
            started_at: Utc::now(),
            state: ProcessState::Starting,
            exit_code: None,
            ended_at: None,
        }
    }

    pub fn summary(&self) -> String {
        match (self.state, self.pid, self.exit_code) {
            (ProcessState::Running, Some(pid), _) => format!("running (pid {pid})"),
            (ProcessState::Crashed, _, Some(code)) => format!("crashed (exit code {code})"),
            (state, _, _) => state.as_str().to_string(),
        }
    }
}

/// Result of a launch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    Launched { pid: u32 },
    AlreadyRunning { pid: Option<u32> },
}

impl LaunchOutcome {
    pub fn describe(&self, component_id: &str) -> String {
        match self {
            LaunchOutcome::Launched { pid } => format!("Launched {component_id} (pid {pid})."),
            LaunchOutcome::AlreadyRunning { .. } => format!("{component_id} is already running."),
        }
    }
}

/// How a stop request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    NotRunning,
    Graceful,
    Forced,
}

impl StopOutcome {
    pub fn describe(&self, component_id: &str) -> String {
        match self {
            StopOutcome::NotRunning => format!("{component_id} is not running."),
            StopOutcome::Graceful => format!("Stopped {component_id}."),
            StopOutcome::Forced => format!("Force stopped {component_id}."),
        }
    }
}

/// A transition observed by the liveness poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub component_id: String,
    pub pid: Option<u32>,
    pub from: ProcessState,
    pub to: ProcessState,
    pub exit_code: Option<i32>,
}
