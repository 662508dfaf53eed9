//! Component process supervision: launch, liveness, graceful-then-forced stop.
//!
//! The `ProcessSupervisor` owns the process table. Every read and mutation
//! goes through one mutex, which is never held across an `.await` or a
//! process spawn, so `status()` stays cheap while launches and the liveness
//! poller run.

pub mod component;
pub mod poller;
mod process;
pub mod record;

use std::collections::BTreeSet;
use std::process::Child;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

pub use component::{default_components, ComponentSpec};
pub use poller::spawn_poller;
pub use record::{LaunchOutcome, ProcessRecord, ProcessState, StateChange, StopOutcome};

/// Terminal records kept for diagnostics.
pub const HISTORY_LIMIT: usize = 50;

/// How often `stop` re-checks a process during its grace period.
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(50);

struct TableEntry {
    record: ProcessRecord,
    child: Option<Child>,
    stop_requested: bool,
}

impl TableEntry {
    /// Settles the record if its process has exited.
    ///
    /// A Starting entry has no child yet and counts as alive.
    fn settle(&mut self) -> Option<StateChange> {
        if self.record.state.is_terminal() {
            return None;
        }
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(Some(status)) => {
                let to = if status.success() || self.stop_requested {
                    ProcessState::Stopped
                } else {
                    ProcessState::Crashed
                };
                Some(self.finish(to, process::exit_code_of(&status)))
            }
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(
                    "liveness check failed for {}: {error}",
                    self.record.component_id
                );
                Some(self.finish(ProcessState::Crashed, None))
            }
        }
    }

    fn finish(&mut self, to: ProcessState, exit_code: Option<i32>) -> StateChange {
        let from = self.record.state;
        self.record.state = to;
        self.record.exit_code = exit_code;
        self.record.ended_at = Some(Utc::now());
        self.child = None;
        StateChange {
            component_id: self.record.component_id.clone(),
            pid: self.record.pid,
            from,
            to,
            exit_code,
        }
    }
}

#[derive(Default)]
struct ProcessTable {
    entries: Vec<TableEntry>,
}

impl ProcessTable {
    fn active_mut(&mut self, component_id: &str) -> Option<&mut TableEntry> {
        self.entries.iter_mut().find(|entry| {
            entry.record.component_id == component_id && entry.record.state.is_active()
        })
    }

    fn entry_mut(&mut self, record_id: Uuid) -> Option<&mut TableEntry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.record.id == record_id)
    }

    fn remove(&mut self, record_id: Uuid) {
        self.entries.retain(|entry| entry.record.id != record_id);
    }

    fn prune_history(&mut self) {
        let terminal = self
            .entries
            .iter()
            .filter(|entry| entry.record.state.is_terminal())
            .count();
        let mut excess = terminal.saturating_sub(HISTORY_LIMIT);
        if excess == 0 {
            return;
        }
        self.entries.retain(|entry| {
            if excess > 0 && entry.record.state.is_terminal() {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }
}

/// Launches catalog components as child processes and keeps the table truthful.
pub struct ProcessSupervisor {
    components: Vec<ComponentSpec>,
    table: Mutex<ProcessTable>,
}

impl ProcessSupervisor {
    pub fn new(components: Vec<ComponentSpec>) -> Self {
        Self {
            components,
            table: Mutex::new(ProcessTable::default()),
        }
    }

    /// Catalog in configuration order.
    pub fn components(&self) -> &[ComponentSpec] {
        &self.components
    }

    pub fn component(&self, component_id: &str) -> Option<&ComponentSpec> {
        self.components
            .iter()
            .find(|component| component.id == component_id)
    }

    /// First catalog component named (by id or alias) in free text.
    pub fn resolve_component(&self, text: &str) -> Option<&ComponentSpec> {
        let lowered = text.to_lowercase();
        self.components
            .iter()
            .find(|component| component.is_named_in(&lowered))
    }

    /// Start a component unless a live instance already exists.
    ///
    /// Returns once the OS has created the process; the component's own
    /// startup continues asynchronously.
    pub fn launch(&self, component_id: &str) -> CoreResult<LaunchOutcome> {
        let spec = self
            .component(component_id)
            .ok_or_else(|| CoreError::UnknownComponent(component_id.to_string()))?;

        let record_id = {
            let mut table = self.table.lock();
            if let Some(entry) = table.active_mut(component_id) {
                if let Some(change) = entry.settle() {
                    tracing::info!(
                        "{} exited before relaunch ({})",
                        change.component_id,
                        change.to.as_str()
                    );
                } else {
                    return Ok(LaunchOutcome::AlreadyRunning {
                        pid: entry.record.pid,
                    });
                }
            }
            let record = ProcessRecord::starting(component_id);
            let record_id = record.id;
            table.entries.push(TableEntry {
                record,
                child: None,
                stop_requested: false,
            });
            record_id
        };

        let spawned = spec.command().spawn();

        let mut table = self.table.lock();
        match spawned {
            Ok(child) => {
                let pid = child.id();
                match table.entry_mut(record_id) {
                    Some(entry) => {
                        entry.record.pid = Some(pid);
                        entry.record.state = ProcessState::Running;
                        entry.child = Some(child);
                    }
                    None => {
                        return Err(CoreError::Internal(format!(
                            "record for {component_id} vanished during launch"
                        )))
                    }
                }
                tracing::info!("launched {component_id} (pid {pid})");
                Ok(LaunchOutcome::Launched { pid })
            }
            Err(error) => {
                table.remove(record_id);
                tracing::warn!("failed to launch {component_id}: {error}");
                Err(CoreError::LaunchFailed {
                    component: component_id.to_string(),
                    reason: error.to_string(),
                })
            }
        }
    }

    /// Launch every catalog component, in catalog order.
    pub fn launch_all(&self) -> Vec<(String, CoreResult<LaunchOutcome>)> {
        self.components
            .iter()
            .map(|component| (component.id.clone(), self.launch(&component.id)))
            .collect()
    }

    /// Settle every record whose process has exited.
    pub fn poll(&self) -> Vec<StateChange> {
        let mut table = self.table.lock();
        let changes: Vec<StateChange> = table
            .entries
            .iter_mut()
            .filter_map(TableEntry::settle)
            .collect();
        if !changes.is_empty() {
            table.prune_history();
        }
        changes
    }

    /// Ask a running component to exit, escalating to a kill after `grace`.
    pub async fn stop(&self, component_id: &str, grace: Duration) -> CoreResult<StopOutcome> {
        let (record_id, requested) = {
            let mut table = self.table.lock();
            let Some(entry) = table.active_mut(component_id) else {
                return Ok(StopOutcome::NotRunning);
            };
            if entry.settle().is_some() || entry.record.state != ProcessState::Running {
                return Ok(StopOutcome::NotRunning);
            }
            entry.stop_requested = true;
            // Signalled under the lock: the child is unreaped, so the pid is still ours.
            let requested = match entry.record.pid.map(process::request_terminate) {
                Some(Ok(())) => true,
                Some(Err(error)) => {
                    tracing::debug!("graceful stop unavailable for {component_id}: {error}");
                    false
                }
                None => false,
            };
            (entry.record.id, requested)
        };

        if requested {
            let deadline = tokio::time::Instant::now() + grace;
            loop {
                if self.settled(record_id) {
                    tracing::info!("stopped {component_id}");
                    return Ok(StopOutcome::Graceful);
                }
                let now = tokio::time::Instant::now();
                if now >= deadline {
                    break;
                }
                tokio::time::sleep(STOP_CHECK_INTERVAL.min(deadline - now)).await;
            }
        }

        self.force_stop(record_id, component_id).await
    }

    /// Stop every running component concurrently.
    ///
    /// Returns the components that needed forced termination.
    pub async fn stop_all(&self, grace: Duration) -> BTreeSet<String> {
        let running: Vec<String> = {
            let table = self.table.lock();
            table
                .entries
                .iter()
                .filter(|entry| entry.record.state == ProcessState::Running)
                .map(|entry| entry.record.component_id.clone())
                .collect()
        };

        let outcomes = futures_util::future::join_all(
            running.iter().map(|component_id| self.stop(component_id, grace)),
        )
        .await;

        let mut forced = BTreeSet::new();
        for (component_id, outcome) in running.into_iter().zip(outcomes) {
            match outcome {
                Ok(StopOutcome::Forced) => {
                    forced.insert(component_id);
                }
                Ok(_) => {}
                Err(error) => tracing::warn!("failed to stop {component_id}: {error}"),
            }
        }
        forced
    }

    /// Snapshot of every tracked record, oldest first.
    pub fn status(&self) -> Vec<ProcessRecord> {
        let table = self.table.lock();
        table
            .entries
            .iter()
            .map(|entry| entry.record.clone())
            .collect()
    }

    /// The Starting or Running record of a component, as last observed.
    pub fn active_record(&self, component_id: &str) -> Option<ProcessRecord> {
        let table = self.table.lock();
        table
            .entries
            .iter()
            .find(|entry| {
                entry.record.component_id == component_id && entry.record.state.is_active()
            })
            .map(|entry| entry.record.clone())
    }

    /// The most recent record of a component, active or not.
    pub fn latest_record(&self, component_id: &str) -> Option<ProcessRecord> {
        let table = self.table.lock();
        table
            .entries
            .iter()
            .rev()
            .find(|entry| entry.record.component_id == component_id)
            .map(|entry| entry.record.clone())
    }

    pub fn is_running(&self, component_id: &str) -> bool {
        self.active_record(component_id).is_some()
    }

    fn settled(&self, record_id: Uuid) -> bool {
        let mut table = self.table.lock();
        match table.entry_mut(record_id) {
            Some(entry) => {
                entry.settle();
                entry.record.state.is_terminal()
            }
            None => true,
        }
    }

    /// Kill and reap outside the table lock.
    ///
    /// The child is taken out of its entry first; the record stays Running
    /// (and counts as alive) until the reaper reports back.
    async fn force_stop(&self, record_id: Uuid, component_id: &str) -> CoreResult<StopOutcome> {
        let child = {
            let mut table = self.table.lock();
            let Some(entry) = table.entry_mut(record_id) else {
                return Ok(StopOutcome::Graceful);
            };
            if entry.settle().is_some() || entry.record.state.is_terminal() {
                return Ok(StopOutcome::Graceful);
            }
            entry.child.take()
        };

        let Some(mut child) = child else {
            // A concurrent stop owns the kill.
            while !self.settled(record_id) {
                tokio::time::sleep(STOP_CHECK_INTERVAL).await;
            }
            return Ok(StopOutcome::Forced);
        };

        if let Err(error) = child.kill() {
            tracing::warn!("failed to kill {component_id}: {error}");
        }
        let reaped = tokio::task::spawn_blocking(move || child.wait()).await;
        let exit_code = match &reaped {
            Ok(Ok(status)) => process::exit_code_of(status),
            _ => None,
        };
        {
            let mut table = self.table.lock();
            if let Some(entry) = table.entry_mut(record_id) {
                entry.finish(ProcessState::Stopped, exit_code);
            }
            table.prune_history();
        }

        match reaped {
            Ok(Ok(_)) => {
                tracing::warn!("force stopped {component_id}");
                Ok(StopOutcome::Forced)
            }
            Ok(Err(error)) => Err(CoreError::Internal(format!(
                "failed to reap {component_id}: {error}"
            ))),
            Err(error) => Err(CoreError::Internal(format!(
                "reaper for {component_id} failed: {error}"
            ))),
        }
    }
}
