use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::record::ProcessState;
use super::ProcessSupervisor;

/// Periodically settle exited components so `status()` stays truthful.
pub fn spawn_poller(supervisor: Arc<ProcessSupervisor>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for change in supervisor.poll() {
                match change.to {
                    ProcessState::Crashed => tracing::warn!(
                        component = %change.component_id,
                        pid = ?change.pid,
                        exit_code = ?change.exit_code,
                        "component crashed"
                    ),
                    _ => tracing::info!(
                        component = %change.component_id,
                        pid = ?change.pid,
                        from = change.from.as_str(),
                        to = change.to.as_str(),
                        "component exited"
                    ),
                }
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::supervisor::ComponentSpec;

    #[tokio::test]
    async fn poller_settles_exited_process() {
        let supervisor = Arc::new(ProcessSupervisor::new(vec![ComponentSpec::new(
            "crashy",
            "sh",
            vec!["-c".to_string(), "exit 2".to_string()],
        )]));
        supervisor.launch("crashy").unwrap();
        let handle = spawn_poller(supervisor.clone(), Duration::from_millis(20));

        let mut settled = None;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if let Some(record) = supervisor.latest_record("crashy") {
                if record.state.is_terminal() {
                    settled = Some(record);
                    break;
                }
            }
        }
        handle.abort();

        let record = settled.expect("poller should settle the record");
        assert_eq!(record.state, ProcessState::Crashed);
        assert_eq!(record.exit_code, Some(2));
    }
}
