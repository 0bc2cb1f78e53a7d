//! The single heartbeat task for concurrent licenses.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::remote::ActivationApi;

/// Handle to the running heartbeat task.
///
/// The manager owns at most one of these at a time; re-entering `load`
/// never spawns a second task. Dropping the handle without calling
/// [`HeartbeatHandle::shutdown`] aborts the task.
#[derive(Debug)]
pub struct HeartbeatHandle {
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl HeartbeatHandle {
    /// Cancel the task and wait for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.cancel.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Periodic heartbeat sender.
pub(crate) struct HeartbeatTask {
    pub remote: Arc<dyn ActivationApi>,
    pub license_key: String,
    pub machine_id: String,
    pub interval: Duration,
}

impl HeartbeatTask {
    /// Spawn the task and return its handle.
    pub fn spawn(self) -> HeartbeatHandle {
        let (cancel, receiver) = watch::channel(false);
        let task = tokio::spawn(self.run(receiver));
        HeartbeatHandle {
            cancel,
            task: Some(task),
        }
    }

    /// Fire a heartbeat every interval until cancelled.
    ///
    /// Failures are logged and otherwise ignored: the server's
    /// reclamation is authoritative, the client never unilaterally
    /// invalidates its license.
    async fn run(self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            license_key = %self.license_key,
            interval_secs = self.interval.as_secs(),
            "Heartbeat task started"
        );

        let mut interval = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self
                        .remote
                        .heartbeat(&self.license_key, &self.machine_id)
                        .await
                    {
                        Ok(()) => tracing::trace!(
                            license_key = %self.license_key,
                            "Heartbeat sent"
                        ),
                        Err(e) => tracing::warn!(
                            license_key = %self.license_key,
                            error = %e,
                            "Heartbeat failed"
                        ),
                    }
                }
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!(
                            license_key = %self.license_key,
                            "Heartbeat task shutting down"
                        );
                        break;
                    }
                }
            }
        }
    }
}
