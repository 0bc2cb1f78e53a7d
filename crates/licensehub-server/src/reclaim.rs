//! Background reclamation of silent activations.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::watch;
use tokio::time;

use licensehub_core::config::EngineConfig;
use licensehub_core::AppResult;

use crate::store::LicenseStore;

/// Single-instance worker that removes activations whose heartbeats have
/// lapsed, decrementing their parent license's seat counter.
///
/// The timeout must exceed the client heartbeat interval; configuration
/// loading enforces that bound.
#[derive(Clone)]
pub struct ReclamationService {
    store: Arc<dyn LicenseStore>,
    interval: Duration,
    timeout: ChronoDuration,
}

impl std::fmt::Debug for ReclamationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReclamationService")
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ReclamationService {
    /// Create the worker from engine configuration.
    pub fn new(store: Arc<dyn LicenseStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            interval: Duration::from_secs(config.reclamation_interval_seconds),
            timeout: ChronoDuration::seconds(config.activation_timeout_seconds as i64),
        }
    }

    /// Run the reclamation loop until cancelled.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            timeout_secs = self.timeout.num_seconds(),
            "Reclamation service started"
        );

        let mut interval = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.reclaim_once().await {
                        Ok(0) => tracing::trace!("Reclamation pass: nothing stale"),
                        Ok(count) => tracing::info!(count, "Reclamation pass removed activations"),
                        Err(e) => tracing::error!("Reclamation pass failed: {}", e),
                    }
                }
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Reclamation service shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Run one reclamation pass; returns how many activations were
    /// removed.
    ///
    /// Each removal happens under the owning license's row lock and
    /// re-checks staleness there, so a heartbeat racing the pass wins.
    pub async fn reclaim_once(&self) -> AppResult<u32> {
        let threshold = Utc::now() - self.timeout;
        let stale = self.store.select_stale_activations(threshold).await?;

        let mut reclaimed = 0u32;
        for activation in stale {
            let _lock = self.store.lock_license(activation.license_id).await;

            let Some(current) = self
                .store
                .find_activation(activation.license_id, &activation.machine_id)
                .await?
            else {
                continue;
            };
            if !current.is_stale(threshold) {
                continue;
            }

            if !self.store.remove_activation(current.id).await? {
                continue;
            }

            if let Some(mut record) = self.store.find_license(activation.license_id).await? {
                if record.is_seat_counted() {
                    let count = self.store.count_activations(record.id).await?;
                    record.active_users_count = Some(count);
                    self.store.update_license(&record).await?;
                }
            }

            tracing::info!(
                license_id = %activation.license_id,
                machine_id = %activation.machine_id,
                last_heartbeat = %current.last_heartbeat_at,
                "Reclaimed silent activation"
            );
            reclaimed += 1;
        }

        Ok(reclaimed)
    }
}
