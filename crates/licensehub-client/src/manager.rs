//! The client-side license manager.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use licensehub_codec::{LicenseCodec, LicenseSerializer};
use licensehub_core::config::ClientConfig;
use licensehub_core::error::AppError;
use licensehub_core::traits::HardwareIdentifier;
use licensehub_core::types::params::ValidationParams;
use licensehub_core::AppResult;
use licensehub_crypto::LicensingSecrets;
use licensehub_entity::License;
use licensehub_rules::{RuleRegistry, ValidationStatus};

use crate::features::FeatureManager;
use crate::hardware::MachineIdentifier;
use crate::heartbeat::{HeartbeatHandle, HeartbeatTask};
use crate::remote::{ActivationApi, HttpActivationApi};

/// Where the envelope bytes come from.
#[derive(Debug, Clone, Copy)]
pub enum LicenseSource<'a> {
    /// Read from a file.
    Path(&'a Path),
    /// Use an in-memory buffer.
    Bytes(&'a [u8]),
}

/// How a load validates the license.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Validate locally through the rule registry.
    Offline,
    /// Submit the envelope to the activation service.
    Online,
}

/// Result of a load: callers check `status` rather than matching on
/// errors.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Final validation status.
    pub status: ValidationStatus,
    /// The decoded license, when decoding succeeded.
    pub license: Option<License>,
    /// Cause, for non-valid statuses.
    pub error: Option<AppError>,
}

impl LoadResult {
    /// Whether the license loaded and validated.
    pub fn is_valid(&self) -> bool {
        self.status == ValidationStatus::Valid
    }

    fn rejected(error: AppError) -> Self {
        Self {
            status: ValidationStatus::Invalid,
            license: None,
            error: Some(error),
        }
    }
}

/// Loads, saves, and validates licenses, maintains the current license,
/// and keeps at most one heartbeat task alive for concurrent licenses.
///
/// All plugin points (serializer, hardware identifier, rule registry,
/// remote API) are configurable before the first load; afterwards the
/// manager is shared behind an `Arc` and used read-only.
pub struct LicenseManager {
    secrets: Arc<LicensingSecrets>,
    codec: LicenseCodec,
    hardware: Arc<dyn HardwareIdentifier>,
    registry: RuleRegistry,
    remote: Arc<dyn ActivationApi>,
    config: ClientConfig,
    current: Arc<RwLock<Option<License>>>,
    heartbeat: Mutex<Option<HeartbeatHandle>>,
}

impl std::fmt::Debug for LicenseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseManager")
            .field("endpoint", &self.config.endpoint())
            .finish()
    }
}

impl LicenseManager {
    /// Create a manager with the default machine identifier, JSON
    /// serializer, built-in rules, and HTTP activation client.
    pub fn new(secrets: Arc<LicensingSecrets>, config: ClientConfig) -> AppResult<Self> {
        let remote = HttpActivationApi::new(
            config.endpoint(),
            Duration::from_secs(config.request_timeout()),
        )?;
        Ok(Self::with_remote(secrets, config, Arc::new(remote)))
    }

    /// Create a manager over a custom activation API (in-process servers,
    /// tests).
    pub fn with_remote(
        secrets: Arc<LicensingSecrets>,
        config: ClientConfig,
        remote: Arc<dyn ActivationApi>,
    ) -> Self {
        let hardware: Arc<dyn HardwareIdentifier> = Arc::new(MachineIdentifier::new());
        let mut registry = RuleRegistry::new(hardware.clone());
        registry.set_built_in_enabled(config.built_in_validation);

        Self {
            secrets,
            codec: LicenseCodec::default(),
            hardware,
            registry,
            remote,
            config,
            current: Arc::new(RwLock::new(None)),
            heartbeat: Mutex::new(None),
        }
    }

    /// Replace the text serializer.
    pub fn with_serializer(mut self, serializer: Arc<dyn LicenseSerializer>) -> Self {
        self.codec = LicenseCodec::new(serializer);
        self
    }

    /// Replace the hardware identifier; rebuilds the built-in rule
    /// groups around it.
    pub fn with_hardware(mut self, hardware: Arc<dyn HardwareIdentifier>) -> Self {
        let mut registry = RuleRegistry::new(hardware.clone());
        registry.set_built_in_enabled(self.config.built_in_validation);
        self.hardware = hardware;
        self.registry = registry;
        self
    }

    /// Replace the rule registry (custom global or per-variant rules).
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Feature manager over the current license.
    pub fn features(&self) -> FeatureManager {
        FeatureManager::new(self.current.clone())
    }

    /// A clone of the current license, if one is loaded.
    pub async fn current_license(&self) -> Option<License> {
        self.current.read().await.clone()
    }

    /// Encode and sign a license; write it to `path` when given.
    pub async fn save(&self, license: &License, path: Option<&Path>) -> AppResult<Vec<u8>> {
        let private_key = self.secrets.require_private_key().map_err(AppError::from)?;
        let bytes = self.codec.encode(license, private_key)?;

        if let Some(path) = path {
            tokio::fs::write(path, &bytes).await?;
            tracing::info!(path = %path.display(), "License saved");
        }

        Ok(bytes)
    }

    /// Load a license, validate it, and on success publish it as the
    /// current license. Concurrent licenses start the heartbeat task.
    pub async fn load(
        &self,
        source: LicenseSource<'_>,
        mode: LoadMode,
        params: Option<ValidationParams>,
    ) -> LoadResult {
        let bytes = match source {
            LicenseSource::Path(path) => match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => return LoadResult::rejected(e.into()),
            },
            LicenseSource::Bytes(bytes) => bytes.to_vec(),
        };

        let license = match self.codec.decode(&bytes, self.secrets.public_key()) {
            Ok(license) => license,
            Err(e) => return LoadResult::rejected(e),
        };

        let params = params.unwrap_or_else(|| derive_params(&license));

        match mode {
            LoadMode::Offline => {
                let outcome = self.registry.validate(&license, &params);
                if !outcome.is_valid() {
                    return LoadResult {
                        status: outcome.status,
                        license: Some(license),
                        error: outcome.error,
                    };
                }
            }
            LoadMode::Online => {
                if let Err(e) = self
                    .remote
                    .validate(license.license_key(), &params, &bytes)
                    .await
                {
                    return LoadResult {
                        status: ValidationStatus::Invalid,
                        license: Some(license),
                        error: Some(e),
                    };
                }
            }
        }

        self.publish(license.clone()).await;

        tracing::info!(
            license_id = %license.info().license_id,
            license_type = %license.license_type(),
            mode = ?mode,
            "License loaded"
        );

        LoadResult {
            status: ValidationStatus::Valid,
            license: Some(license),
            error: None,
        }
    }

    /// Stop the heartbeat task, disconnect concurrent seats, and clear
    /// the current license.
    ///
    /// The heartbeat task is cancelled and awaited before the disconnect
    /// goes out, so no heartbeat can race the seat release.
    pub async fn close(&self) -> AppResult<()> {
        if let Some(handle) = self.heartbeat.lock().await.take() {
            handle.shutdown().await;
        }

        let current = self.current.write().await.take();
        if let Some(license) = current {
            if matches!(license, License::Concurrent(_)) {
                self.remote
                    .disconnect(license.license_key(), &self.hardware.get())
                    .await?;
            }
            tracing::info!(
                license_id = %license.info().license_id,
                "License closed"
            );
        }

        Ok(())
    }

    async fn publish(&self, license: License) {
        let start_heartbeat = matches!(license, License::Concurrent(_));
        let license_key = license.license_key().to_string();

        *self.current.write().await = Some(license);

        if start_heartbeat {
            let mut slot = self.heartbeat.lock().await;
            if slot.is_none() {
                let task = HeartbeatTask {
                    remote: self.remote.clone(),
                    license_key,
                    machine_id: self.hardware.get(),
                    interval: Duration::from_secs(self.config.heartbeat_interval_seconds),
                };
                *slot = Some(task.spawn());
            }
        }
    }
}

/// Derive validation parameters from the license variant when the caller
/// does not supply any.
fn derive_params(license: &License) -> ValidationParams {
    let mut params = ValidationParams::new();

    match license {
        License::Standard(l) => {
            params.user_name = Some(l.user_name.clone());
            params.license_key = Some(l.info.license_key.clone());
        }
        License::Trial(l) => {
            params.trial_period = Some(l.trial_period);
        }
        License::NodeLocked(l) => {
            params.hardware_id = Some(l.hardware_id.clone());
        }
        License::Subscription(l) => {
            params.user_name = Some(l.user_name.clone());
            params.subscription_start_date = Some(l.subscription_start_date);
            params.subscription_duration = Some(l.subscription_duration);
        }
        License::Floating(l) => {
            params.user_name = Some(l.user_name.clone());
            params.max_active_users_count = Some(l.max_active_users_count);
        }
        License::Concurrent(l) => {
            params.user_name = Some(l.user_name.clone());
            params.max_active_users_count = Some(l.max_active_users_count);
        }
    }

    params
}
