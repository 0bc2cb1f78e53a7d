//! Remote activation service port and its HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;

use licensehub_core::error::AppError;
use licensehub_core::types::params::ValidationParams;
use licensehub_core::AppResult;

/// The remote procedures the license manager calls on the activation
/// service.
#[async_trait]
pub trait ActivationApi: Send + Sync + 'static {
    /// Submit an envelope for online validation.
    async fn validate(
        &self,
        license_key: &str,
        params: &ValidationParams,
        envelope: &[u8],
    ) -> AppResult<()>;

    /// Refresh this machine's activation.
    async fn heartbeat(&self, license_key: &str, machine_id: &str) -> AppResult<()>;

    /// Release this machine's concurrent seat.
    async fn disconnect(&self, license_key: &str, hardware_id: &str) -> AppResult<()>;
}

/// HTTP implementation of [`ActivationApi`] over the server API surface:
/// multipart `POST {endpoint}/validate`, JSON `POST {endpoint}/heartbeat`,
/// query-string `POST {endpoint}/disconnect`.
#[derive(Debug, Clone)]
pub struct HttpActivationApi {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpActivationApi {
    /// Create a client for `endpoint` with the given request timeout.
    ///
    /// A trailing slash on the endpoint is trimmed.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl ActivationApi for HttpActivationApi {
    async fn validate(
        &self,
        license_key: &str,
        params: &ValidationParams,
        envelope: &[u8],
    ) -> AppResult<()> {
        let params_json = serde_json::to_string(params)?;

        let form = reqwest::multipart::Form::new()
            .text("licenseKey", license_key.to_string())
            .text("validationParams", params_json)
            .part(
                "licenseFile",
                reqwest::multipart::Part::bytes(envelope.to_vec()).file_name("license.lic"),
            );

        let response = self
            .http
            .post(format!("{}/validate", self.endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::validation(format!("online validation failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(AppError::validation(body))
        }
    }

    async fn heartbeat(&self, license_key: &str, machine_id: &str) -> AppResult<()> {
        let response = self
            .http
            .post(format!("{}/heartbeat", self.endpoint))
            .json(&serde_json::json!({
                "licenseKey": license_key,
                "machineId": machine_id,
            }))
            .send()
            .await
            .map_err(|e| AppError::heartbeat(format!("heartbeat request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::heartbeat(format!(
                "heartbeat rejected with status {}",
                response.status()
            )))
        }
    }

    async fn disconnect(&self, license_key: &str, hardware_id: &str) -> AppResult<()> {
        let response = self
            .http
            .post(format!("{}/disconnect", self.endpoint))
            .query(&[("licenseKey", license_key), ("hardwareId", hardware_id)])
            .send()
            .await
            .map_err(|e| AppError::heartbeat(format!("disconnect request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::heartbeat(format!(
                "disconnect rejected with status {}",
                response.status()
            )))
        }
    }
}
