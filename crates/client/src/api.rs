//! HTTP transport for the intake service.
//!
//! [`ServiceApi`] wraps the three network operations the control layer
//! needs (multipart submission, log stream subscription, cleanup) over
//! a shared [`reqwest`] client with a session cookie store. It
//! normalizes failures into [`TransportError`] and never mutates any
//! display state or retries on its own.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header;

use intake_core::payload::UploadPayload;
use intake_core::types::{JobAccepted, JobId};

use crate::config::ServiceConfig;
use crate::stream::{LogStream, StreamError};

/// Failures normalized across all transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never reached the server or no response arrived.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The server answered with a non-2xx status.
    #[error("server rejected request ({status}): {body}")]
    ServerRejected { status: u16, body: String },
}

/// The three network operations the control layer performs.
///
/// [`ServiceApi`] is the real implementation; tests substitute their
/// own.
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// Submit the payload as a multipart POST. Any 2xx is acceptance;
    /// the response body is opaque beyond best-effort field extraction.
    async fn submit_job(&self, payload: &UploadPayload) -> Result<JobAccepted, TransportError>;

    /// Open the persistent log event stream for a job. Reconnection
    /// policy is the caller's, never this layer's.
    async fn open_log_stream(&self, job_id: &JobId) -> Result<LogStream, TransportError>;

    /// Request deletion of server-side temporary artifacts. No body;
    /// duplicate or concurrent requests are tolerated by the server.
    async fn request_cleanup(&self) -> Result<(), TransportError>;
}

/// HTTP client for one intake service instance.
pub struct ServiceApi {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl ServiceApi {
    /// Build a client with a cookie store so every call shares the
    /// same session as the submission.
    pub fn new(config: ServiceConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::NetworkFailure(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Reuse an existing [`reqwest::Client`] (useful for pooling
    /// across several service instances).
    pub fn with_client(client: reqwest::Client, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a
    /// [`TransportError::ServerRejected`] with the status and body
    /// text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::ServerRejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl JobTransport for ServiceApi {
    async fn submit_job(&self, payload: &UploadPayload) -> Result<JobAccepted, TransportError> {
        let mut form = reqwest::multipart::Form::new();
        for file in payload.files() {
            let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone());
            form = form.part(file.field.clone(), part);
        }

        let response = self
            .client
            .post(self.config.submit_url())
            .timeout(self.config.request_timeout())
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::NetworkFailure(e.to_string()))?;

        let response = Self::ensure_success(response).await?;

        // 2xx is acceptance regardless of body shape.
        let accepted: JobAccepted = match response.text().await {
            Ok(body) => serde_json::from_str(&body).unwrap_or_default(),
            Err(e) => {
                tracing::debug!(error = %e, "Unreadable submission response body");
                JobAccepted::default()
            }
        };

        tracing::info!(
            job_id = accepted.job_id.as_deref().unwrap_or("<client-assigned>"),
            "Job submission accepted",
        );
        Ok(accepted)
    }

    async fn open_log_stream(&self, job_id: &JobId) -> Result<LogStream, TransportError> {
        // No request timeout here: silence on the log feed is not an
        // error, only an explicit stream failure is.
        let response = self
            .client
            .get(self.config.logs_url())
            .query(&[("job", job_id.as_str())])
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| TransportError::NetworkFailure(e.to_string()))?;

        let response = Self::ensure_success(response).await?;

        tracing::info!(job_id = %job_id, "Log stream opened");

        let source = response
            .bytes_stream()
            .map_err(|e| StreamError::Connection(e.to_string()));
        Ok(LogStream::new(Box::pin(source)))
    }

    async fn request_cleanup(&self) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.config.cleanup_url())
            .timeout(self.config.request_timeout())
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| TransportError::NetworkFailure(e.to_string()))?;

        Self::ensure_success(response).await?;
        tracing::debug!("Cleanup request acknowledged");
        Ok(())
    }
}
