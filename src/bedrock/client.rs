//! BedrockClient - handles communication with the Bedrock runtime API.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::config::Settings;

use super::request::{GenerationRequest, TaskType, ValidationError};
use super::retry::{
    backoff_delay, is_transient, is_transient_status, parse_retry_after, DEFAULT_BACKOFF_BASE,
    DEFAULT_BACKOFF_MAX, DEFAULT_TRANSIENT_RETRIES,
};

/// Default timeout for a single HTTP request (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on the whole submit-and-wait cycle (5 minutes).
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default interval between job status polls (5 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Check if Ctrl+C has been received.
pub fn interrupt_received() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Set up the Ctrl+C handler.
///
/// Call once at program startup. The wait loop observes the flag and
/// aborts; the remote job keeps running server-side.
pub fn setup_interrupt_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        INTERRUPTED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, abandoning wait...");
    })
}

/// Handle for a submitted generation job, used for status polling.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub job_id: String,
    pub model_id: String,
    pub task_type: TaskType,
}

/// Remote job status as observed through polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Accepted, not yet running.
    Submitted,
    /// Generation in progress.
    InProgress,
    /// Terminal success, with asset URLs when the service provides them.
    Completed {
        video_url: Option<String>,
        thumbnail_url: Option<String>,
    },
    /// Terminal failure.
    Failed { message: String },
}

/// Terminal (or observed) outcome of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed,
    InProgress,
}

/// Result of a full submit-and-wait cycle.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub status: JobOutcome,
    pub job_id: String,
    pub video_uri: Option<String>,
    pub thumbnail_uri: Option<String>,
    pub error_detail: Option<String>,
}

impl GenerationResult {
    fn failed(job_id: String, detail: impl Into<String>) -> Self {
        Self {
            status: JobOutcome::Failed,
            job_id,
            video_uri: None,
            thumbnail_uri: None,
            error_detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StartJobResponse {
    #[serde(rename = "jobId", default)]
    job_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct PollPayload<'a> {
    #[serde(rename = "jobId")]
    job_id: &'a str,
    #[serde(rename = "taskType")]
    task_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    videos: Vec<MediaRef>,
    #[serde(default)]
    thumbnails: Vec<MediaRef>,
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaRef {
    url: String,
}

/// Client for the Bedrock runtime video-generation endpoint.
///
/// Holds credentials and an HTTP client with explicit timeouts. Request
/// signing is delegated to the service's bearer-token scheme; the client
/// never retries beyond its own transient-error backoff.
pub struct BedrockClient {
    access_key_id: String,
    secret_access_key: String,
    base_url: String,
    http_client: reqwest::Client,
    poll_interval: Duration,
    wait_timeout: Duration,
}

impl BedrockClient {
    /// Create a client for the region configured in settings.
    ///
    /// # Errors
    ///
    /// Returns `BedrockError::MissingCredentials` when either credential is
    /// empty, or `BedrockError::Http` if the HTTP client cannot be built.
    pub fn new(settings: &Settings) -> Result<Self, BedrockError> {
        let base_url = format!("https://bedrock-runtime.{}.amazonaws.com", settings.region);
        Self::with_base_url(settings, base_url)
    }

    /// Create a client against an explicit base URL.
    ///
    /// Used by tests to point the client at a mock server.
    pub fn with_base_url(settings: &Settings, base_url: String) -> Result<Self, BedrockError> {
        if settings.access_key_id.is_empty() || settings.secret_access_key.is_empty() {
            return Err(BedrockError::MissingCredentials);
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            access_key_id: settings.access_key_id.clone(),
            secret_access_key: settings.secret_access_key.clone(),
            base_url,
            http_client,
            poll_interval: DEFAULT_POLL_INTERVAL,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        })
    }

    /// Override the poll interval and overall wait timeout.
    pub fn with_wait(mut self, poll_interval: Duration, wait_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.wait_timeout = wait_timeout;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the access key id the client was built with.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get the configured poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Get the configured wait timeout.
    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    fn invoke_url(&self, model_id: &str) -> String {
        format!("{}/model/{}/invoke", self.base_url, model_id)
    }

    /// Submit a generation job.
    ///
    /// Serializes the request (reading any storyboard reference images),
    /// POSTs it to the model's invoke endpoint, and returns a handle for
    /// polling.
    ///
    /// # Errors
    ///
    /// Returns `BedrockError::Validation` for malformed input,
    /// `BedrockError::MissingJobId` when the service accepts the request
    /// but returns no job id, and the mapped service error otherwise.
    pub async fn start_job(&self, request: &GenerationRequest) -> Result<JobHandle, BedrockError> {
        let payload = request.to_payload()?;
        let url = self.invoke_url(&request.model_id);

        log::info!(
            "Submitting {} job to model {}",
            request.task_type.as_str(),
            request.model_id
        );

        let response = self.post_json(&url, &payload).await?;
        let body: StartJobResponse = response.json().await?;

        let job_id = body.job_id.ok_or(BedrockError::MissingJobId)?;
        log::info!("Job accepted, id: {}", job_id);

        Ok(JobHandle {
            job_id,
            model_id: request.model_id.clone(),
            task_type: request.task_type,
        })
    }

    /// Poll the status of a submitted job.
    ///
    /// The status check goes through the same model invoke endpoint with a
    /// `{jobId, taskType}` body, which is how the service exposes job state.
    pub async fn poll_job(&self, handle: &JobHandle) -> Result<JobStatus, BedrockError> {
        let url = self.invoke_url(&handle.model_id);
        let payload = PollPayload {
            job_id: &handle.job_id,
            task_type: handle.task_type.as_str(),
        };

        let response = self.post_json(&url, &payload).await?;
        let body: JobStatusResponse = response.json().await?;

        let status = body.status.unwrap_or_default();
        log::debug!("Job {} status: {}", handle.job_id, status);

        match status.as_str() {
            "submitted" => Ok(JobStatus::Submitted),
            "inProgress" | "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed {
                video_url: body.videos.into_iter().next().map(|m| m.url),
                thumbnail_url: body.thumbnails.into_iter().next().map(|m| m.url),
            }),
            "failed" | "expired" => Ok(JobStatus::Failed {
                message: body
                    .error_message
                    .unwrap_or_else(|| format!("job {}", status)),
            }),
            other => Err(BedrockError::Api {
                code: "UnknownStatus".to_string(),
                message: format!("unrecognized job status '{}'", other),
            }),
        }
    }

    /// Wait for a submitted job to reach a terminal state.
    ///
    /// Polls at the configured interval until the job completes, fails,
    /// the overall timeout elapses, or Ctrl+C is received. Timeout and
    /// interruption are reported as a failed result, not an error; the
    /// remote job is left running in both cases.
    pub async fn wait_for_job(&self, handle: &JobHandle) -> Result<GenerationResult, BedrockError> {
        let start = tokio::time::Instant::now();

        loop {
            if interrupt_received() {
                log::warn!("Wait for job {} interrupted", handle.job_id);
                return Ok(GenerationResult::failed(handle.job_id.clone(), "interrupted"));
            }

            if start.elapsed() > self.wait_timeout {
                log::error!(
                    "Job {} did not finish within {:?}",
                    handle.job_id,
                    self.wait_timeout
                );
                return Ok(GenerationResult::failed(handle.job_id.clone(), "timeout"));
            }

            match self.poll_job(handle).await? {
                JobStatus::Submitted | JobStatus::InProgress => {
                    log::info!("Job {} still running...", handle.job_id);
                }
                JobStatus::Completed {
                    video_url,
                    thumbnail_url,
                } => {
                    log::info!("Job {} completed", handle.job_id);
                    return Ok(GenerationResult {
                        status: JobOutcome::Succeeded,
                        job_id: handle.job_id.clone(),
                        video_uri: video_url,
                        thumbnail_uri: thumbnail_url,
                        error_detail: None,
                    });
                }
                JobStatus::Failed { message } => {
                    log::error!("Job {} failed: {}", handle.job_id, message);
                    return Ok(GenerationResult::failed(handle.job_id.clone(), message));
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Submit a request and block until the job reaches a terminal state.
    ///
    /// The single-call entry point: submit, then poll until completion
    /// within the configured timeout. A job the service reports as failed
    /// on the first poll returns immediately.
    pub async fn submit_and_wait(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, BedrockError> {
        let handle = self.start_job(request).await?;
        self.wait_for_job(&handle).await
    }

    /// Download a generated asset from a URL to disk.
    ///
    /// Streams the body to disk without buffering the whole file, creating
    /// parent directories as needed.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<PathBuf, BedrockError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BedrockError::Api {
                code: format!("Download{}", status.as_u16()),
                message: error_text,
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        Ok(dest.to_path_buf())
    }

    /// POST a JSON body, retrying transient failures with backoff and
    /// mapping service error responses to typed errors.
    async fn post_json<T: Serialize>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::Response, BedrockError> {
        let mut attempt = 0u32;

        loop {
            let result = self
                .http_client
                .post(url)
                .header("Authorization", format!("Bearer {}", self.secret_access_key))
                .header("Content-Type", "application/json")
                .header("Accept", "application/json")
                .json(body)
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(err) if is_transient(&err) && attempt < DEFAULT_TRANSIENT_RETRIES => {
                    let delay = backoff_delay(attempt, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX);
                    log::warn!(
                        "Transient network error (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt + 1,
                        DEFAULT_TRANSIENT_RETRIES + 1,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                Err(err) => return Err(BedrockError::Http(err)),
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if is_transient_status(status.as_u16()) && attempt < DEFAULT_TRANSIENT_RETRIES {
                let delay = backoff_delay(attempt, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX);
                log::warn!(
                    "Service returned {} (attempt {}/{}). Retrying in {:?}...",
                    status,
                    attempt + 1,
                    DEFAULT_TRANSIENT_RETRIES + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(Self::map_error_response(response).await);
        }
    }

    /// Map a non-success response to a typed error.
    ///
    /// The error code comes from the `x-amzn-errortype` header when
    /// present, otherwise from the HTTP status.
    async fn map_error_response(response: reqwest::Response) -> BedrockError {
        let status = response.status();
        let retry_after_secs = parse_retry_after(&response);
        let code = response
            .headers()
            .get("x-amzn-errortype")
            .and_then(|v| v.to_str().ok())
            // Header values look like "ThrottlingException:http://..."
            .map(|v| v.split(':').next().unwrap_or(v).to_string());
        let message = match response.text().await {
            Ok(text) => serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text),
            Err(_) => "Unknown error".to_string(),
        };

        let code = code.unwrap_or_else(|| match status.as_u16() {
            429 => "ThrottlingException".to_string(),
            403 => "AccessDeniedException".to_string(),
            503 => "ServiceUnavailableException".to_string(),
            other => format!("Http{}", other),
        });

        match code.as_str() {
            "ThrottlingException" | "TooManyRequestsException" => BedrockError::Throttled {
                message,
                retry_after_secs,
            },
            "AccessDeniedException" | "UnauthorizedException" => {
                BedrockError::AccessDenied { message }
            }
            "ValidationException" => BedrockError::InvalidInput { message },
            "ResourceNotFoundException" => BedrockError::NotFound { message },
            "ServiceQuotaExceededException" => BedrockError::QuotaExceeded { message },
            "ServiceUnavailableException" => BedrockError::Unavailable { message },
            _ => BedrockError::Api { code, message },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

/// Errors that can occur talking to the Bedrock service.
#[derive(Debug, thiserror::Error)]
pub enum BedrockError {
    #[error("AWS credentials not configured")]
    MissingCredentials,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bedrock API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("Request was throttled: {message}")]
    Throttled {
        message: String,
        /// Retry-After header value in seconds, when the service sent one.
        retry_after_secs: Option<u64>,
    },

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    #[error("Request rejected by the service: {message}")]
    InvalidInput { message: String },

    #[error("Model or resource not found: {message}")]
    NotFound { message: String },

    #[error("Service quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Generation timed out")]
    Timeout,

    #[error("Response did not include a job id")]
    MissingJobId,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
