//! Document text-extraction client.
//!
//! The extraction service runs asynchronous jobs: submit a document
//! location, poll until the job reports SUCCEEDED or FAILED, then page
//! through the extracted lines via continuation tokens. Extraction failure
//! is fatal for the contract being ingested; callers surface it and mark
//! the contract ERROR.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_DEADLINE: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extraction job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("extraction job {job_id} did not finish within {waited_secs}s")]
    DeadlineExceeded { job_id: String, waited_secs: u64 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("extraction service returned {status}: {body}")]
    Server { status: u16, body: String },
}

/// External text-extraction collaborator.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the full text of the document at `location`.
    async fn extract(&self, location: &str) -> Result<String, ExtractError>;
}

/// Lifecycle state reported by the extraction service for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    InProgress,
    Succeeded,
    Failed,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    location: &'a str,
}

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobPage {
    status: JobStatus,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    lines: Vec<String>,
    #[serde(default)]
    next_token: Option<String>,
}

/// HTTP client for the extraction service's submit/poll endpoints.
pub struct ExtractClient {
    client: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    deadline: Duration,
}

impl ExtractClient {
    /// Create a client for the given service base URL (no trailing slash
    /// needed).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    async fn submit(&self, location: &str) -> Result<String, ExtractError> {
        let url = format!("{}/jobs", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&SubmitRequest { location })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let submitted: SubmitResponse = resp.json().await?;
        info!(job_id = %submitted.job_id, location, "extraction job submitted");
        Ok(submitted.job_id)
    }

    async fn fetch_page(
        &self,
        job_id: &str,
        next_token: Option<&str>,
    ) -> Result<JobPage, ExtractError> {
        let mut url = format!("{}/jobs/{}", self.base_url, job_id);
        if let Some(token) = next_token {
            url.push_str(&format!("?next_token={token}"));
        }
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    /// Page through a finished job, concatenating line text in order.
    async fn assemble(&self, job_id: &str, first: JobPage) -> Result<String, ExtractError> {
        let mut lines = first.lines;
        let mut next_token = first.next_token;
        while let Some(token) = next_token {
            let page = self.fetch_page(job_id, Some(&token)).await?;
            lines.extend(page.lines);
            next_token = page.next_token;
        }
        Ok(lines.join("\n"))
    }
}

#[async_trait]
impl TextExtractor for ExtractClient {
    async fn extract(&self, location: &str) -> Result<String, ExtractError> {
        let job_id = self.submit(location).await?;

        let mut waited = Duration::ZERO;
        loop {
            let page = self.fetch_page(&job_id, None).await?;
            match page.status {
                JobStatus::Succeeded => {
                    let text = self.assemble(&job_id, page).await?;
                    info!(job_id = %job_id, chars = text.len(), "extraction complete");
                    return Ok(text);
                }
                JobStatus::Failed => {
                    return Err(ExtractError::JobFailed {
                        job_id,
                        message: page
                            .status_message
                            .unwrap_or_else(|| "no status message".into()),
                    });
                }
                JobStatus::InProgress => {
                    if waited >= self.deadline {
                        return Err(ExtractError::DeadlineExceeded {
                            job_id,
                            waited_secs: waited.as_secs(),
                        });
                    }
                    tokio::time::sleep(self.poll_interval).await;
                    waited += self.poll_interval;
                }
            }
        }
    }
}
