//! Mirror of the inventory file into a GitHub repository (contents API).
//!
//! Every save uploads the whole file: the current blob sha is fetched first
//! and used only to choose between updating and creating the file. There is
//! no merge and no retry.

use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::r#trait::PersistenceError;

pub const GITHUB_API_BASE: &str = "https://api.github.com";

const USER_AGENT: &str = "thriftstock/0.1.0";

/// Where and how to mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorTarget {
    pub api_url: String,
    /// `owner/name`.
    pub repo: String,
    /// Path of the file inside the repository.
    pub path: String,
    pub branch: Option<String>,
}

/// What a successful push did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    Created,
    Updated,
}

/// Body of `PUT /repos/{repo}/contents/{path}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentsRequest {
    pub message: String,
    /// Base64 of the file bytes.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl ContentsRequest {
    /// Build an update request when `sha` is known, a create request otherwise.
    pub fn new(path: &str, bytes: &[u8], sha: Option<String>, branch: Option<String>) -> Self {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let verb = if sha.is_some() { "Update" } else { "Create" };
        Self {
            message: format!("{verb} {file_name}"),
            content: base64::engine::general_purpose::STANDARD.encode(bytes),
            sha,
            branch,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
}

/// Blocking facade over an async GitHub client.
///
/// Owns a current-thread runtime so the rest of the application stays
/// synchronous.
pub struct GitHubMirror {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    target: MirrorTarget,
    token: String,
}

impl core::fmt::Debug for GitHubMirror {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GitHubMirror")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl GitHubMirror {
    pub fn new(target: MirrorTarget, token: String) -> Result<Self, PersistenceError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| PersistenceError::Runtime(e.to_string()))?;

        Ok(Self {
            client,
            runtime,
            target,
            token,
        })
    }

    pub fn target(&self) -> &MirrorTarget {
        &self.target
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.target.api_url.trim_end_matches('/'),
            self.target.repo,
            self.target.path.trim_start_matches('/')
        )
    }

    /// Upload `bytes` as the mirrored file (blocking).
    pub fn push(&self, bytes: &[u8]) -> Result<MirrorOutcome, PersistenceError> {
        self.runtime.block_on(self.push_async(bytes))
    }

    async fn push_async(&self, bytes: &[u8]) -> Result<MirrorOutcome, PersistenceError> {
        let sha = self.current_sha().await?;
        let outcome = if sha.is_some() {
            MirrorOutcome::Updated
        } else {
            MirrorOutcome::Created
        };
        let body = ContentsRequest::new(&self.target.path, bytes, sha, self.target.branch.clone());

        let response = self
            .client
            .put(self.contents_url())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(
            repo = %self.target.repo,
            path = %self.target.path,
            ?outcome,
            "inventory mirrored"
        );
        Ok(outcome)
    }

    /// Blob sha of the mirrored file, or `None` if it does not exist yet.
    async fn current_sha(&self) -> Result<Option<String>, PersistenceError> {
        let mut request = self.client.get(self.contents_url()).bearer_auth(&self.token);
        if let Some(branch) = &self.target.branch {
            request = request.query(&[("ref", branch)]);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let contents: ContentsResponse = response.json().await?;
        Ok(Some(contents.sha))
    }
}
