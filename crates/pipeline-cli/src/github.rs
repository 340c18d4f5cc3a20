use async_trait::async_trait;
use pipeline_core::{CommentApi, PullRequestContext, ReportHandle, TransportError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

#[derive(Deserialize)]
struct CreatedComment {
    id: u64,
}

/// Issue comments on the pull request that triggered the run.
#[derive(Debug, Clone)]
pub struct GitHubComments {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubComments {
    pub fn new(
        api_url: &str,
        token: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, GitHubError> {
        let response = request
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GitHubError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }

    async fn create(&self, target: &PullRequestContext, body: &str) -> Result<u64, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, target.owner, target.repo, target.number
        );
        let response = self
            .send(self.http.post(&url).json(&CommentBody { body }))
            .await?;
        let created: CreatedComment = response.json().await?;
        Ok(created.id)
    }

    async fn update(&self, handle: &ReportHandle, body: &str) -> Result<(), GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/issues/comments/{}",
            self.api_url, handle.owner, handle.repo, handle.comment_id
        );
        self.send(self.http.patch(&url).json(&CommentBody { body }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CommentApi for GitHubComments {
    async fn create_comment(
        &self,
        target: &PullRequestContext,
        body: &str,
    ) -> Result<u64, TransportError> {
        self.create(target, body)
            .await
            .map_err(|e| TransportError::new("CreateComment", e))
    }

    async fn update_comment(&self, handle: &ReportHandle, body: &str) -> Result<(), TransportError> {
        self.update(handle, body)
            .await
            .map_err(|e| TransportError::new("UpdateComment", e))
    }
}
