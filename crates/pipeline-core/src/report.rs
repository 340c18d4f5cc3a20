use async_trait::async_trait;

use crate::config::StatusIcons;
use crate::error::TransportError;
use crate::render::{completed_heading, render_body};
use crate::types::ObservedSet;

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// The pull request that triggered the run. Present only for PR events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestContext {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    pub head_sha: Option<String>,
}

/// Everything needed to update the comment in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHandle {
    pub comment_id: u64,
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
}

// ---------------------------------------------------------------------------
// CommentApi
// ---------------------------------------------------------------------------

/// The external store holding the report, e.g. issue comments on GitHub.
#[async_trait]
pub trait CommentApi: Send + Sync {
    /// Create the comment and return its id.
    async fn create_comment(
        &self,
        target: &PullRequestContext,
        body: &str,
    ) -> Result<u64, TransportError>;

    /// Replace the comment body.
    async fn update_comment(&self, handle: &ReportHandle, body: &str) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// ReportState
// ---------------------------------------------------------------------------

/// Local copy of the report: the heading and the last rendered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportState {
    pub handle: ReportHandle,
    heading: String,
    body: String,
    completed: bool,
}

impl ReportState {
    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Regenerate the whole body. The first terminal render rewrites the
    /// heading to its completed form; later renders keep it.
    fn render(&mut self, observed: &ObservedSet, terminal: bool, icons: &StatusIcons) {
        if terminal && !self.completed {
            self.heading = completed_heading(&self.heading);
            self.completed = true;
        }
        self.body = render_body(&self.heading, observed, icons);
    }
}

// ---------------------------------------------------------------------------
// ReportSink
// ---------------------------------------------------------------------------

/// Owns one persisted report and pushes a fully regenerated body on each poll.
pub struct ReportSink<'a> {
    api: &'a dyn CommentApi,
    state: ReportState,
}

impl<'a> ReportSink<'a> {
    /// Create the comment with the heading and the initial catalog.
    pub async fn open(
        api: &'a dyn CommentApi,
        target: &PullRequestContext,
        heading: String,
        observed: &ObservedSet,
        icons: &StatusIcons,
    ) -> Result<Self, TransportError> {
        let body = render_body(&heading, observed, icons);
        let comment_id = api.create_comment(target, &body).await?;
        tracing::info!(
            comment_id,
            pull_request = target.number,
            "created progress comment"
        );

        Ok(Self {
            api,
            state: ReportState {
                handle: ReportHandle {
                    comment_id,
                    owner: target.owner.clone(),
                    repo: target.repo.clone(),
                    issue_number: target.number,
                },
                heading,
                body,
                completed: false,
            },
        })
    }

    pub async fn push(
        &mut self,
        observed: &ObservedSet,
        terminal: bool,
        icons: &StatusIcons,
    ) -> Result<(), TransportError> {
        self.state.render(observed, terminal, icons);
        self.api
            .update_comment(&self.state.handle, &self.state.body)
            .await
    }

    pub fn state(&self) -> &ReportState {
        &self.state
    }
}
