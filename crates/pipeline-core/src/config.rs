use std::time::Duration;

use crate::types::ActionStatus;

/// How long to wait between polls unless overridden at startup.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

pub const DEFAULT_USER_AGENT: &str = "github-actions/aws-codepipeline-execute";

const CONSOLE_URL_BASE: &str = "https://console.aws.amazon.com/codesuite/codepipeline/pipelines";

// ---------------------------------------------------------------------------
// StatusIcons
// ---------------------------------------------------------------------------

/// Fixed glyph per action status, as GitHub emoji shortcodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIcons {
    pub not_started: &'static str,
    pub in_progress: &'static str,
    pub succeeded: &'static str,
    pub failed: &'static str,
    pub abandoned: &'static str,
    pub unknown: &'static str,
}

impl StatusIcons {
    pub fn icon_for(&self, status: &ActionStatus) -> &'static str {
        match status {
            ActionStatus::NotStarted => self.not_started,
            ActionStatus::InProgress => self.in_progress,
            ActionStatus::Succeeded => self.succeeded,
            ActionStatus::Failed => self.failed,
            ActionStatus::Abandoned => self.abandoned,
            ActionStatus::Other(_) => self.unknown,
        }
    }
}

impl Default for StatusIcons {
    fn default() -> Self {
        Self {
            not_started: ":pray:",
            in_progress: ":crossed_fingers:",
            succeeded: ":thumbsup:",
            failed: ":bangbang:",
            abandoned: ":warning:",
            unknown: ":grey_question:",
        }
    }
}

// ---------------------------------------------------------------------------
// PollSettings
// ---------------------------------------------------------------------------

/// Process-wide settings, built once in `main` and shared by reference.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub icons: StatusIcons,
    pub user_agent: String,
}

impl PollSettings {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Console timeline URL for one execution.
    pub fn execution_url(&self, pipeline_name: &str, execution_id: &str, region: &str) -> String {
        format!("{CONSOLE_URL_BASE}/{pipeline_name}/executions/{execution_id}/timeline?region={region}")
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            icons: StatusIcons::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
