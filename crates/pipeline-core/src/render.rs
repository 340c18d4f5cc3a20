//! Markdown rendering for the progress report and plain-text progress lines.

use crate::config::StatusIcons;
use crate::types::{ActionObservation, ObservedSet};

const EXECUTING: &str = "is executing";
const EXECUTED: &str = "was executed";

/// Number of characters of the commit SHA shown in the heading.
pub const SHORT_SHA_LEN: usize = 7;

/// One report line: `\n - {icon}&nbsp;&nbsp;{stage} / {action} - {status}`.
///
/// The status becomes a markdown link when the action has a result URL.
pub fn format_action(observation: &ActionObservation, icons: &StatusIcons) -> String {
    let status = match &observation.result_url {
        Some(url) => format!("[{}]({url})", observation.status),
        None => observation.status.to_string(),
    };
    format!(
        "\n - {}&nbsp;&nbsp;{} - {status}",
        icons.icon_for(&observation.status),
        observation.action
    )
}

/// Heading for a freshly started execution.
pub fn render_heading(pipeline_name: &str, execution_url: &str, head_sha: Option<&str>) -> String {
    let mut heading = format!("CodePipeline: **[{pipeline_name}]({execution_url})** {EXECUTING}");
    if let Some(sha) = head_sha.filter(|s| !s.is_empty()) {
        let short: String = sha.chars().take(SHORT_SHA_LEN).collect();
        heading.push_str(&format!(" against commit `{short}`"));
    }
    heading
}

/// Switch the heading verb to its completed form. Idempotent.
pub fn completed_heading(heading: &str) -> String {
    heading.replacen(EXECUTING, EXECUTED, 1)
}

/// Full report body: the heading followed by every catalog action.
pub fn render_body(heading: &str, observed: &ObservedSet, icons: &StatusIcons) -> String {
    let mut body = heading.to_string();
    for observation in observed {
        body.push_str(&format_action(observation, icons));
    }
    body
}

/// Console line for one changed action.
pub fn progress_line(observation: &ActionObservation) -> String {
    format!("{} - {}", observation.action, observation.status)
}
