use std::path::Path;

use anyhow::{bail, Context};
use pipeline_core::PullRequestContext;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    pull_request: Option<PullRequestPayload>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
    #[serde(default)]
    head: Option<HeadPayload>,
}

#[derive(Debug, Deserialize)]
struct HeadPayload {
    #[serde(default)]
    sha: Option<String>,
}

/// Read the pull request that triggered the workflow, if any.
///
/// Returns `None` outside of pull request events, or when the event file or
/// repository is not known (local runs).
pub fn load_pull_request(
    event_path: Option<&Path>,
    repository: Option<&str>,
) -> anyhow::Result<Option<PullRequestContext>> {
    let (Some(path), Some(repository)) = (event_path, repository) else {
        return Ok(None);
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read event payload {}", path.display()))?;
    let payload: EventPayload = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse event payload {}", path.display()))?;

    let Some(pr) = payload.pull_request else {
        return Ok(None);
    };

    let Some((owner, repo)) = repository.split_once('/') else {
        bail!("repository must be in owner/name form, got '{repository}'");
    };

    Ok(Some(PullRequestContext {
        owner: owner.to_string(),
        repo: repo.to_string(),
        number: pr.number,
        head_sha: pr
            .head
            .and_then(|head| head.sha)
            .filter(|sha| !sha.is_empty()),
    }))
}
