use tokio_util::sync::CancellationToken;

use crate::catalog::build_catalog;
use crate::config::PollSettings;
use crate::console::Console;
use crate::control::ControlPlane;
use crate::error::{PollError, Result};
use crate::poller::Poller;
use crate::render::render_heading;
use crate::report::{CommentApi, PullRequestContext, ReportSink};
use crate::types::{Execution, ExecutionStatus};

// ---------------------------------------------------------------------------
// Request / outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub pipeline_name: String,
    /// Set when the run was triggered by a pull request; enables the report.
    pub pull_request: Option<PullRequestContext>,
}

/// What the caller publishes once polling is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub execution_id: String,
    pub status: ExecutionStatus,
    pub url: String,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        self.status.is_success()
    }

    /// `Err(UnsuccessfulExecution)` for any terminal status but `Succeeded`.
    pub fn ensure_succeeded(&self) -> Result<()> {
        if self.succeeded() {
            return Ok(());
        }
        Err(PollError::UnsuccessfulExecution {
            execution_id: self.execution_id.clone(),
            status: self.status.clone(),
            url: self.url.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Start the pipeline, watch it to completion and return the final status.
///
/// Starting the execution and loading the definition run concurrently. When
/// the request carries a pull request and `comments` is present, a progress
/// comment is created and kept in sync; otherwise reporting is skipped.
pub async fn execute(
    control: &dyn ControlPlane,
    comments: Option<&dyn CommentApi>,
    settings: &PollSettings,
    console: &dyn Console,
    request: &ExecutionRequest,
    cancel: &CancellationToken,
) -> Result<ExecutionOutcome> {
    let name = request.pipeline_name.trim();
    if name.is_empty() {
        return Err(PollError::MissingInput("pipeline-name"));
    }

    let (execution_id, definition) = tokio::try_join!(
        control.start_execution(name),
        control.get_definition(name),
    )?;

    let url = settings.execution_url(name, &execution_id, control.region());
    let catalog = build_catalog(&definition);
    tracing::info!(
        %execution_id,
        actions = catalog.len(),
        stages = definition.stages.len(),
        "pipeline execution started"
    );

    console.line(&format!("Pipeline execution ID: {execution_id}"));
    console.line(&format!("Pipeline execution URL: {url}"));
    console.line("Pipeline actions:");
    for entry in &catalog {
        console.line(&format!("- {}", entry.action));
    }

    let mut report = match (&request.pull_request, comments) {
        (Some(pr), Some(api)) => {
            let heading = render_heading(name, &url, pr.head_sha.as_deref());
            Some(ReportSink::open(api, pr, heading, &catalog, &settings.icons).await?)
        }
        (Some(pr), None) => {
            tracing::warn!(
                pull_request = pr.number,
                "no comment client configured; skipping pull request report"
            );
            None
        }
        _ => None,
    };

    let mut execution = Execution {
        id: execution_id,
        pipeline_name: name.to_string(),
        status: ExecutionStatus::InProgress,
        url,
    };

    console.line(&format!(
        "Polling started. Progress will be updated every {} seconds.",
        settings.poll_interval.as_secs()
    ));

    let result = Poller::new(control, settings, console)
        .run(catalog, &mut execution, report.as_mut(), cancel)
        .await?;

    Ok(ExecutionOutcome {
        execution_id: execution.id,
        status: result.status,
        url: execution.url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ActionDeclaration, PipelineDefinition, StageDeclaration};
    use crate::testing::{observation, RecordingComments, RecordingConsole, ScriptedControlPlane};
    use crate::types::ActionStatus;
    use std::time::Duration;

    fn definition() -> PipelineDefinition {
        PipelineDefinition {
            name: "web".into(),
            stages: vec![
                StageDeclaration {
                    name: "Source".into(),
                    actions: vec![ActionDeclaration {
                        name: "Checkout".into(),
                    }],
                },
                StageDeclaration {
                    name: "Deploy".into(),
                    actions: vec![ActionDeclaration {
                        name: "Prod".into(),
                    }],
                },
            ],
        }
    }

    fn settings() -> PollSettings {
        PollSettings::default().with_poll_interval(Duration::ZERO)
    }

    fn request(pr: bool) -> ExecutionRequest {
        ExecutionRequest {
            pipeline_name: "web".into(),
            pull_request: pr.then(|| PullRequestContext {
                owner: "acme".into(),
                repo: "web".into(),
                number: 9,
                head_sha: Some("feedfacecafe".into()),
            }),
        }
    }

    fn finished_control() -> ScriptedControlPlane {
        ScriptedControlPlane::new(
            definition(),
            vec![(
                ExecutionStatus::Succeeded,
                vec![
                    observation("a2", "Deploy", "Prod", ActionStatus::Succeeded, None),
                    observation("a1", "Source", "Checkout", ActionStatus::Succeeded, None),
                ],
            )],
        )
    }

    #[tokio::test]
    async fn prints_catalog_banner_and_returns_outcome() {
        let control = finished_control();
        let console = RecordingConsole::default();

        let outcome = execute(
            &control,
            None,
            &settings(),
            &console,
            &request(false),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.execution_id, "exec-1");
        assert_eq!(outcome.status, ExecutionStatus::Succeeded);
        assert!(outcome.url.contains("/pipelines/web/executions/exec-1/"));
        assert!(outcome.url.ends_with("region=us-east-1"));
        assert!(outcome.ensure_succeeded().is_ok());
        assert_eq!(control.starts(), 1);

        let lines = console.lines();
        assert_eq!(lines[0], "Pipeline execution ID: exec-1");
        assert!(lines[1].starts_with("Pipeline execution URL: https://console.aws.amazon.com/"));
        assert_eq!(lines[2], "Pipeline actions:");
        assert_eq!(lines[3], "- Source / Checkout");
        assert_eq!(lines[4], "- Deploy / Prod");
        assert_eq!(
            lines[5],
            "Polling started. Progress will be updated every 0 seconds."
        );
        assert_eq!(lines[6], "Source / Checkout - Succeeded");
        assert_eq!(lines[7], "Deploy / Prod - Succeeded");
    }

    #[tokio::test]
    async fn pull_request_run_creates_and_updates_comment() {
        let control = finished_control();
        let comments = RecordingComments::default();
        let console = RecordingConsole::default();

        execute(
            &control,
            Some(&comments as &dyn CommentApi),
            &settings(),
            &console,
            &request(true),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let created = comments.created();
        assert_eq!(created.len(), 1);
        assert!(created[0].contains("is executing against commit `feedfac`"));
        assert!(created[0].contains(":pray:&nbsp;&nbsp;Source / Checkout - NotStarted"));

        let updates = comments.updates();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].contains("was executed against commit `feedfac`"));
        assert!(updates[0].contains(":thumbsup:&nbsp;&nbsp;Deploy / Prod - Succeeded"));
    }

    #[tokio::test]
    async fn push_runs_skip_the_report() {
        let control = finished_control();
        let comments = RecordingComments::default();

        execute(
            &control,
            Some(&comments as &dyn CommentApi),
            &settings(),
            &RecordingConsole::default(),
            &request(false),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(comments.created().is_empty());
        assert!(comments.updates().is_empty());
    }

    #[tokio::test]
    async fn empty_pipeline_name_is_a_config_error() {
        let control = finished_control();
        let mut req = request(false);
        req.pipeline_name = "  ".into();

        let err = execute(
            &control,
            None,
            &settings(),
            &RecordingConsole::default(),
            &req,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.is_config());
        assert_eq!(control.starts(), 0);
    }

    #[tokio::test]
    async fn start_failure_is_a_transport_error() {
        let mut control = finished_control();
        control.fail_start = true;

        let err = execute(
            &control,
            None,
            &settings(),
            &RecordingConsole::default(),
            &request(false),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.is_transport());
        assert!(err.to_string().contains("StartPipelineExecution"));
    }

    #[test]
    fn unsuccessful_outcome_keeps_details() {
        let outcome = ExecutionOutcome {
            execution_id: "e9".into(),
            status: ExecutionStatus::Failed,
            url: "https://console/e9".into(),
        };
        assert!(!outcome.succeeded());
        match outcome.ensure_succeeded().unwrap_err() {
            PollError::UnsuccessfulExecution {
                execution_id,
                status,
                url,
            } => {
                assert_eq!(execution_id, "e9");
                assert_eq!(status, ExecutionStatus::Failed);
                assert_eq!(url, "https://console/e9");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
