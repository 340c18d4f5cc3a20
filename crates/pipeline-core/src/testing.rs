//! In-memory collaborators for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::catalog::PipelineDefinition;
use crate::console::Console;
use crate::control::ControlPlane;
use crate::error::TransportError;
use crate::report::{CommentApi, PullRequestContext, ReportHandle};
use crate::types::{ActionObservation, ActionRef, ActionStatus, ExecutionStatus};

pub(crate) fn observation(
    id: &str,
    stage: &str,
    action: &str,
    status: ActionStatus,
    url: Option<&str>,
) -> ActionObservation {
    ActionObservation {
        action: ActionRef::new(stage, action),
        status,
        execution_id: Some(id.into()),
        result_url: url.map(str::to_string),
    }
}

// ---------------------------------------------------------------------------
// ScriptedControlPlane
// ---------------------------------------------------------------------------

/// Serves one pre-built snapshot per poll. Both reads of poll `n` see
/// snapshot `n`; running past the script is a transport error.
pub(crate) struct ScriptedControlPlane {
    pub definition: PipelineDefinition,
    pub snapshots: Vec<(ExecutionStatus, Vec<ActionObservation>)>,
    pub fail_start: bool,
    status_polls: AtomicUsize,
    list_polls: AtomicUsize,
    started: AtomicUsize,
}

impl ScriptedControlPlane {
    pub fn new(
        definition: PipelineDefinition,
        snapshots: Vec<(ExecutionStatus, Vec<ActionObservation>)>,
    ) -> Self {
        Self {
            definition,
            snapshots,
            fail_start: false,
            status_polls: AtomicUsize::new(0),
            list_polls: AtomicUsize::new(0),
            started: AtomicUsize::new(0),
        }
    }

    pub fn polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    fn snapshot(
        &self,
        counter: &AtomicUsize,
        operation: &'static str,
    ) -> Result<&(ExecutionStatus, Vec<ActionObservation>), TransportError> {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .get(n)
            .ok_or_else(|| TransportError::new(operation, "script exhausted"))
    }
}

#[async_trait]
impl ControlPlane for ScriptedControlPlane {
    fn region(&self) -> &str {
        "us-east-1"
    }

    async fn start_execution(&self, _pipeline_name: &str) -> Result<String, TransportError> {
        if self.fail_start {
            return Err(TransportError::new(
                "StartPipelineExecution",
                "PipelineNotFoundException",
            ));
        }
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok("exec-1".into())
    }

    async fn get_definition(
        &self,
        _pipeline_name: &str,
    ) -> Result<PipelineDefinition, TransportError> {
        Ok(self.definition.clone())
    }

    async fn get_execution_status(
        &self,
        _pipeline_name: &str,
        _execution_id: &str,
    ) -> Result<ExecutionStatus, TransportError> {
        self.snapshot(&self.status_polls, "GetPipelineExecution")
            .map(|(status, _)| status.clone())
    }

    async fn list_action_executions(
        &self,
        _pipeline_name: &str,
        _execution_id: &str,
    ) -> Result<Vec<ActionObservation>, TransportError> {
        self.snapshot(&self.list_polls, "ListActionExecutions")
            .map(|(_, details)| details.clone())
    }
}

// ---------------------------------------------------------------------------
// RecordingComments
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct RecordingComments {
    fail_updates: bool,
    created: Mutex<Vec<String>>,
    updates: Mutex<Vec<String>>,
}

impl RecordingComments {
    pub fn failing_updates() -> Self {
        Self {
            fail_updates: true,
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<String> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentApi for RecordingComments {
    async fn create_comment(
        &self,
        _target: &PullRequestContext,
        body: &str,
    ) -> Result<u64, TransportError> {
        let mut created = self.created.lock().unwrap();
        created.push(body.to_string());
        Ok(created.len() as u64)
    }

    async fn update_comment(
        &self,
        _handle: &ReportHandle,
        body: &str,
    ) -> Result<(), TransportError> {
        if self.fail_updates {
            return Err(TransportError::new("UpdateComment", "502 Bad Gateway"));
        }
        self.updates.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingConsole
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct RecordingConsole {
    lines: Mutex<Vec<String>>,
}

impl RecordingConsole {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Console for RecordingConsole {
    fn line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
