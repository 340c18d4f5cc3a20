use async_trait::async_trait;

use crate::catalog::PipelineDefinition;
use crate::error::TransportError;
use crate::types::{ActionObservation, ExecutionStatus};

/// Read/start operations consumed from the pipeline control plane.
///
/// Implementations own their retry policy; every error they return ends the
/// run.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Region the executions run in; part of the console URL.
    fn region(&self) -> &str;

    async fn start_execution(&self, pipeline_name: &str) -> Result<String, TransportError>;

    async fn get_definition(
        &self,
        pipeline_name: &str,
    ) -> Result<PipelineDefinition, TransportError>;

    async fn get_execution_status(
        &self,
        pipeline_name: &str,
        execution_id: &str,
    ) -> Result<ExecutionStatus, TransportError>;

    /// Action attempts for one execution, newest first.
    async fn list_action_executions(
        &self,
        pipeline_name: &str,
        execution_id: &str,
    ) -> Result<Vec<ActionObservation>, TransportError>;
}
