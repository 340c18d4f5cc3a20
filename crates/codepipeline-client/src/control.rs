use async_trait::async_trait;
use pipeline_core::{
    ActionDeclaration, ActionObservation, ActionRef, ControlPlane, ExecutionStatus,
    PipelineDefinition, StageDeclaration, TransportError,
};

use crate::client::CodePipelineClient;
use crate::types::{ActionExecutionDetail, PipelineDeclaration};

impl From<PipelineDeclaration> for PipelineDefinition {
    fn from(pipeline: PipelineDeclaration) -> Self {
        PipelineDefinition {
            name: pipeline.name,
            stages: pipeline
                .stages
                .into_iter()
                .map(|stage| StageDeclaration {
                    name: stage.name,
                    actions: stage
                        .actions
                        .into_iter()
                        .map(|action| ActionDeclaration { name: action.name })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<ActionExecutionDetail> for ActionObservation {
    fn from(detail: ActionExecutionDetail) -> Self {
        let result_url = detail.external_url().map(str::to_string);
        ActionObservation {
            action: ActionRef::new(detail.stage_name, detail.action_name),
            status: detail.status,
            execution_id: Some(detail.action_execution_id),
            result_url,
        }
    }
}

#[async_trait]
impl ControlPlane for CodePipelineClient {
    fn region(&self) -> &str {
        CodePipelineClient::region(self)
    }

    async fn start_execution(&self, pipeline_name: &str) -> Result<String, TransportError> {
        self.start_pipeline_execution(pipeline_name)
            .await
            .map_err(|e| TransportError::new("StartPipelineExecution", e))
    }

    async fn get_definition(
        &self,
        pipeline_name: &str,
    ) -> Result<PipelineDefinition, TransportError> {
        self.get_pipeline(pipeline_name)
            .await
            .map(PipelineDefinition::from)
            .map_err(|e| TransportError::new("GetPipeline", e))
    }

    async fn get_execution_status(
        &self,
        pipeline_name: &str,
        execution_id: &str,
    ) -> Result<ExecutionStatus, TransportError> {
        self.get_pipeline_execution(pipeline_name, execution_id)
            .await
            .map(|execution| execution.status)
            .map_err(|e| TransportError::new("GetPipelineExecution", e))
    }

    async fn list_action_executions(
        &self,
        pipeline_name: &str,
        execution_id: &str,
    ) -> Result<Vec<ActionObservation>, TransportError> {
        let details = CodePipelineClient::list_action_executions(self, pipeline_name, execution_id)
            .await
            .map_err(|e| TransportError::new("ListActionExecutions", e))?;
        Ok(details.into_iter().map(ActionObservation::from).collect())
    }
}
