//! Request and response shapes for the CodePipeline JSON 1.1 API.
//!
//! Only the fields this tool reads are modelled; everything else in the
//! responses is ignored.

use pipeline_core::{ActionStatus, ExecutionStatus};
use serde::{Deserialize, Serialize};

// ─── StartPipelineExecution ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPipelineExecutionInput<'a> {
    pub name: &'a str,
    /// Idempotency token; retries of one logical start must reuse it.
    pub client_request_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPipelineExecutionOutput {
    pub pipeline_execution_id: String,
}

// ─── GetPipeline ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GetPipelineInput<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GetPipelineOutput {
    pub pipeline: PipelineDeclaration,
}

#[derive(Debug, Deserialize)]
pub struct PipelineDeclaration {
    pub name: String,
    #[serde(default)]
    pub stages: Vec<StageDeclaration>,
}

#[derive(Debug, Deserialize)]
pub struct StageDeclaration {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<ActionDeclaration>,
}

#[derive(Debug, Deserialize)]
pub struct ActionDeclaration {
    pub name: String,
}

// ─── GetPipelineExecution ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPipelineExecutionInput<'a> {
    pub pipeline_name: &'a str,
    pub pipeline_execution_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPipelineExecutionOutput {
    pub pipeline_execution: PipelineExecution,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineExecution {
    pub pipeline_execution_id: String,
    pub status: ExecutionStatus,
}

// ─── ListActionExecutions ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListActionExecutionsInput<'a> {
    pub pipeline_name: &'a str,
    pub filter: ActionExecutionFilter<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExecutionFilter<'a> {
    pub pipeline_execution_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListActionExecutionsOutput {
    #[serde(default)]
    pub action_execution_details: Vec<ActionExecutionDetail>,
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExecutionDetail {
    pub action_execution_id: String,
    pub stage_name: String,
    pub action_name: String,
    pub status: ActionStatus,
    #[serde(default)]
    pub output: Option<ActionExecutionOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExecutionOutput {
    #[serde(default)]
    pub execution_result: Option<ActionExecutionResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExecutionResult {
    #[serde(default)]
    pub external_execution_url: Option<String>,
}

impl ActionExecutionDetail {
    pub fn external_url(&self) -> Option<&str> {
        self.output
            .as_ref()
            .and_then(|o| o.execution_result.as_ref())
            .and_then(|r| r.external_execution_url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

// ─── Errors ───────────────────────────────────────────────────────────────

/// Error body returned by AWS JSON services.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "__type", default)]
    pub kind: Option<String>,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// The bare exception name, without the `namespace#` prefix.
    pub fn code(&self) -> &str {
        let kind = self.kind.as_deref().unwrap_or("UnknownError");
        kind.rsplit('#').next().unwrap_or(kind)
    }
}
