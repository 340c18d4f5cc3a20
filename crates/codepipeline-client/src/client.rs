use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::provider::CredentialsProvider;
use crate::error::{ClientError, Result};
use crate::sigv4::{self, SignableRequest};
use crate::types::{
    ActionExecutionDetail, ActionExecutionFilter, ApiErrorBody, GetPipelineExecutionInput,
    GetPipelineExecutionOutput, GetPipelineInput, GetPipelineOutput, ListActionExecutionsInput,
    ListActionExecutionsOutput, PipelineDeclaration, PipelineExecution,
    StartPipelineExecutionInput, StartPipelineExecutionOutput,
};

const SERVICE: &str = "codepipeline";
const TARGET_PREFIX: &str = "CodePipeline_20150709";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Upper bound on `ListActionExecutions` pages fetched per poll.
const MAX_PAGES: usize = 20;

// ─── RetryPolicy ──────────────────────────────────────────────────────────

/// Exponential backoff for throttled or failed calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

// ─── CodePipelineClient ───────────────────────────────────────────────────

/// A thin CodePipeline client speaking the AWS JSON 1.1 protocol.
#[derive(Debug, Clone)]
pub struct CodePipelineClient {
    http: reqwest::Client,
    endpoint: String,
    region: String,
    credentials: Arc<CredentialsProvider>,
    retry: RetryPolicy,
}

impl CodePipelineClient {
    pub fn new(
        region: impl Into<String>,
        credentials: CredentialsProvider,
        user_agent: &str,
    ) -> Result<Self> {
        let region = region.into();
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            endpoint: format!("https://codepipeline.{region}.amazonaws.com"),
            http,
            region,
            credentials: Arc::new(credentials),
            retry: RetryPolicy::default(),
        })
    }

    /// Point the client at a different endpoint (VPC endpoints, local mocks).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Start one execution. A fresh `clientRequestToken` is generated here and
    /// reused by every retry, so a retried start never launches a second run.
    pub async fn start_pipeline_execution(&self, name: &str) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        self.start_pipeline_execution_with_token(name, &token).await
    }

    pub async fn start_pipeline_execution_with_token(
        &self,
        name: &str,
        client_request_token: &str,
    ) -> Result<String> {
        let out: StartPipelineExecutionOutput = self
            .call(
                "StartPipelineExecution",
                &StartPipelineExecutionInput {
                    name,
                    client_request_token,
                },
            )
            .await?;
        Ok(out.pipeline_execution_id)
    }

    pub async fn get_pipeline(&self, name: &str) -> Result<PipelineDeclaration> {
        let out: GetPipelineOutput = self.call("GetPipeline", &GetPipelineInput { name }).await?;
        Ok(out.pipeline)
    }

    pub async fn get_pipeline_execution(
        &self,
        pipeline_name: &str,
        pipeline_execution_id: &str,
    ) -> Result<PipelineExecution> {
        let out: GetPipelineExecutionOutput = self
            .call(
                "GetPipelineExecution",
                &GetPipelineExecutionInput {
                    pipeline_name,
                    pipeline_execution_id,
                },
            )
            .await?;
        Ok(out.pipeline_execution)
    }

    /// All action attempts for one execution, newest first, across pages.
    pub async fn list_action_executions(
        &self,
        pipeline_name: &str,
        pipeline_execution_id: &str,
    ) -> Result<Vec<ActionExecutionDetail>> {
        let mut details = Vec::new();
        let mut next_token = None;

        for _ in 0..MAX_PAGES {
            let input = ListActionExecutionsInput {
                pipeline_name,
                filter: ActionExecutionFilter {
                    pipeline_execution_id,
                },
                next_token: next_token.take(),
            };
            let page: ListActionExecutionsOutput =
                self.call("ListActionExecutions", &input).await?;
            details.extend(page.action_execution_details);

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => return Ok(details),
            }
        }

        tracing::warn!(
            pipeline_name,
            pipeline_execution_id,
            fetched = details.len(),
            "stopped paging action executions after {MAX_PAGES} pages"
        );
        Ok(details)
    }

    // ─── Internal ─────────────────────────────────────────────────────────

    async fn call<I, O>(&self, operation: &str, input: &I) -> Result<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        // Serialized once: every attempt sends identical bytes.
        let payload = serde_json::to_vec(input).map_err(|source| ClientError::Parse {
            operation: operation.to_string(),
            source,
        })?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send(operation, &payload).await {
                Ok(body) => {
                    return serde_json::from_slice(&body).map_err(|source| ClientError::Parse {
                        operation: operation.to_string(),
                        source,
                    });
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying CodePipeline request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(&self, operation: &str, payload: &[u8]) -> Result<Vec<u8>> {
        let url = format!("{}/", self.endpoint);
        let host = host_header(&self.endpoint);
        let target = format!("{TARGET_PREFIX}.{operation}");

        let credentials = self.credentials.credentials().await?;
        let signed = sigv4::sign(
            &SignableRequest {
                method: "POST",
                path: "/",
                query: "",
                headers: vec![
                    ("content-type".to_string(), CONTENT_TYPE.to_string()),
                    ("host".to_string(), host),
                    ("x-amz-target".to_string(), target.clone()),
                ],
                payload,
            },
            &credentials,
            &self.region,
            SERVICE,
            Utc::now(),
        );

        let mut request = self
            .http
            .post(&url)
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-target", &target)
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization)
            .body(payload.to_vec());
        if let Some(token) = &signed.security_token {
            request = request.header("x-amz-security-token", token);
        }

        tracing::debug!(operation, "sending CodePipeline request");
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let error: ApiErrorBody = serde_json::from_slice(&body).unwrap_or_default();
        Err(ClientError::Api {
            operation: operation.to_string(),
            status: status.as_u16(),
            code: error.code().to_string(),
            message: error
                .message
                .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned()),
        })
    }
}

/// The `Host` value reqwest will send for `endpoint`: authority without scheme.
fn host_header(endpoint: &str) -> String {
    let without_scheme = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;
    use mockito::Matcher;
    use pipeline_core::{ActionStatus, ExecutionStatus};

    fn credentials() -> CredentialsProvider {
        CredentialsProvider::fixed(Credentials {
            access_key_id: "AKID".into(),
            secret_access_key: "secret".into(),
            session_token: Some("token".into()),
        })
    }

    fn client(server: &mockito::ServerGuard) -> CodePipelineClient {
        CodePipelineClient::new("us-east-1", credentials(), "test-agent")
            .unwrap()
            .with_endpoint(server.url())
            .with_retry(RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::ZERO,
            })
    }

    #[test]
    fn host_header_strips_scheme_and_path() {
        assert_eq!(
            host_header("https://codepipeline.us-east-1.amazonaws.com"),
            "codepipeline.us-east-1.amazonaws.com"
        );
        assert_eq!(host_header("http://127.0.0.1:1234/"), "127.0.0.1:1234");
    }

    #[test]
    fn default_endpoint_uses_region() {
        let c = CodePipelineClient::new("eu-central-1", credentials(), "ua").unwrap();
        assert_eq!(c.endpoint, "https://codepipeline.eu-central-1.amazonaws.com");
        assert_eq!(c.region(), "eu-central-1");
    }

    #[test]
    fn retry_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
        assert_eq!(policy.delay_for(3), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn start_execution_sends_signed_json_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header(
                "x-amz-target",
                "CodePipeline_20150709.StartPipelineExecution",
            )
            .match_header("content-type", CONTENT_TYPE)
            .match_header("x-amz-security-token", "token")
            .match_header(
                "authorization",
                Matcher::Regex(r"^AWS4-HMAC-SHA256 Credential=AKID/\d{8}/us-east-1/codepipeline/aws4_request, ".into()),
            )
            .match_header("user-agent", "test-agent")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(serde_json::json!({"name": "web"})),
                Matcher::Regex(r#""clientRequestToken":"[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-"#.into()),
            ]))
            .with_status(200)
            .with_body(r#"{"pipelineExecutionId":"e-42"}"#)
            .create_async()
            .await;

        let id = client(&server).start_pipeline_execution("web").await.unwrap();
        assert_eq!(id, "e-42");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_pipeline_parses_stages() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_header("x-amz-target", "CodePipeline_20150709.GetPipeline")
            .with_status(200)
            .with_body(
                r#"{"pipeline":{"name":"web","roleArn":"arn","stages":[
                    {"name":"Source","actions":[{"name":"Checkout","actionTypeId":{}}]},
                    {"name":"Deploy","actions":[{"name":"Staging"},{"name":"Prod"}]}
                ]},"metadata":{}}"#,
            )
            .create_async()
            .await;

        let pipeline = client(&server).get_pipeline("web").await.unwrap();
        assert_eq!(pipeline.stages.len(), 2);
        assert_eq!(pipeline.stages[1].actions[1].name, "Prod");
    }

    #[tokio::test]
    async fn get_execution_reads_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_header("x-amz-target", "CodePipeline_20150709.GetPipelineExecution")
            .match_body(Matcher::Json(serde_json::json!({
                "pipelineName": "web",
                "pipelineExecutionId": "e-1"
            })))
            .with_status(200)
            .with_body(r#"{"pipelineExecution":{"pipelineExecutionId":"e-1","status":"Superseded"}}"#)
            .create_async()
            .await;

        let execution = client(&server)
            .get_pipeline_execution("web", "e-1")
            .await
            .unwrap();
        assert_eq!(execution.status, ExecutionStatus::Superseded);
    }

    #[tokio::test]
    async fn list_action_executions_follows_next_token() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/")
            .match_header("x-amz-target", "CodePipeline_20150709.ListActionExecutions")
            .match_body(Matcher::Json(serde_json::json!({
                "pipelineName": "web",
                "filter": {"pipelineExecutionId": "e-1"}
            })))
            .with_status(200)
            .with_body(
                r#"{"actionExecutionDetails":[
                    {"actionExecutionId":"a2","stageName":"Deploy","actionName":"Prod","status":"InProgress"}
                ],"nextToken":"t2"}"#,
            )
            .create_async()
            .await;
        let second = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(serde_json::json!({"nextToken": "t2"})))
            .with_status(200)
            .with_body(
                r#"{"actionExecutionDetails":[
                    {"actionExecutionId":"a1","stageName":"Source","actionName":"Checkout","status":"Succeeded"}
                ]}"#,
            )
            .create_async()
            .await;

        let details = client(&server)
            .list_action_executions("web", "e-1")
            .await
            .unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].action_execution_id, "a2");
        assert_eq!(details[1].status, ActionStatus::Succeeded);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn api_errors_carry_code_and_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(400)
            .with_body(r#"{"__type":"PipelineNotFoundException","message":"The account with id '1' does not include a pipeline with the name 'web'"}"#)
            .create_async()
            .await;

        let err = client(&server).get_pipeline("web").await.unwrap_err();
        match &err {
            ClientError::Api {
                operation,
                status,
                code,
                message,
            } => {
                assert_eq!(operation, "GetPipeline");
                assert_eq!(*status, 400);
                assert_eq!(code, "PipelineNotFoundException");
                assert!(message.contains("does not include a pipeline"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn retried_start_reuses_its_request_token() {
        let mut server = mockito::Server::new_async().await;
        let unavailable = server
            .mock("POST", "/")
            .match_header(
                "x-amz-target",
                "CodePipeline_20150709.StartPipelineExecution",
            )
            .match_body(Matcher::Json(serde_json::json!({
                "name": "web",
                "clientRequestToken": "8d1c7c5e-0000-4000-8000-000000000001"
            })))
            .with_status(503)
            .with_body(r#"{"__type":"ServiceUnavailableException","message":"try again"}"#)
            .expect(3)
            .create_async()
            .await;

        let err = client(&server)
            .start_pipeline_execution_with_token("web", "8d1c7c5e-0000-4000-8000-000000000001")
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        unavailable.assert_async().await;
    }

    #[tokio::test]
    async fn each_start_gets_a_fresh_token() {
        let mut server = mockito::Server::new_async().await;
        let starts = server
            .mock("POST", "/")
            .match_body(Matcher::Regex(r#""clientRequestToken":"[0-9a-f-]{36}""#.into()))
            .with_status(200)
            .with_body(r#"{"pipelineExecutionId":"e-1"}"#)
            .expect(2)
            .create_async()
            .await;

        let c = client(&server);
        c.start_pipeline_execution("web").await.unwrap();
        c.start_pipeline_execution("web").await.unwrap();
        starts.assert_async().await;
    }

    #[tokio::test]
    async fn throttled_requests_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let throttled = server
            .mock("POST", "/")
            .with_status(400)
            .with_body(r#"{"__type":"ThrottlingException","message":"Rate exceeded"}"#)
            .expect(2)
            .create_async()
            .await;

        let err = client(&server)
            .with_retry(RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::ZERO,
            })
            .get_pipeline("web")
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        throttled.assert_async().await;
    }
}
