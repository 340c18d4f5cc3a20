mod event;
mod github;
mod inputs;
mod outputs;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use codepipeline_client::{
    resolve_region, CodePipelineClient, CredentialSource, CredentialsProvider, ProfileSet,
};
use pipeline_core::{
    execute, CommentApi, ExecutionRequest, PollError, PollSettings, StdoutConsole,
};
use tokio_util::sync::CancellationToken;

use github::GitHubComments;

const STARTING_BANNER: &str = "***** PIPELINE EXECUTION STARTING *****";
const COMPLETE_BANNER: &str = "***** PIPELINE EXECUTION COMPLETE *****";

#[derive(Parser)]
#[command(
    name = "pipeline-execute",
    about = "Start an AWS CodePipeline execution and follow it to completion",
    version
)]
struct Cli {
    /// Token used to comment on the triggering pull request
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Name of the pipeline to start
    #[arg(long, env = "PIPELINE_NAME")]
    pipeline_name: Option<String>,

    /// Seconds to wait between polls
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 20)]
    poll_interval_secs: u64,

    /// AWS region (default: AWS_REGION, AWS_DEFAULT_REGION, profile, instance metadata)
    #[arg(long)]
    region: Option<String>,

    /// Override the CodePipeline endpoint (VPC endpoints, local testing)
    #[arg(long, env = "AWS_ENDPOINT_URL_CODEPIPELINE")]
    endpoint_url: Option<String>,

    /// Path to the webhook payload that triggered the workflow
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// Repository in owner/name form
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    github_api_url: String,

    /// File that receives the step outputs
    #[arg(long, env = "GITHUB_OUTPUT")]
    output_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    println!("{STARTING_BANNER}");
    let result = run(cli);
    println!("{COMPLETE_BANNER}");

    if let Err(e) = result {
        match e.downcast_ref::<PollError>() {
            // A finished but unsuccessful execution is an outcome, not a crash.
            Some(PollError::UnsuccessfulExecution { .. }) => eprintln!("{e}"),
            _ => eprintln!("error: {e:#}"),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        github_token,
        pipeline_name,
        poll_interval_secs,
        region,
        endpoint_url,
        event_path,
        repository,
        github_api_url,
        output_file,
    } = cli;
    let env = |key: &str| std::env::var(key).ok();

    let github_token = inputs::required("github-token", github_token, env)?;
    let pipeline_name = inputs::required("pipeline-name", pipeline_name, env)?;

    let profile = ProfileSet::load(env);
    let source = CredentialSource::detect(env, &profile)
        .map_err(|e| PollError::MissingCredentials(e.to_string()))?;
    let credentials =
        CredentialsProvider::new(source).context("failed to build credentials provider")?;

    let settings = PollSettings::default()
        .with_poll_interval(Duration::from_secs(poll_interval_secs));
    let pull_request =
        event::load_pull_request(event_path.as_deref(), repository.as_deref())?;
    let comments = GitHubComments::new(&github_api_url, github_token, &settings.user_agent)
        .context("failed to build GitHub client")?;

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        // Remote credentials and the region are settled before the pipeline
        // is touched, so a misconfigured runner fails as a config error.
        credentials
            .credentials()
            .await
            .map_err(|e| PollError::MissingCredentials(e.to_string()))?;
        tracing::info!(source = credentials.source().name(), "AWS credentials loaded");

        let region = match region.filter(|r| !r.trim().is_empty()) {
            Some(region) => region,
            None => resolve_region(env, &profile)
                .await
                .map_err(|_| PollError::MissingInput("region"))?,
        };

        let mut control = CodePipelineClient::new(region, credentials, &settings.user_agent)
            .context("failed to build CodePipeline client")?;
        if let Some(endpoint) = endpoint_url {
            control = control.with_endpoint(endpoint);
        }

        let request = ExecutionRequest {
            pipeline_name,
            pull_request,
        };

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; stopping at the next poll boundary");
                on_interrupt.cancel();
            }
        });

        let outcome = execute(
            &control,
            Some(&comments as &dyn CommentApi),
            &settings,
            &StdoutConsole,
            &request,
            &cancel,
        )
        .await?;
        anyhow::Ok(outcome)
    })?;

    outputs::write_outputs(output_file.as_deref(), &outcome)?;
    outcome.ensure_succeeded()?;
    Ok(())
}
