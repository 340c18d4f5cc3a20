use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use crate::config::PollSettings;
use crate::console::{Console, HEARTBEAT};
use crate::control::ControlPlane;
use crate::error::{PollError, Result};
use crate::reconcile::{reconcile, Reconciliation};
use crate::render::progress_line;
use crate::report::ReportSink;
use crate::types::{DedupKey, Execution, ExecutionStatus, ObservedSet};

/// Terminal outcome of a poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
}

/// Drives sleep → fetch → reconcile → report until the execution leaves
/// `InProgress`.
pub struct Poller<'a> {
    control: &'a dyn ControlPlane,
    settings: &'a PollSettings,
    console: &'a dyn Console,
}

impl<'a> Poller<'a> {
    pub fn new(
        control: &'a dyn ControlPlane,
        settings: &'a PollSettings,
        console: &'a dyn Console,
    ) -> Self {
        Self {
            control,
            settings,
            console,
        }
    }

    /// Poll until a terminal status is observed.
    ///
    /// `cancel` is honoured only between iterations (during the sleep), so a
    /// report update is never interrupted halfway. Any control-plane or
    /// report failure ends the loop with that error.
    pub async fn run(
        &self,
        catalog: ObservedSet,
        execution: &mut Execution,
        mut report: Option<&mut ReportSink<'_>>,
        cancel: &CancellationToken,
    ) -> Result<ExecutionResult> {
        let mut previous_keys: HashSet<DedupKey> = HashSet::new();
        let mut observed = catalog;
        let mut iteration: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(execution_id = %execution.id, "polling cancelled");
                    return Err(PollError::Cancelled);
                }
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
            iteration += 1;

            let (status, details) = tokio::try_join!(
                self.control
                    .get_execution_status(&execution.pipeline_name, &execution.id),
                self.control
                    .list_action_executions(&execution.pipeline_name, &execution.id),
            )?;
            execution.status = status;

            let Reconciliation {
                changed,
                next_keys,
                merged,
            } = reconcile(&previous_keys, &observed, &details);

            tracing::debug!(
                iteration,
                status = %execution.status,
                fetched = details.len(),
                changed = changed.len(),
                "poll complete"
            );

            if changed.is_empty() {
                self.console.line(HEARTBEAT);
            } else {
                for observation in &changed {
                    self.console.line(&progress_line(observation));
                }
            }

            let terminal = execution.status.is_terminal();
            if let Some(sink) = report.as_deref_mut() {
                sink.push(&merged, terminal, &self.settings.icons).await?;
            }

            if terminal {
                tracing::info!(
                    execution_id = %execution.id,
                    status = %execution.status,
                    iterations = iteration,
                    "execution reached terminal state"
                );
                return Ok(ExecutionResult {
                    status: execution.status.clone(),
                });
            }

            previous_keys = next_keys;
            observed = merged;
        }
    }
}
