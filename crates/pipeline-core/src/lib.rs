//! `pipeline-core`: watch an externally started pipeline execution and
//! mirror its progress to the console and, optionally, a pull-request comment.
//!
//! ```text
//! ControlPlane ──► Poller ──► reconcile() ──► Console
//!                                  │
//!                                  └────────► ReportSink ──► CommentApi
//! ```
//!
//! The collaborators (`ControlPlane`, `CommentApi`, `Console`) are traits so
//! the loop can be driven by real HTTP clients or by in-memory fakes.

pub mod catalog;
pub mod config;
pub mod console;
pub mod control;
pub mod error;
pub mod execute;
pub mod poller;
pub mod reconcile;
pub mod render;
pub mod report;
pub mod types;

#[cfg(test)]
mod testing;

pub use catalog::{build_catalog, ActionDeclaration, PipelineDefinition, StageDeclaration};
pub use config::{PollSettings, StatusIcons};
pub use console::{Console, StdoutConsole};
pub use control::ControlPlane;
pub use error::{BoxError, PollError, Result, TransportError};
pub use execute::{execute, ExecutionOutcome, ExecutionRequest};
pub use poller::{ExecutionResult, Poller};
pub use reconcile::{reconcile, Reconciliation};
pub use report::{CommentApi, PullRequestContext, ReportHandle, ReportSink, ReportState};
pub use types::{
    ActionObservation, ActionRef, ActionStatus, DedupKey, Execution, ExecutionStatus, ObservedSet,
};
