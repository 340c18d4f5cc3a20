//! `codepipeline-client`: the slice of the AWS CodePipeline API needed to
//! start an execution and watch it, signed with SigV4 and sent over `reqwest`.
//!
//! [`CodePipelineClient`] implements [`pipeline_core::ControlPlane`].

pub mod client;
pub mod control;
pub mod credentials;
pub mod error;
pub mod profile;
pub mod provider;
pub mod sigv4;
pub mod types;

pub use client::{CodePipelineClient, RetryPolicy};
pub use credentials::{region_from_lookup, Credentials};
pub use error::{ClientError, Result};
pub use profile::ProfileSet;
pub use provider::{resolve_region, CredentialSource, CredentialsProvider};
