use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ExecutionStatus
// ---------------------------------------------------------------------------

/// Overall status of one pipeline execution as reported by the control plane.
///
/// Values the control plane may add later land in `Other` rather than failing
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
    InProgress,
    Stopped,
    Stopping,
    Succeeded,
    Superseded,
    Failed,
    Other(String),
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ExecutionStatus::InProgress => "InProgress",
            ExecutionStatus::Stopped => "Stopped",
            ExecutionStatus::Stopping => "Stopping",
            ExecutionStatus::Succeeded => "Succeeded",
            ExecutionStatus::Superseded => "Superseded",
            ExecutionStatus::Failed => "Failed",
            ExecutionStatus::Other(s) => s,
        }
    }

    /// Every status other than `InProgress` ends polling.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::InProgress)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionStatus::Succeeded)
    }
}

impl From<&str> for ExecutionStatus {
    fn from(s: &str) -> Self {
        match s {
            "InProgress" => ExecutionStatus::InProgress,
            "Stopped" => ExecutionStatus::Stopped,
            "Stopping" => ExecutionStatus::Stopping,
            "Succeeded" => ExecutionStatus::Succeeded,
            "Superseded" => ExecutionStatus::Superseded,
            "Failed" => ExecutionStatus::Failed,
            other => ExecutionStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for ExecutionStatus {
    fn from(s: String) -> Self {
        ExecutionStatus::from(s.as_str())
    }
}

impl From<ExecutionStatus> for String {
    fn from(status: ExecutionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionStatus {
    NotStarted,
    InProgress,
    Succeeded,
    Failed,
    Abandoned,
    Other(String),
}

impl ActionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ActionStatus::NotStarted => "NotStarted",
            ActionStatus::InProgress => "InProgress",
            ActionStatus::Succeeded => "Succeeded",
            ActionStatus::Failed => "Failed",
            ActionStatus::Abandoned => "Abandoned",
            ActionStatus::Other(s) => s,
        }
    }
}

impl From<&str> for ActionStatus {
    fn from(s: &str) -> Self {
        match s {
            "NotStarted" => ActionStatus::NotStarted,
            "InProgress" => ActionStatus::InProgress,
            "Succeeded" => ActionStatus::Succeeded,
            "Failed" => ActionStatus::Failed,
            "Abandoned" => ActionStatus::Abandoned,
            other => ActionStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for ActionStatus {
    fn from(s: String) -> Self {
        ActionStatus::from(s.as_str())
    }
}

impl From<ActionStatus> for String {
    fn from(status: ActionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActionRef / ActionObservation
// ---------------------------------------------------------------------------

/// Name-based identity of an action inside the pipeline definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionRef {
    pub stage_name: String,
    pub action_name: String,
}

impl ActionRef {
    pub fn new(stage_name: impl Into<String>, action_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            action_name: action_name.into(),
        }
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.stage_name, self.action_name)
    }
}

/// Latest known state of one action.
///
/// `execution_id` is assigned by the control plane per attempt and is `None`
/// for catalog placeholders that have never been observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionObservation {
    pub action: ActionRef,
    pub status: ActionStatus,
    pub execution_id: Option<String>,
    pub result_url: Option<String>,
}

impl ActionObservation {
    pub fn not_started(action: ActionRef) -> Self {
        Self {
            action,
            status: ActionStatus::NotStarted,
            execution_id: None,
            result_url: None,
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            execution_id: self.execution_id.clone().unwrap_or_default(),
            status: self.status.clone(),
        }
    }
}

/// `(actionExecutionId, status)`; changes when an action re-runs or moves
/// to a new status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub execution_id: String,
    pub status: ActionStatus,
}

// ---------------------------------------------------------------------------
// ObservedSet
// ---------------------------------------------------------------------------

/// All catalog actions in display order: stage order, then declaration order
/// within the stage. Cardinality and order never change after the catalog is
/// built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedSet {
    entries: Vec<ActionObservation>,
}

impl ObservedSet {
    pub(crate) fn from_entries(entries: Vec<ActionObservation>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ActionObservation] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionObservation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, action: &ActionRef) -> Option<&ActionObservation> {
        self.entries.iter().find(|e| &e.action == action)
    }
}

impl<'a> IntoIterator for &'a ObservedSet {
    type Item = &'a ActionObservation;
    type IntoIter = std::slice::Iter<'a, ActionObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// One run of the pipeline. `status` only ever changes from a fresh snapshot.
#[derive(Debug, Clone)]
pub struct Execution {
    pub id: String,
    pub pipeline_name: String,
    pub status: ExecutionStatus,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
