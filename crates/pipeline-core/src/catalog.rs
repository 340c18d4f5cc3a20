use serde::{Deserialize, Serialize};

use crate::types::{ActionObservation, ActionRef, ObservedSet};

// ---------------------------------------------------------------------------
// Pipeline definition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    #[serde(default)]
    pub stages: Vec<StageDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDeclaration {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<ActionDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDeclaration {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Flatten the definition into one `NotStarted` observation per action, in
/// stage order and then declaration order within each stage.
pub fn build_catalog(definition: &PipelineDefinition) -> ObservedSet {
    let entries = definition
        .stages
        .iter()
        .flat_map(|stage| {
            stage.actions.iter().map(move |action| {
                ActionObservation::not_started(ActionRef::new(&stage.name, &action.name))
            })
        })
        .collect();
    ObservedSet::from_entries(entries)
}
