use serde::{Deserialize, Serialize};

/// A structurally detected pattern over the resolved symbol/relationship
/// graph (singleton, factory, god object, ...). Detection is opportunistic,
/// not exhaustive — see semantic analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub id: u64,
    pub project_id: u64,
    pub name: String,
    pub scope: String,
    pub symbol_ids: Vec<u64>,
    pub confidence: f32,
}

impl DetectedPattern {
    pub fn new(id: u64, project_id: u64, name: impl Into<String>, scope: impl Into<String>, symbol_ids: Vec<u64>, confidence: f32) -> Self {
        Self {
            id,
            project_id,
            name: name.into(),
            scope: scope.into(),
            symbol_ids,
            confidence,
        }
    }
}

/// Unresolved pattern hint as emitted by a parser adapter, pre virtual-symbol
/// binding. Most adapters never emit these; semantic analysis derives
/// patterns directly from the resolved graph instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternInfo {
    pub name: String,
    pub scope: String,
    pub involved_names: Vec<String>,
    pub confidence: f32,
}
