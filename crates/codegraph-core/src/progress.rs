use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase the orchestrator is currently executing. Ordered; the orchestrator
/// never revisits a prior phase within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    ProjectUpsert,
    Discovery,
    DeletionSweep,
    Parse,
    StoreSymbols,
    ResolveRelationships,
    SemanticAnalysis,
    Statistics,
}

/// Progress event emitted at phase transitions and after each file during
/// the parse phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexProgress {
    pub phase: Phase,
    pub total_files: usize,
    pub processed_files: usize,
    pub current_file: Option<String>,
    pub errors: usize,
    pub start_time: DateTime<Utc>,
    pub estimated_time_remaining_ms: Option<u64>,
}

impl IndexProgress {
    pub fn new(phase: Phase, total_files: usize, start_time: DateTime<Utc>) -> Self {
        Self {
            phase,
            total_files,
            processed_files: 0,
            current_file: None,
            errors: 0,
            start_time,
            estimated_time_remaining_ms: None,
        }
    }
}

/// Final result of one indexing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResult {
    pub success: bool,
    pub project_id: u64,
    pub files_indexed: usize,
    pub symbols_found: usize,
    pub relationships_found: usize,
    pub patterns_found: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
    pub confidence: f32,
}
