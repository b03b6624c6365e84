use crate::types::RelationshipType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A resolved, directed edge between two symbols. Uniqueness on
/// `(project_id, from_symbol_id, to_symbol_id, relationship_type)` is
/// enforced by the store/cache; duplicates are silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniversalRelationship {
    pub id: u64,
    pub project_id: u64,
    pub from_symbol_id: u64,
    pub to_symbol_id: u64,
    pub relationship_type: RelationshipType,
    pub confidence: f32,
    pub context_line: Option<u32>,
    pub context_snippet: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl UniversalRelationship {
    pub fn new(
        id: u64,
        project_id: u64,
        from_symbol_id: u64,
        to_symbol_id: u64,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            id,
            project_id,
            from_symbol_id,
            to_symbol_id,
            relationship_type,
            confidence: 1.0,
            context_line: None,
            context_snippet: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Key used for uniqueness checks and dedup across resolve passes.
    pub fn dedup_key(&self) -> (u64, u64, u64, RelationshipType) {
        (self.project_id, self.from_symbol_id, self.to_symbol_id, self.relationship_type)
    }
}

/// Unresolved relationship as emitted by a parser adapter, before the
/// resolver has bound either endpoint to a concrete symbol id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipInfo {
    pub from_name: String,
    pub to_name: String,
    pub relationship_type: RelationshipType,
    pub confidence: f32,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub context_snippet: Option<String>,
    pub source_text: Option<String>,
    pub cross_language: bool,
    pub bridge_type: Option<String>,
}

impl RelationshipInfo {
    pub fn new(from_name: impl Into<String>, to_name: impl Into<String>, relationship_type: RelationshipType) -> Self {
        Self {
            from_name: from_name.into(),
            to_name: to_name.into(),
            relationship_type,
            confidence: 1.0,
            line: None,
            column: None,
            context_snippet: None,
            source_text: None,
            cross_language: false,
            bridge_type: None,
        }
    }
}

/// A resolved call site, tracked separately from generic `calls` edges so
/// the control-flow analyzer and impact-analysis queries can reason about
/// individual invocations rather than the aggregate edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolCall {
    pub caller_id: u64,
    pub callee_id: Option<u64>,
    pub target_function: String,
    pub line: u32,
    pub column: u32,
    pub call_type: String,
    pub is_conditional: bool,
    pub is_recursive: bool,
}
