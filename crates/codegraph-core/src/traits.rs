use crate::error::Result;
use crate::pattern::PatternInfo;
use crate::relationship::RelationshipInfo;
use crate::symbol::UniversalSymbol;
use crate::types::{Language, SymbolKind, Visibility};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A symbol as emitted by a parser adapter, pre-id-assignment (the store
/// assigns the stable `id` on insert). Mirrors [`UniversalSymbol`] minus the
/// fields only the store/cache can fill in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub file_path: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub signature: Option<String>,
    pub return_type: Option<String>,
    pub visibility: Visibility,
    pub namespace: Option<String>,
    pub parent_scope: Option<String>,
    pub is_definition: bool,
    pub is_exported: bool,
    pub is_async: bool,
    pub is_abstract: bool,
    pub complexity: Option<f32>,
}

impl SymbolInfo {
    pub fn into_universal(self, id: u64, project_id: u64, language: Language) -> UniversalSymbol {
        let mut sym = UniversalSymbol::new(
            id,
            project_id,
            language,
            self.name,
            self.qualified_name,
            self.kind,
            self.file_path,
            self.line,
        );
        sym.column = self.column;
        sym.end_line = self.end_line;
        sym.end_column = self.end_column;
        sym.signature = self.signature;
        sym.return_type = self.return_type;
        sym.visibility = self.visibility;
        sym.namespace = self.namespace;
        sym.parent_scope = self.parent_scope;
        sym.is_definition = self.is_definition;
        sym.is_exported = self.is_exported;
        sym.is_async = self.is_async;
        sym.is_abstract = self.is_abstract;
        sym.complexity = self.complexity;
        sym
    }
}

/// Control-flow data a parser adapter may optionally attach per function
/// symbol; consumed directly by the control-flow analyzer when present,
/// otherwise the analyzer derives it itself from the syntax tree.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ControlFlowData {
    pub blocks: Vec<serde_json::Value>,
    pub calls: Vec<serde_json::Value>,
}

/// Raw AST and source text, passed through for downstream semantic analysis
/// that needs more than the normalized symbol/relationship model.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SemanticIntelligence {
    pub ast: Option<String>,
    pub source_code: Option<String>,
}

/// Everything one parser adapter invocation produces for a single file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParseOutput {
    pub symbols: Vec<SymbolInfo>,
    pub relationships: Vec<RelationshipInfo>,
    pub patterns: Vec<PatternInfo>,
    pub control_flow_data: Option<ControlFlowData>,
    pub semantic_intelligence: Option<SemanticIntelligence>,
}

/// The external per-language syntax adapter contract. Concrete grammar
/// integrations (tree-sitter or otherwise) are out of scope for this crate;
/// only the contract and small reference adapters (for testing the
/// dispatcher/resolver without a real grammar) live here.
#[async_trait]
pub trait ParserAdapter: Send + Sync {
    fn initialize(&mut self) -> Result<()>;
    fn supported_languages(&self) -> &[Language];
    async fn parse(&self, file_path: &Path, content: &str) -> Result<ParseOutput>;
}

/// A node in some adapter's syntax tree, abstracted just enough for the
/// control-flow analyzer's tree-mode walk to operate without depending on a
/// concrete grammar crate.
pub trait SyntaxNode {
    fn kind(&self) -> &str;
    fn start_line(&self) -> u32;
    fn end_line(&self) -> u32;
    fn text<'a>(&self, source: &'a str) -> &'a str;
    fn children(&self) -> Vec<Self>
    where
        Self: Sized;
}

/// External persistence backend contract. A real relational store is out of
/// scope; [`crate::store::InMemorySymbolStore`] is the reference/test
/// implementation used to run the orchestrator end to end.
#[async_trait]
pub trait SymbolStore: Send + Sync {
    async fn upsert_project(&self, name: &str, root_path: &str) -> Result<u64>;
    async fn upsert_language(&self, name: &str) -> Result<u64>;

    async fn get_file_record(&self, project_id: u64, file_path: &str) -> Result<Option<crate::project::FileRecord>>;
    async fn upsert_file_record(&self, record: crate::project::FileRecord) -> Result<()>;
    async fn list_file_paths(&self, project_id: u64) -> Result<Vec<String>>;
    async fn delete_file(&self, project_id: u64, file_path: &str) -> Result<()>;

    async fn next_symbol_id(&self) -> u64;
    async fn store_symbols(&self, symbols: Vec<UniversalSymbol>) -> Result<usize>;
    async fn clear_file_symbols(&self, project_id: u64, file_path: &str) -> Result<()>;
    async fn all_symbols(&self, project_id: u64) -> Result<Vec<UniversalSymbol>>;

    async fn next_relationship_id(&self) -> u64;
    async fn store_relationships(&self, relationships: Vec<crate::relationship::UniversalRelationship>) -> Result<usize>;
    async fn all_relationships(&self, project_id: u64) -> Result<Vec<crate::relationship::UniversalRelationship>>;

    async fn next_pattern_id(&self) -> u64;
    async fn store_patterns(&self, patterns: Vec<crate::pattern::DetectedPattern>) -> Result<usize>;
}

/// Callback-style progress sink, distinct from [`crate::config::ProgressCallback`]
/// for collaborators (e.g. a dashboard) that want an async handle instead of
/// a plain closure.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    async fn track(&self, progress: crate::progress::IndexProgress) -> Result<()>;
}
