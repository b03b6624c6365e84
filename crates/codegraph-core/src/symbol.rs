use crate::types::{Language, SymbolKind, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A symbol extracted from source, normalized to the universal model shared
/// by every language adapter. `id` is stable and monotonic within a project
/// (see [`crate::ids::SymbolIdAllocator`]); `qualified_name` uses `::` as the
/// canonical separator regardless of the source language's own convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniversalSymbol {
    pub id: u64,
    pub project_id: u64,
    pub language: Language,

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
    pub confidence: f32,
    pub semantic_tags: HashSet<String>,
    pub language_features: HashMap<String, String>,

    // Cache-only bookkeeping. Zeroed when a symbol is first stored; the
    // cache preserves these across `add()` replacement (see resolve cache).
    pub last_accessed: u64,
    pub access_count: u64,
}

impl UniversalSymbol {
    pub fn new(
        id: u64,
        project_id: u64,
        language: Language,
        name: impl Into<String>,
        qualified_name: impl Into<String>,
        kind: SymbolKind,
        file_path: impl Into<String>,
        line: u32,
    ) -> Self {
        Self {
            id,
            project_id,
            language,
            name: name.into(),
            qualified_name: qualified_name.into(),
            kind,
            file_path: file_path.into(),
            line,
            column: 0,
            end_line: line,
            end_column: 0,
            signature: None,
            return_type: None,
            visibility: Visibility::default(),
            namespace: None,
            parent_scope: None,
            is_definition: true,
            is_exported: false,
            is_async: false,
            is_abstract: false,
            complexity: None,
            confidence: 1.0,
            semantic_tags: HashSet::new(),
            language_features: HashMap::new(),
            last_accessed: 0,
            access_count: 0,
        }
    }

    /// Synthesize the one-per-file virtual symbol the resolver uses as the
    /// target of `imports` edges and as the anchor for file-scoped lookups.
    pub fn new_file_symbol(id: u64, project_id: u64, language: Language, file_path: &str) -> Self {
        let mut sym = Self::new(
            id,
            project_id,
            language,
            file_path,
            file_path,
            SymbolKind::File,
            file_path,
            1,
        );
        sym.is_exported = true;
        sym
    }

    /// Synthesize a virtual module/external-module symbol for an import
    /// target that has no other concrete representation in this project.
    pub fn new_module_symbol(
        id: u64,
        project_id: u64,
        language: Language,
        import_target: &str,
        external: bool,
    ) -> Self {
        let kind = if external {
            SymbolKind::ExternalModule
        } else {
            SymbolKind::Module
        };
        let mut sym = Self::new(
            id,
            project_id,
            language,
            import_target,
            import_target,
            kind,
            import_target,
            1,
        );
        sym.is_exported = true;
        sym
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_complexity(mut self, complexity: f32) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.semantic_tags.insert(tag.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_defaults_confidence_to_one() {
        let sym = UniversalSymbol::new(
            1,
            1,
            Language::Rust,
            "foo",
            "pkg::foo",
            SymbolKind::Function,
            "a.rs",
            10,
        );
        assert_eq!(sym.confidence, 1.0);
        assert!(sym.is_definition);
    }

    #[test]
    fn file_symbol_is_exported_and_self_qualified() {
        let sym = UniversalSymbol::new_file_symbol(2, 1, Language::Rust, "a.rs");
        assert_eq!(sym.qualified_name, "a.rs");
        assert!(sym.is_exported);
        assert_eq!(sym.kind, SymbolKind::File);
    }
}
