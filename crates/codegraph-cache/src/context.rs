use std::collections::HashMap;

/// Query-time environment for [`crate::SymbolResolutionCache::resolve`].
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    pub current_file: Option<String>,
    pub current_namespace: Option<String>,
    pub imported_namespaces: Vec<String>,
    pub type_aliases: HashMap<String, String>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current_file(mut self, file: impl Into<String>) -> Self {
        self.current_file = Some(file.into());
        self
    }

    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.current_namespace = Some(ns.into());
        self
    }

    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imported_namespaces = imports;
        self
    }
}
