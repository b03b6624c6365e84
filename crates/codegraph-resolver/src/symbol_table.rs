use codegraph_core::symbol::UniversalSymbol;
use std::collections::HashMap;
use std::path::Path;

/// Three-index view over a project's symbols built once per resolve pass.
/// Mirrors the index set the runtime resolution cache keeps hot, but this
/// one is throwaway: it exists only for the duration of one resolver run.
#[derive(Debug, Default)]
pub struct SymbolTable {
    by_id: HashMap<u64, UniversalSymbol>,
    by_name: HashMap<String, Vec<u64>>,
    by_qualified_name: HashMap<String, u64>,
    /// Keyed by the file's bare stem (`auth` for both `auth.rs` and
    /// `src/auth.rs`), used to prefer a same-file candidate when a bare call
    /// name is ambiguous across files.
    by_bare_file_name: HashMap<String, Vec<u64>>,
}

impl SymbolTable {
    pub fn build(symbols: Vec<UniversalSymbol>) -> Self {
        let mut table = SymbolTable::default();
        for sym in symbols {
            table.insert(sym);
        }
        table
    }

    fn insert(&mut self, sym: UniversalSymbol) {
        let id = sym.id;
        self.by_name.entry(sym.name.clone()).or_default().push(id);
        self.by_qualified_name.insert(sym.qualified_name.clone(), id);
        let stem = bare_file_stem(&sym.file_path);
        self.by_bare_file_name.entry(stem).or_default().push(id);
        self.by_id.insert(id, sym);
    }

    pub fn get(&self, id: u64) -> Option<&UniversalSymbol> {
        self.by_id.get(&id)
    }

    pub fn by_name(&self, name: &str) -> &[u64] {
        self.by_name.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn by_qualified_name(&self, qualified_name: &str) -> Option<u64> {
        self.by_qualified_name.get(qualified_name).copied()
    }

    pub fn is_in_same_file_bucket(&self, id: u64, file_path: &str) -> bool {
        let stem = bare_file_stem(file_path);
        self.by_bare_file_name
            .get(&stem)
            .map(|ids| ids.contains(&id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Every symbol whose `kind` is `Field` and whose qualified name ends
    /// with `::{member}` — the field/member heuristic used for
    /// `reads_field`/`writes_field`/`initializes_field` binding.
    pub fn fields_matching_member(&self, member: &str) -> Vec<u64> {
        let suffix = format!("::{member}");
        self.by_id
            .values()
            .filter(|s| s.kind == codegraph_core::types::SymbolKind::Field && s.qualified_name.ends_with(&suffix))
            .map(|s| s.id)
            .collect()
    }
}

pub fn bare_file_stem(file_path: &str) -> String {
    Path::new(file_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::types::{Language, SymbolKind};

    fn sym(id: u64, name: &str, qualified: &str, file: &str) -> UniversalSymbol {
        UniversalSymbol::new(id, 1, Language::Rust, name, qualified, SymbolKind::Function, file, 1)
    }

    #[test]
    fn same_name_in_different_files_lands_in_different_buckets() {
        let table = SymbolTable::build(vec![
            sym(1, "run", "a::run", "src/a.rs"),
            sym(2, "run", "b::run", "src/b.rs"),
        ]);
        assert_eq!(table.by_name("run").len(), 2);
        assert!(table.is_in_same_file_bucket(1, "src/a.rs"));
        assert!(!table.is_in_same_file_bucket(1, "src/b.rs"));
    }

    #[test]
    fn qualified_name_lookup_is_exact() {
        let table = SymbolTable::build(vec![sym(1, "run", "a::run", "src/a.rs")]);
        assert_eq!(table.by_qualified_name("a::run"), Some(1));
        assert_eq!(table.by_qualified_name("b::run"), None);
    }
}
