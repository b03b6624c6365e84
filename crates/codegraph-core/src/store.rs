use crate::error::Result;
use crate::ids::SymbolIdAllocator;
use crate::pattern::DetectedPattern;
use crate::project::FileRecord;
use crate::relationship::UniversalRelationship;
use crate::symbol::UniversalSymbol;
use crate::traits::SymbolStore;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Reference/test implementation of [`SymbolStore`]. A real relational
/// backend is out of scope (see the persistence-backend interface); this
/// is what lets the orchestrator and its tests run end to end without one.
///
/// Single-writer per run as the concurrency model requires: every method
/// takes `&self` and serializes through an internal lock rather than
/// needing `&mut self`, so one orchestrator task can still own all writes
/// while readers (the cache, dashboards) hold a shared lock concurrently.
#[derive(Default)]
pub struct InMemorySymbolStore {
    inner: RwLock<Inner>,
    ids: SymbolIdAllocator,
}

#[derive(Default)]
struct Inner {
    projects: HashMap<String, u64>,
    next_project_id: u64,
    languages: HashMap<String, u64>,
    next_language_id: u64,

    files: HashMap<(u64, String), FileRecord>,
    symbols: HashMap<u64, UniversalSymbol>,
    by_qualified_name: HashMap<(u64, String), u64>,
    relationships: HashMap<(u64, u64, u64, crate::types::RelationshipType), UniversalRelationship>,
    patterns: Vec<DetectedPattern>,
}

impl InMemorySymbolStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SymbolStore for InMemorySymbolStore {
    async fn upsert_project(&self, name: &str, _root_path: &str) -> Result<u64> {
        let mut inner = self.inner.write();
        if let Some(id) = inner.projects.get(name) {
            return Ok(*id);
        }
        inner.next_project_id += 1;
        let id = inner.next_project_id;
        inner.projects.insert(name.to_string(), id);
        Ok(id)
    }

    async fn upsert_language(&self, name: &str) -> Result<u64> {
        let mut inner = self.inner.write();
        if let Some(id) = inner.languages.get(name) {
            return Ok(*id);
        }
        inner.next_language_id += 1;
        let id = inner.next_language_id;
        inner.languages.insert(name.to_string(), id);
        Ok(id)
    }

    async fn get_file_record(&self, project_id: u64, file_path: &str) -> Result<Option<FileRecord>> {
        Ok(self.inner.read().files.get(&(project_id, file_path.to_string())).cloned())
    }

    async fn upsert_file_record(&self, mut record: FileRecord) -> Result<()> {
        record.last_parsed = record.last_parsed.or(Some(Utc::now()));
        let mut inner = self.inner.write();
        inner.files.insert((record.project_id, record.file_path.clone()), record);
        Ok(())
    }

    async fn list_file_paths(&self, project_id: u64) -> Result<Vec<String>> {
        Ok(self
            .inner
            .read()
            .files
            .keys()
            .filter(|(pid, _)| *pid == project_id)
            .map(|(_, path)| path.clone())
            .collect())
    }

    async fn delete_file(&self, project_id: u64, file_path: &str) -> Result<()> {
        let mut inner = self.inner.write();
        inner.files.remove(&(project_id, file_path.to_string()));
        clear_file_symbols_locked(&mut inner, project_id, file_path);
        Ok(())
    }

    async fn next_symbol_id(&self) -> u64 {
        self.ids.next_symbol_id()
    }

    async fn store_symbols(&self, symbols: Vec<UniversalSymbol>) -> Result<usize> {
        let mut inner = self.inner.write();
        let mut inserted = 0;
        for symbol in symbols {
            if !symbol.qualified_name.is_empty() {
                let key = (symbol.project_id, symbol.qualified_name.clone());
                if let Some(existing_id) = inner.by_qualified_name.get(&key).copied() {
                    if existing_id != symbol.id {
                        inner.symbols.remove(&existing_id);
                    }
                }
                inner.by_qualified_name.insert(key, symbol.id);
            }
            inner.symbols.insert(symbol.id, symbol);
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Clears every symbol belonging to `file_path` before a reparse, per
    /// the lifecycle rule: symbols whose file matches are replaced wholesale.
    async fn clear_file_symbols(&self, project_id: u64, file_path: &str) -> Result<()> {
        let mut inner = self.inner.write();
        clear_file_symbols_locked(&mut inner, project_id, file_path);
        Ok(())
    }

    async fn all_symbols(&self, project_id: u64) -> Result<Vec<UniversalSymbol>> {
        Ok(self
            .inner
            .read()
            .symbols
            .values()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn next_relationship_id(&self) -> u64 {
        self.ids.next_relationship_id()
    }

    /// `on conflict do nothing` on `(project, from, to, type)`: duplicates
    /// are silently swallowed, never overwrite the existing edge.
    async fn store_relationships(&self, relationships: Vec<UniversalRelationship>) -> Result<usize> {
        let mut inner = self.inner.write();
        let mut inserted = 0;
        for rel in relationships {
            let key = rel.dedup_key();
            if inner.relationships.contains_key(&key) {
                continue;
            }
            inner.relationships.insert(key, rel);
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn all_relationships(&self, project_id: u64) -> Result<Vec<UniversalRelationship>> {
        Ok(self
            .inner
            .read()
            .relationships
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn next_pattern_id(&self) -> u64 {
        self.ids.next_pattern_id()
    }

    async fn store_patterns(&self, patterns: Vec<DetectedPattern>) -> Result<usize> {
        let mut inner = self.inner.write();
        let count = patterns.len();
        inner.patterns.extend(patterns);
        Ok(count)
    }
}

fn clear_file_symbols_locked(inner: &mut Inner, project_id: u64, file_path: &str) {
    let doomed: Vec<u64> = inner
        .symbols
        .values()
        .filter(|s| s.project_id == project_id && s.file_path == file_path)
        .map(|s| s.id)
        .collect();
    for id in doomed {
        if let Some(sym) = inner.symbols.remove(&id) {
            inner.by_qualified_name.remove(&(project_id, sym.qualified_name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Language, SymbolKind};

    #[tokio::test]
    async fn project_upsert_is_idempotent_by_name() {
        let store = InMemorySymbolStore::new();
        let a = store.upsert_project("demo", "/tmp/demo").await.unwrap();
        let b = store.upsert_project("demo", "/tmp/demo").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn store_symbols_replaces_existing_qualified_name() {
        let store = InMemorySymbolStore::new();
        let project_id = store.upsert_project("demo", "/tmp").await.unwrap();
        let s1 = UniversalSymbol::new(1, project_id, Language::Rust, "f", "pkg::f", SymbolKind::Function, "a.rs", 1);
        store.store_symbols(vec![s1]).await.unwrap();
        let s2 = UniversalSymbol::new(2, project_id, Language::Rust, "f", "pkg::f", SymbolKind::Function, "a.rs", 5);
        store.store_symbols(vec![s2]).await.unwrap();

        let all = store.all_symbols(project_id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, 2);
    }

    #[tokio::test]
    async fn duplicate_relationships_are_dropped() {
        let store = InMemorySymbolStore::new();
        let project_id = store.upsert_project("demo", "/tmp").await.unwrap();
        let rel = UniversalRelationship::new(1, project_id, 10, 20, crate::types::RelationshipType::Calls);
        let inserted_first = store.store_relationships(vec![rel.clone()]).await.unwrap();
        let inserted_second = store.store_relationships(vec![rel]).await.unwrap();
        assert_eq!(inserted_first, 1);
        assert_eq!(inserted_second, 0);
        assert_eq!(store.all_relationships(project_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_file_symbols_removes_only_that_files_entries() {
        let store = InMemorySymbolStore::new();
        let project_id = store.upsert_project("demo", "/tmp").await.unwrap();
        let a = UniversalSymbol::new(1, project_id, Language::Rust, "a", "a::a", SymbolKind::Function, "a.rs", 1);
        let b = UniversalSymbol::new(2, project_id, Language::Rust, "b", "b::b", SymbolKind::Function, "b.rs", 1);
        store.store_symbols(vec![a, b]).await.unwrap();
        store.clear_file_symbols(project_id, "a.rs").await.unwrap();
        let remaining = store.all_symbols(project_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].file_path, "b.rs");
    }
}
