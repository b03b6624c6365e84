use crate::bloom::NameBloomFilter;
use crate::context::ResolutionContext;
use crate::stats::CacheStats;
use codegraph_core::symbol::UniversalSymbol;
use codegraph_core::types::RelationshipType;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphEdgeKind {
    Calls,
    Inherits,
    Uses,
}

struct Inner {
    by_id: HashMap<u64, UniversalSymbol>,
    by_name: HashMap<String, Vec<u64>>,
    by_qualified_name: HashMap<String, u64>,
    by_file: HashMap<String, Vec<u64>>,
    by_namespace: HashMap<String, Vec<u64>>,

    callers: HashMap<u64, Vec<u64>>,
    callees: HashMap<u64, Vec<u64>>,
    inherit_parents: HashMap<u64, Vec<u64>>,
    inherit_children: HashMap<u64, Vec<u64>>,
    uses: HashMap<u64, Vec<u64>>,
    used_by: HashMap<u64, Vec<u64>>,

    name_bloom: NameBloomFilter,
    qualified_bloom: NameBloomFilter,

    stats: CacheStats,
    clock: u64,
}

/// Symbol Resolution Cache: a multi-index, bloom-filter-accelerated,
/// LRU-evicted in-memory store of [`UniversalSymbol`]s. Not a source of
/// truth — it is a read-side accelerator populated from (and allowed to lag)
/// the backing [`codegraph_core::traits::SymbolStore`].
pub struct SymbolResolutionCache {
    max_size: usize,
    inner: RwLock<Inner>,
}

impl SymbolResolutionCache {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            max_size,
            inner: RwLock::new(Inner {
                by_id: HashMap::new(),
                by_name: HashMap::new(),
                by_qualified_name: HashMap::new(),
                by_file: HashMap::new(),
                by_namespace: HashMap::new(),
                callers: HashMap::new(),
                callees: HashMap::new(),
                inherit_parents: HashMap::new(),
                inherit_children: HashMap::new(),
                uses: HashMap::new(),
                used_by: HashMap::new(),
                name_bloom: NameBloomFilter::new(max_size),
                qualified_bloom: NameBloomFilter::new(max_size),
                stats: CacheStats::default(),
                clock: 0,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.read().stats.clone()
    }

    /// Insert or replace a symbol. `access_count` is preserved across
    /// replacement of an existing id; all index entries for a replaced
    /// symbol are removed before the new entry is indexed.
    pub fn add(&self, symbol: UniversalSymbol) {
        let mut inner = self.inner.write();
        inner.insert_one(symbol);
        inner.stats.updates += 1;
        Self::evict_if_needed(&mut inner, self.max_size);
    }

    pub fn add_batch(&self, symbols: Vec<UniversalSymbol>) {
        let mut inner = self.inner.write();
        for symbol in symbols {
            inner.insert_one(symbol);
            inner.stats.updates += 1;
        }
        Self::evict_if_needed(&mut inner, self.max_size);
    }

    pub fn get_by_id(&self, id: u64) -> Option<UniversalSymbol> {
        let mut inner = self.inner.write();
        let found = inner.by_id.get(&id).cloned();
        Self::record_hit_or_miss(&mut inner, found.is_some());
        if let Some(sym) = inner.by_id.get_mut(&id) {
            sym.access_count += 1;
            sym.last_accessed = Self::tick(&mut inner.clock);
        }
        found
    }

    pub fn get_by_qualified_name(&self, qualified_name: &str) -> Option<UniversalSymbol> {
        let mut inner = self.inner.write();
        if !inner.qualified_bloom.might_contain(qualified_name) {
            inner.stats.misses += 1;
            return None;
        }
        let id = inner.by_qualified_name.get(qualified_name).copied();
        let found = id.and_then(|id| inner.by_id.get(&id).cloned());
        Self::record_hit_or_miss(&mut inner, found.is_some());
        if let Some(id) = id {
            if let Some(sym) = inner.by_id.get_mut(&id) {
                sym.access_count += 1;
                sym.last_accessed = Self::tick(&mut inner.clock);
            }
        }
        found
    }

    pub fn get_by_file(&self, file_path: &str) -> Vec<UniversalSymbol> {
        let inner = self.inner.read();
        inner
            .by_file
            .get(file_path)
            .map(|ids| ids.iter().filter_map(|id| inner.by_id.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    pub fn get_by_namespace(&self, namespace: &str) -> Vec<UniversalSymbol> {
        let inner = self.inner.read();
        inner
            .by_namespace
            .get(namespace)
            .map(|ids| ids.iter().filter_map(|id| inner.by_id.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    /// Strict 6-step resolution order:
    /// 1. Bloom filter miss => absent, no further probing.
    /// 2. `{current_namespace}::{name}`.
    /// 3. Each imported namespace, in order: `{ns}::{name}`.
    /// 4. Aliased qualified name via `type_aliases[name]`.
    /// 5. Bare-name matches, preferring one in `current_file`.
    /// 6. Any hit bumps `last_accessed`/`access_count`.
    pub fn resolve(&self, name: &str, context: &ResolutionContext) -> Option<UniversalSymbol> {
        let mut inner = self.inner.write();

        if !inner.name_bloom.might_contain(name) {
            inner.stats.misses += 1;
            return None;
        }

        if let Some(ns) = &context.current_namespace {
            let qn = format!("{ns}::{name}");
            if let Some(id) = inner.by_qualified_name.get(&qn).copied() {
                return Self::finish_resolve(&mut inner, id);
            }
        }

        for ns in &context.imported_namespaces {
            let qn = format!("{ns}::{name}");
            if let Some(id) = inner.by_qualified_name.get(&qn).copied() {
                return Self::finish_resolve(&mut inner, id);
            }
        }

        if let Some(aliased) = context.type_aliases.get(name) {
            if let Some(id) = inner.by_qualified_name.get(aliased).copied() {
                return Self::finish_resolve(&mut inner, id);
            }
        }

        if let Some(ids) = inner.by_name.get(name).cloned() {
            if !ids.is_empty() {
                let chosen = context
                    .current_file
                    .as_ref()
                    .and_then(|file| ids.iter().find(|id| inner.by_id.get(id).map(|s| &s.file_path) == Some(file)))
                    .copied()
                    .unwrap_or(ids[0]);
                return Self::finish_resolve(&mut inner, chosen);
            }
        }

        inner.stats.misses += 1;
        None
    }

    fn finish_resolve(inner: &mut Inner, id: u64) -> Option<UniversalSymbol> {
        inner.stats.hits += 1;
        let tick = Self::tick(&mut inner.clock);
        if let Some(sym) = inner.by_id.get_mut(&id) {
            sym.access_count += 1;
            sym.last_accessed = tick;
            return Some(sym.clone());
        }
        None
    }

    pub fn callers(&self, id: u64) -> Vec<u64> {
        self.inner.read().callers.get(&id).cloned().unwrap_or_default()
    }

    pub fn callees(&self, id: u64) -> Vec<u64> {
        self.inner.read().callees.get(&id).cloned().unwrap_or_default()
    }

    pub fn inheritance(&self, id: u64) -> (Vec<u64>, Vec<u64>) {
        let inner = self.inner.read();
        (
            inner.inherit_parents.get(&id).cloned().unwrap_or_default(),
            inner.inherit_children.get(&id).cloned().unwrap_or_default(),
        )
    }

    pub fn add_relationship(&self, from: u64, to: u64, kind: GraphEdgeKind) {
        let mut inner = self.inner.write();
        match kind {
            GraphEdgeKind::Calls => {
                push_unique(inner.callees.entry(from).or_default(), to);
                push_unique(inner.callers.entry(to).or_default(), from);
            }
            GraphEdgeKind::Inherits => {
                push_unique(inner.inherit_parents.entry(from).or_default(), to);
                push_unique(inner.inherit_children.entry(to).or_default(), from);
            }
            GraphEdgeKind::Uses => {
                push_unique(inner.uses.entry(from).or_default(), to);
                push_unique(inner.used_by.entry(to).or_default(), from);
            }
        }
    }

    /// Remove every symbol belonging to `file_path` from the primary store
    /// and every index. Bloom filters are left as-is: stale bits only ever
    /// cause future false positives, never false negatives.
    pub fn clear_file(&self, file_path: &str) {
        let mut inner = self.inner.write();
        let ids = inner.by_file.remove(file_path).unwrap_or_default();
        debug!(file = file_path, removed = ids.len(), "cache: cleared file");
        for id in ids {
            if let Some(sym) = inner.by_id.remove(&id) {
                remove_from_index(&mut inner.by_name, &sym.name, id);
                inner.by_qualified_name.remove(&sym.qualified_name);
                if let Some(ns) = &sym.namespace {
                    remove_from_index(&mut inner.by_namespace, ns, id);
                }
            }
            inner.callers.remove(&id);
            inner.callees.remove(&id);
            inner.inherit_parents.remove(&id);
            inner.inherit_children.remove(&id);
            inner.uses.remove(&id);
            inner.used_by.remove(&id);
        }
    }

    pub fn clear(&self) {
        debug!("cache: clearing all entries");
        let mut inner = self.inner.write();
        inner.by_id.clear();
        inner.by_name.clear();
        inner.by_qualified_name.clear();
        inner.by_file.clear();
        inner.by_namespace.clear();
        inner.callers.clear();
        inner.callees.clear();
        inner.inherit_parents.clear();
        inner.inherit_children.clear();
        inner.uses.clear();
        inner.used_by.clear();
        inner.name_bloom = NameBloomFilter::new(self.max_size);
        inner.qualified_bloom = NameBloomFilter::new(self.max_size);
        inner.stats = CacheStats::default();
    }

    fn tick(clock: &mut u64) -> u64 {
        *clock += 1;
        *clock
    }

    fn record_hit_or_miss(inner: &mut Inner, hit: bool) {
        if hit {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
    }

    /// Evict `max(1, floor(max_size * 0.1))` entries sorted by
    /// `(access_count ASC, last_accessed ASC)` whenever size exceeds
    /// `max_size`.
    fn evict_if_needed(inner: &mut Inner, max_size: usize) {
        if inner.by_id.len() <= max_size {
            return;
        }
        let victim_count = ((max_size as f64) * 0.1).floor().max(1.0) as usize;
        trace!(size = inner.by_id.len(), max_size, victim_count, "cache: evicting");
        let mut candidates: Vec<(u64, u64, u64)> = inner
            .by_id
            .values()
            .map(|s| (s.id, s.access_count, s.last_accessed))
            .collect();
        candidates.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.cmp(&b.2)));

        for (id, _, _) in candidates.into_iter().take(victim_count) {
            if let Some(sym) = inner.by_id.remove(&id) {
                remove_from_index(&mut inner.by_name, &sym.name, id);
                inner.by_qualified_name.remove(&sym.qualified_name);
                if let Some(file_ids) = inner.by_file.get_mut(&sym.file_path) {
                    file_ids.retain(|x| *x != id);
                }
                if let Some(ns) = &sym.namespace {
                    remove_from_index(&mut inner.by_namespace, ns, id);
                }
                inner.stats.evictions += 1;
            }
        }
    }
}

impl Inner {
    fn insert_one(&mut self, mut symbol: UniversalSymbol) {
        let id = symbol.id;
        // Preserve access_count across replacement of an existing entry.
        if let Some(existing) = self.by_id.get(&id) {
            symbol.access_count = existing.access_count;
            remove_from_index(&mut self.by_name, &existing.name, id);
            self.by_qualified_name.remove(&existing.qualified_name);
            if let Some(file_ids) = self.by_file.get_mut(&existing.file_path) {
                file_ids.retain(|x| *x != id);
            }
            if let Some(ns) = &existing.namespace {
                remove_from_index(&mut self.by_namespace, ns, id);
            }
        }

        self.name_bloom.insert(&symbol.name);
        if !symbol.qualified_name.is_empty() {
            self.qualified_bloom.insert(&symbol.qualified_name);
            self.by_qualified_name.insert(symbol.qualified_name.clone(), id);
        }
        push_unique(self.by_name.entry(symbol.name.clone()).or_default(), id);
        push_unique(self.by_file.entry(symbol.file_path.clone()).or_default(), id);
        if let Some(ns) = &symbol.namespace {
            push_unique(self.by_namespace.entry(ns.clone()).or_default(), id);
        }

        self.by_id.insert(id, symbol);
    }
}

fn push_unique(vec: &mut Vec<u64>, id: u64) {
    if !vec.contains(&id) {
        vec.push(id);
    }
}

fn remove_from_index(index: &mut HashMap<String, Vec<u64>>, key: &str, id: u64) {
    if let Some(ids) = index.get_mut(key) {
        ids.retain(|x| *x != id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

/// Convenience constructor bridging the universal model's `RelationshipType`
/// onto the cache's narrower graph-edge vocabulary (`uses`/`imports`/etc. are
/// not graph-traversal edges the cache indexes; only calls/inherits/uses are).
pub fn graph_edge_kind_for(relationship_type: RelationshipType) -> Option<GraphEdgeKind> {
    match relationship_type {
        RelationshipType::Calls => Some(GraphEdgeKind::Calls),
        RelationshipType::Inherits => Some(GraphEdgeKind::Inherits),
        RelationshipType::Uses => Some(GraphEdgeKind::Uses),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::types::{Language, SymbolKind};

    fn sym(id: u64, name: &str, file: &str) -> UniversalSymbol {
        UniversalSymbol::new(id, 1, Language::Rust, name, format!("pkg::{name}"), SymbolKind::Function, file, 1)
    }

    #[test]
    fn bloom_filter_negative_lookup_short_circuits_resolve() {
        let cache = SymbolResolutionCache::new(100);
        cache.add(sym(1, "alpha", "a.rs"));
        cache.add(sym(2, "beta", "a.rs"));
        cache.add(sym(3, "gamma", "a.rs"));

        let ctx = ResolutionContext::new();
        assert!(cache.resolve("zzz", &ctx).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn resolve_prefers_symbol_in_current_file_for_bare_name_matches() {
        let cache = SymbolResolutionCache::new(100);
        cache.add(sym(1, "helper", "a.rs"));
        cache.add(sym(2, "helper", "b.rs"));

        let ctx = ResolutionContext::new().with_current_file("b.rs");
        let resolved = cache.resolve("helper", &ctx).unwrap();
        assert_eq!(resolved.id, 2);
    }

    #[test]
    fn eviction_removes_exact_count_sorted_by_access_then_recency() {
        let cache = SymbolResolutionCache::new(10);
        for i in 1..=10u64 {
            cache.add(sym(i, &format!("sym{i}"), "a.rs"));
        }
        // Bump access_count for symbols 1..=5 by reading them.
        for i in 1..=5u64 {
            cache.get_by_id(i);
        }
        cache.add(sym(11, "sym11", "a.rs"));

        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.len(), 10);
        for i in 1..=5u64 {
            assert!(cache.get_by_id(i).is_some(), "symbol {i} should survive eviction");
        }
    }

    #[test]
    fn access_count_is_preserved_across_replacement() {
        let cache = SymbolResolutionCache::new(100);
        cache.add(sym(1, "alpha", "a.rs"));
        cache.get_by_id(1);
        cache.get_by_id(1);
        cache.add(sym(1, "alpha", "a.rs"));
        let replaced = cache.get_by_id(1).unwrap();
        assert!(replaced.access_count >= 2);
    }

    #[test]
    fn clear_file_removes_only_that_files_symbols() {
        let cache = SymbolResolutionCache::new(100);
        cache.add(sym(1, "alpha", "a.rs"));
        cache.add(sym(2, "beta", "b.rs"));
        cache.clear_file("a.rs");
        assert!(cache.get_by_id(1).is_none());
        assert!(cache.get_by_id(2).is_some());
    }
}
