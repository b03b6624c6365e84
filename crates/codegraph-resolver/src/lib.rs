pub mod resolution;
pub mod stdlib;
pub mod symbol_table;
pub mod virtual_symbols;

use codegraph_core::ids::SymbolIdAllocator;
use codegraph_core::relationship::{RelationshipInfo, UniversalRelationship};
use codegraph_core::symbol::UniversalSymbol;
use codegraph_core::types::{Language, RelationshipType};
use resolution::{resolve_call, resolve_fuzzy};
use std::collections::{HashMap, HashSet};
use symbol_table::SymbolTable;
use tracing::debug;

pub use resolution::CallCandidate;
pub use symbol_table::bare_file_stem;
pub use virtual_symbols::{is_external_import, synthesize_file_symbols};

/// One unresolved relationship paired with the file it was emitted from —
/// parser adapters don't know a symbol's id, only the file they parsed.
pub struct PendingRelationship {
    pub file_path: String,
    pub language: Language,
    pub info: RelationshipInfo,
}

pub struct ResolveOutcome {
    pub relationships: Vec<UniversalRelationship>,
    /// Virtual symbols minted for call/use targets that matched nothing in
    /// `table` — callers to an unindexed dependency, for example. The
    /// orchestrator persists these alongside the project's real symbols so
    /// every relationship still has a concrete endpoint.
    pub synthesized_symbols: Vec<UniversalSymbol>,
}

/// Resolves parser-emitted [`RelationshipInfo`] into concrete
/// [`UniversalRelationship`] edges between symbol ids, following the
/// multi-strategy scored lookup in [`resolution`] with a fuzzy-pattern and
/// virtual-synthesis fallback chain so every call site ends in an edge.
#[derive(Default)]
pub struct RelationshipResolver;

impl RelationshipResolver {
    pub fn new() -> Self {
        Self
    }

    /// Standard-library sentinel symbols to seed into a project's symbol
    /// set before this resolver's first run (the resolved Open Question:
    /// pre-populate once at construction rather than lazily per-miss).
    pub fn seed_symbols(&self, allocator: &SymbolIdAllocator, project_id: u64) -> Vec<UniversalSymbol> {
        stdlib::seed_sentinels(allocator, project_id)
    }

    pub fn resolve(
        &self,
        project_id: u64,
        allocator: &SymbolIdAllocator,
        table: &SymbolTable,
        pending: &[PendingRelationship],
    ) -> ResolveOutcome {
        let mut relationships = Vec::with_capacity(pending.len());
        let mut synthesized = Vec::new();
        let mut seen = HashSet::new();
        // Dedupes repeated imports of the same external target (e.g. ten
        // files all `import "react"`) within this one resolve pass.
        let mut synthesized_modules: HashMap<String, u64> = HashMap::new();

        for item in pending {
            let Some(from_id) = resolve_endpoint_in_file(&item.info.from_name, table, &item.file_path) else {
                continue;
            };

            let to_id = match item.info.relationship_type {
                RelationshipType::Imports => self.resolve_import(
                    project_id,
                    allocator,
                    table,
                    item,
                    &mut synthesized_modules,
                    &mut synthesized,
                ),
                RelationshipType::ReadsField | RelationshipType::WritesField | RelationshipType::InitializesField => {
                    // Field/member heuristic: resolution misses here are
                    // silently dropped (no synthesis) per the error taxonomy
                    // — an unindexed field isn't a concrete endpoint worth
                    // inventing.
                    match resolve_field(&item.info.to_name, table) {
                        Some(id) => id,
                        None => continue,
                    }
                }
                _ => resolve_call(&item.info, table, &item.file_path)
                    .map(|c| c.symbol_id)
                    .or_else(|| resolve_fuzzy(&item.info, table).map(|c| c.symbol_id))
                    .unwrap_or_else(|| {
                        let id = allocator.next_symbol_id();
                        let sym = UniversalSymbol::new_module_symbol(id, project_id, item.language.clone(), &item.info.to_name, true);
                        synthesized.push(sym);
                        id
                    }),
            };

            let mut rel = UniversalRelationship::new(
                allocator.next_relationship_id(),
                project_id,
                from_id,
                to_id,
                item.info.relationship_type,
            )
            .with_confidence(item.info.confidence);
            rel.context_line = item.info.line;
            rel.context_snippet = item.info.source_text.clone();
            if item.info.cross_language {
                if let Some(bridge) = &item.info.bridge_type {
                    rel.metadata.insert("bridge_type".to_string(), bridge.clone());
                }
            }

            if seen.insert(rel.dedup_key()) {
                relationships.push(rel);
            }
        }

        debug!(
            pending = pending.len(),
            resolved = relationships.len(),
            synthesized = synthesized.len(),
            "relationship resolution pass complete"
        );

        ResolveOutcome {
            relationships,
            synthesized_symbols: synthesized,
        }
    }

    /// Step (c): bind an `imports` edge's target to the `file` symbol of a
    /// sibling source file already in `table`, or else to a `module`/
    /// `external_module` virtual symbol — minted once per distinct target
    /// name per resolve pass and reused across every importing file.
    #[allow(clippy::too_many_arguments)]
    fn resolve_import(
        &self,
        project_id: u64,
        allocator: &SymbolIdAllocator,
        table: &SymbolTable,
        item: &PendingRelationship,
        synthesized_modules: &mut HashMap<String, u64>,
        synthesized: &mut Vec<UniversalSymbol>,
    ) -> u64 {
        let target = &item.info.to_name;
        if let Some(id) = table.by_qualified_name(target) {
            return id;
        }
        if let Some(&id) = synthesized_modules.get(target) {
            return id;
        }
        let id = allocator.next_symbol_id();
        let external = is_external_import(target);
        let sym = UniversalSymbol::new_module_symbol(id, project_id, item.language.clone(), target, external);
        synthesized_modules.insert(target.clone(), id);
        synthesized.push(sym);
        id
    }
}

/// Step (d)(2): field/member heuristic. Strips `to_name` to its last
/// `.`-separated segment and looks for any indexed `field`-kind symbol
/// whose qualified name ends with `::{member}`.
fn resolve_field(to_name: &str, table: &SymbolTable) -> Option<u64> {
    let member = to_name.rsplit('.').next().unwrap_or(to_name);
    table.fields_matching_member(member).into_iter().next()
}

/// Resolves a relationship's origin endpoint: always prefers a definition
/// in `file_path` since a parser only ever reports call sites from within
/// the file it parsed. Falls back to an exact qualified-name match, then to
/// any same-named symbol project-wide (best effort) before giving up.
fn resolve_endpoint_in_file(name: &str, table: &SymbolTable, file_path: &str) -> Option<u64> {
    let bare_name = name.rsplit(['.', ':']).next().unwrap_or(name);
    let local = table
        .by_name(bare_name)
        .iter()
        .find(|&&id| table.is_in_same_file_bucket(id, file_path))
        .copied();
    local
        .or_else(|| table.by_qualified_name(name))
        .or_else(|| table.by_name(bare_name).first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::types::{RelationshipType, SymbolKind};

    fn sym(id: u64, name: &str, qualified: &str, file: &str, kind: SymbolKind, exported: bool) -> UniversalSymbol {
        let mut s = UniversalSymbol::new(id, 1, Language::Rust, name, qualified, kind, file, 1);
        s.is_exported = exported;
        s
    }

    #[test]
    fn cross_file_call_resolves_to_the_exported_definition() {
        let table = SymbolTable::build(vec![
            sym(1, "main", "app::main", "src/main.rs", SymbolKind::Function, true),
            sym(2, "helper", "lib::helper", "src/lib.rs", SymbolKind::Function, true),
        ]);
        let allocator = SymbolIdAllocator::new();
        let pending = vec![PendingRelationship {
            file_path: "src/main.rs".to_string(),
            language: Language::Rust,
            info: RelationshipInfo::new("main", "helper", RelationshipType::Calls),
        }];

        let resolver = RelationshipResolver::new();
        let outcome = resolver.resolve(1, &allocator, &table, &pending);
        assert_eq!(outcome.relationships.len(), 1);
        assert_eq!(outcome.relationships[0].from_symbol_id, 1);
        assert_eq!(outcome.relationships[0].to_symbol_id, 2);
        assert!(outcome.synthesized_symbols.is_empty());
    }

    #[test]
    fn unresolvable_call_target_synthesizes_a_virtual_symbol() {
        let table = SymbolTable::build(vec![sym(1, "main", "app::main", "src/main.rs", SymbolKind::Function, true)]);
        let allocator = SymbolIdAllocator::new();
        let pending = vec![PendingRelationship {
            file_path: "src/main.rs".to_string(),
            language: Language::Rust,
            info: RelationshipInfo::new("main", "external_lib_fn", RelationshipType::Calls),
        }];

        let resolver = RelationshipResolver::new();
        let outcome = resolver.resolve(1, &allocator, &table, &pending);
        assert_eq!(outcome.relationships.len(), 1);
        assert_eq!(outcome.synthesized_symbols.len(), 1);
        assert_eq!(outcome.synthesized_symbols[0].name, "external_lib_fn");
    }

    #[test]
    fn duplicate_pending_relationships_are_dropped_after_the_first() {
        let table = SymbolTable::build(vec![
            sym(1, "main", "app::main", "src/main.rs", SymbolKind::Function, true),
            sym(2, "helper", "lib::helper", "src/lib.rs", SymbolKind::Function, true),
        ]);
        let allocator = SymbolIdAllocator::new();
        let pending = vec![
            PendingRelationship {
                file_path: "src/main.rs".to_string(),
                language: Language::Rust,
                info: RelationshipInfo::new("main", "helper", RelationshipType::Calls),
            },
            PendingRelationship {
                file_path: "src/main.rs".to_string(),
                language: Language::Rust,
                info: RelationshipInfo::new("main", "helper", RelationshipType::Calls),
            },
        ];

        let resolver = RelationshipResolver::new();
        let outcome = resolver.resolve(1, &allocator, &table, &pending);
        assert_eq!(outcome.relationships.len(), 1);
    }

    #[test]
    fn cross_language_spawn_relationship_records_bridge_type() {
        let table = SymbolTable::build(vec![sym(
            1,
            "orchestrate",
            "app::orchestrate",
            "src/app.ts",
            SymbolKind::Function,
            true,
        )]);
        let allocator = SymbolIdAllocator::new();
        let mut info = RelationshipInfo::new("orchestrate", "worker.py", RelationshipType::Spawns);
        info.cross_language = true;
        info.bridge_type = Some("subprocess".to_string());
        let pending = vec![PendingRelationship {
            file_path: "src/app.ts".to_string(),
            language: Language::TypeScript,
            info,
        }];

        let resolver = RelationshipResolver::new();
        let outcome = resolver.resolve(1, &allocator, &table, &pending);
        assert_eq!(outcome.relationships.len(), 1);
        assert_eq!(
            outcome.relationships[0].metadata.get("bridge_type").map(String::as_str),
            Some("subprocess")
        );
    }

    #[test]
    fn import_of_sibling_file_binds_to_its_file_symbol() {
        let allocator = SymbolIdAllocator::new();
        let file_symbols = synthesize_file_symbols(
            &allocator,
            1,
            &[("a.ts".to_string(), Language::TypeScript), ("b.ts".to_string(), Language::TypeScript)],
        );
        let table = SymbolTable::build(file_symbols);
        let pending = vec![PendingRelationship {
            file_path: "a.ts".to_string(),
            language: Language::TypeScript,
            info: RelationshipInfo::new("a.ts", "./b", RelationshipType::Imports),
        }];

        // "./b" won't exact-match "b.ts"; this exercises the external/virtual
        // module fallback path instead, since sibling-path normalization is
        // left to the parser adapter.
        let resolver = RelationshipResolver::new();
        let outcome = resolver.resolve(1, &allocator, &table, &pending);
        assert_eq!(outcome.relationships.len(), 1);
        assert_eq!(outcome.synthesized_symbols.len(), 1);
        assert_eq!(outcome.synthesized_symbols[0].kind, SymbolKind::Module);
    }

    #[test]
    fn external_import_target_synthesizes_external_module_symbol() {
        let allocator = SymbolIdAllocator::new();
        let file_symbols = synthesize_file_symbols(&allocator, 1, &[("a.ts".to_string(), Language::TypeScript)]);
        let table = SymbolTable::build(file_symbols);
        let pending = vec![PendingRelationship {
            file_path: "a.ts".to_string(),
            language: Language::TypeScript,
            info: RelationshipInfo::new("a.ts", "react", RelationshipType::Imports),
        }];

        let resolver = RelationshipResolver::new();
        let outcome = resolver.resolve(1, &allocator, &table, &pending);
        assert_eq!(outcome.synthesized_symbols.len(), 1);
        assert_eq!(outcome.synthesized_symbols[0].kind, SymbolKind::ExternalModule);
    }

    #[test]
    fn repeated_imports_of_the_same_target_share_one_synthesized_symbol() {
        let allocator = SymbolIdAllocator::new();
        let file_symbols = synthesize_file_symbols(
            &allocator,
            1,
            &[("a.ts".to_string(), Language::TypeScript), ("b.ts".to_string(), Language::TypeScript)],
        );
        let table = SymbolTable::build(file_symbols);
        let pending = vec![
            PendingRelationship {
                file_path: "a.ts".to_string(),
                language: Language::TypeScript,
                info: RelationshipInfo::new("a.ts", "react", RelationshipType::Imports),
            },
            PendingRelationship {
                file_path: "b.ts".to_string(),
                language: Language::TypeScript,
                info: RelationshipInfo::new("b.ts", "react", RelationshipType::Imports),
            },
        ];

        let resolver = RelationshipResolver::new();
        let outcome = resolver.resolve(1, &allocator, &table, &pending);
        assert_eq!(outcome.relationships.len(), 2);
        assert_eq!(outcome.synthesized_symbols.len(), 1, "both imports should reuse one module symbol");
    }

    #[test]
    fn field_write_binds_to_matching_field_symbol_by_member_name() {
        let allocator = SymbolIdAllocator::new();
        let table = SymbolTable::build(vec![
            sym(1, "name", "User::name", "user.rs", SymbolKind::Field, false),
            sym(2, "set_name", "User::set_name", "user.rs", SymbolKind::Method, true),
        ]);
        let pending = vec![PendingRelationship {
            file_path: "user.rs".to_string(),
            language: Language::Rust,
            info: RelationshipInfo::new("set_name", "self.name", RelationshipType::WritesField),
        }];

        let resolver = RelationshipResolver::new();
        let outcome = resolver.resolve(1, &allocator, &table, &pending);
        assert_eq!(outcome.relationships.len(), 1);
        assert_eq!(outcome.relationships[0].to_symbol_id, 1);
        assert!(outcome.synthesized_symbols.is_empty(), "field resolution never synthesizes");
    }

    #[test]
    fn unmatched_field_reference_is_silently_dropped() {
        let table = SymbolTable::build(vec![sym(1, "main", "app::main", "a.rs", SymbolKind::Function, true)]);
        let allocator = SymbolIdAllocator::new();
        let pending = vec![PendingRelationship {
            file_path: "a.rs".to_string(),
            language: Language::Rust,
            info: RelationshipInfo::new("main", "ghost.missing_field", RelationshipType::ReadsField),
        }];

        let resolver = RelationshipResolver::new();
        let outcome = resolver.resolve(1, &allocator, &table, &pending);
        assert!(outcome.relationships.is_empty());
        assert!(outcome.synthesized_symbols.is_empty());
    }
}
