use crate::symbol_table::SymbolTable;
use codegraph_core::relationship::RelationshipInfo;
use codegraph_core::types::SymbolKind;

/// A scored candidate symbol for one unresolved call/use site. Scoring is
/// additive, not a strict ordered cascade: every applicable rule adds to
/// the base so a same-file unqualified function beats an exported method
/// in another file even though both pick up points from different rules.
#[derive(Debug, Clone, Copy)]
pub struct CallCandidate {
    pub symbol_id: u64,
    pub score: u32,
}

const BASE_SCORE: u32 = 100;
const EXPORTED_BONUS: u32 = 30;
const UNQUALIFIED_PREFERS_FUNCTION_BONUS: u32 = 20;
const QUALIFIED_PREFERS_METHOD_BONUS: u32 = 20;
const SAME_FILE_BONUS: u32 = 15;

/// Ranks every symbol sharing `info.to_name` and returns the winner, or
/// `None` if nothing in `table` matches by name at all (the caller then
/// falls back to fuzzy-pattern matching or synthesizes a virtual symbol).
pub fn resolve_call(info: &RelationshipInfo, table: &SymbolTable, current_file: &str) -> Option<CallCandidate> {
    let is_qualified = info.to_name.contains("::") || info.to_name.contains('.');

    if is_qualified {
        if let Some(id) = table.by_qualified_name(&info.to_name) {
            return Some(CallCandidate {
                symbol_id: id,
                score: BASE_SCORE + EXPORTED_BONUS,
            });
        }
    }

    let bare_name = info.to_name.rsplit(['.', ':']).next().unwrap_or(&info.to_name);
    let candidates = table.by_name(bare_name);
    if candidates.is_empty() {
        return None;
    }

    candidates
        .iter()
        .filter_map(|&id| {
            let sym = table.get(id)?;
            let mut score = BASE_SCORE;
            if sym.is_exported {
                score += EXPORTED_BONUS;
            }
            if !is_qualified && sym.kind == SymbolKind::Function {
                score += UNQUALIFIED_PREFERS_FUNCTION_BONUS;
            }
            if is_qualified && sym.kind == SymbolKind::Method {
                score += QUALIFIED_PREFERS_METHOD_BONUS;
            }
            if table.is_in_same_file_bucket(id, current_file) {
                score += SAME_FILE_BONUS;
            }
            Some(CallCandidate { symbol_id: id, score })
        })
        .max_by_key(|c| c.score)
}

/// Fuzzy fallback for two call shapes a pure name match misses: a
/// constructor call (`Foo(...)` resolving to a type named `Foo`) and an
/// implicit-`this`/`self` method call, where `to_name` is bare but the
/// caller's own enclosing type defines a same-named method.
pub fn resolve_fuzzy(info: &RelationshipInfo, table: &SymbolTable) -> Option<CallCandidate> {
    let candidates = table.by_name(&info.to_name);
    candidates.iter().find_map(|&id| {
        let sym = table.get(id)?;
        if matches!(sym.kind, SymbolKind::Class | SymbolKind::Struct) {
            Some(CallCandidate {
                symbol_id: id,
                score: BASE_SCORE,
            })
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol_table::SymbolTable;
    use codegraph_core::types::Language;
    use codegraph_core::symbol::UniversalSymbol;

    fn sym(id: u64, name: &str, qualified: &str, file: &str, kind: SymbolKind, exported: bool) -> UniversalSymbol {
        let mut s = UniversalSymbol::new(id, 1, Language::Rust, name, qualified, kind, file, 1);
        s.is_exported = exported;
        s
    }

    #[test]
    fn same_file_candidate_wins_over_exported_candidate_elsewhere() {
        let table = SymbolTable::build(vec![
            sym(1, "run", "other::run", "src/other.rs", SymbolKind::Function, true),
            sym(2, "run", "local::run", "src/local.rs", SymbolKind::Function, false),
        ]);
        let info = RelationshipInfo::new("caller", "run", codegraph_core::types::RelationshipType::Calls);
        let winner = resolve_call(&info, &table, "src/local.rs").unwrap();
        assert_eq!(winner.symbol_id, 2);
    }

    #[test]
    fn qualified_call_matches_exact_qualified_name_first() {
        let table = SymbolTable::build(vec![sym(
            1,
            "run",
            "mod_a::run",
            "src/a.rs",
            SymbolKind::Function,
            true,
        )]);
        let info = RelationshipInfo::new("caller", "mod_a::run", codegraph_core::types::RelationshipType::Calls);
        let winner = resolve_call(&info, &table, "src/a.rs").unwrap();
        assert_eq!(winner.symbol_id, 1);
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        let table = SymbolTable::build(vec![]);
        let info = RelationshipInfo::new("caller", "ghost", codegraph_core::types::RelationshipType::Calls);
        assert!(resolve_call(&info, &table, "src/a.rs").is_none());
    }
}
