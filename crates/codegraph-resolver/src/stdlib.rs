use codegraph_core::ids::SymbolIdAllocator;
use codegraph_core::symbol::UniversalSymbol;
use codegraph_core::types::Language;

/// Common standard-library call targets, pre-registered as virtual symbols
/// at resolver construction so calls like `println!`/`print`/`len` resolve
/// to a stable sentinel instead of falling through to a synthesized
/// per-call external symbol every time. Deliberately small: it exists to
/// keep resolve output deterministic for the handful of names every project
/// calls, not to model a language's full standard library.
const SENTINELS: &[(&str, Language)] = &[
    ("println", Language::Rust),
    ("print", Language::Rust),
    ("format", Language::Rust),
    ("len", Language::Rust),
    ("print", Language::Python),
    ("len", Language::Python),
    ("range", Language::Python),
    ("console.log", Language::JavaScript),
    ("JSON.stringify", Language::JavaScript),
];

pub fn seed_sentinels(allocator: &SymbolIdAllocator, project_id: u64) -> Vec<UniversalSymbol> {
    SENTINELS
        .iter()
        .map(|(name, language)| {
            let id = allocator.next_symbol_id();
            UniversalSymbol::new_module_symbol(id, project_id, language.clone(), name, true)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_produces_one_symbol_per_sentinel_for_the_given_project() {
        let allocator = SymbolIdAllocator::new();
        let seeded = seed_sentinels(&allocator, 7);
        assert_eq!(seeded.len(), SENTINELS.len());
        assert!(seeded.iter().all(|s| s.project_id == 7 && s.is_exported));
    }
}
