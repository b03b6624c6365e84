use codegraph_core::ids::SymbolIdAllocator;
use codegraph_core::symbol::UniversalSymbol;
use codegraph_core::types::Language;

/// Step (a) of the resolver pipeline: one `file`-kind symbol per indexed
/// file, minted before binding so every `imports` edge always has a
/// concrete origin. `qualified_name` is the file path itself.
pub fn synthesize_file_symbols(allocator: &SymbolIdAllocator, project_id: u64, files: &[(String, Language)]) -> Vec<UniversalSymbol> {
    files
        .iter()
        .map(|(path, language)| {
            let id = allocator.next_symbol_id();
            UniversalSymbol::new_file_symbol(id, project_id, language.clone(), path)
        })
        .collect()
}

/// An import target not starting with `./`, `../` or `/` is external (a
/// registry/standard-library package rather than a sibling module).
pub fn is_external_import(target: &str) -> bool {
    !(target.starts_with("./") || target.starts_with("../") || target.starts_with('/'))
}
