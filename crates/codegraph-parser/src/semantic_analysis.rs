use codegraph_core::ids::SymbolIdAllocator;
use codegraph_core::pattern::DetectedPattern;
use codegraph_core::relationship::UniversalRelationship;
use codegraph_core::symbol::UniversalSymbol;
use codegraph_core::types::{RelationshipType, SymbolKind, Visibility};
use std::collections::{HashMap, HashSet};

/// Member count above which a class is flagged as a god object.
pub const GOD_OBJECT_THRESHOLD: usize = 40;
/// Complexity above which a function counts toward a project's
/// high-complexity tally.
pub const HIGH_COMPLEXITY_THRESHOLD: f32 = 10.0;

const SINGLETON_ACCESSOR_NAMES: &[&str] = &["instance", "get_instance", "shared"];
const CONSTRUCTOR_NAMES: &[&str] = &["new", "init", "constructor", "__init__"];

/// Result of one phase-6 pass: edges and patterns derived from the already
/// resolved symbol/relationship graph, plus a project-wide complexity
/// summary. Never aborts the run; per-detector failures land in `errors`.
pub struct SemanticOutcome {
    pub derived_relationships: Vec<UniversalRelationship>,
    pub patterns: Vec<DetectedPattern>,
    pub errors: Vec<String>,
    pub complexity_summary: ComplexitySummary,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ComplexitySummary {
    pub mean: f32,
    pub max: f32,
    pub high_complexity_count: usize,
    pub sampled: usize,
}

/// Entry point for phase 6. `symbols`/`relationships` are the fully resolved,
/// stored sets for the project — this never touches parser-emitted data, it
/// only adds derived edges and patterns on top.
pub fn analyze(
    ids: &SymbolIdAllocator,
    project_id: u64,
    symbols: &[UniversalSymbol],
    relationships: &[UniversalRelationship],
    enable_semantic_analysis: bool,
    enable_pattern_detection: bool,
) -> SemanticOutcome {
    let mut derived_relationships = Vec::new();
    let mut patterns = Vec::new();
    let mut errors = Vec::new();

    if enable_semantic_analysis {
        derived_relationships.extend(discover_overrides(ids, project_id, symbols, relationships));
        derived_relationships.extend(infer_data_flow(ids, project_id, relationships));
    }

    if enable_pattern_detection {
        let members_by_class = group_members_by_class(symbols);
        match detect_singletons(ids, project_id, symbols, &members_by_class) {
            Ok(found) => patterns.extend(found),
            Err(e) => errors.push(format!("singleton detection: {e}")),
        }
        match detect_factories(ids, project_id, symbols, relationships) {
            Ok(found) => patterns.extend(found),
            Err(e) => errors.push(format!("factory detection: {e}")),
        }
        match detect_god_objects(ids, project_id, symbols, &members_by_class) {
            Ok(found) => patterns.extend(found),
            Err(e) => errors.push(format!("god object detection: {e}")),
        }
    }

    let complexity_summary = aggregate_complexity(symbols);

    SemanticOutcome {
        derived_relationships,
        patterns,
        errors,
        complexity_summary,
    }
}

/// For every `inherits` edge `(child, parent)`, match child methods against
/// parent methods by bare name and parenthesized-arity, emitting an
/// `overrides` edge per match. Heuristic — there's no type system behind it.
fn discover_overrides(ids: &SymbolIdAllocator, project_id: u64, symbols: &[UniversalSymbol], relationships: &[UniversalRelationship]) -> Vec<UniversalRelationship> {
    let members_by_class = group_members_by_class(symbols);
    let mut derived = Vec::new();

    for rel in relationships.iter().filter(|r| r.relationship_type == RelationshipType::Inherits) {
        let Some(child_members) = members_by_class.get(&rel.from_symbol_id) else { continue };
        let Some(parent_members) = members_by_class.get(&rel.to_symbol_id) else { continue };

        for child_method in child_members.iter().filter(|m| m.kind.is_callable()) {
            for parent_method in parent_members.iter().filter(|m| m.kind.is_callable()) {
                if child_method.name != parent_method.name {
                    continue;
                }
                if arity(&child_method.signature) != arity(&parent_method.signature) {
                    continue;
                }
                derived.push(
                    UniversalRelationship::new(ids.next_relationship_id(), project_id, child_method.id, parent_method.id, RelationshipType::Overrides)
                        .with_confidence(0.7),
                );
            }
        }
    }

    derived
}

/// For every field written by one caller and read by another, emit a
/// `data_flow` edge writer -> reader with `confidence = 0.5`. Self-pairs
/// (a caller reading back what it just wrote) aren't data flow and are
/// skipped.
fn infer_data_flow(ids: &SymbolIdAllocator, project_id: u64, relationships: &[UniversalRelationship]) -> Vec<UniversalRelationship> {
    let mut writers_by_field: HashMap<u64, HashSet<u64>> = HashMap::new();
    let mut readers_by_field: HashMap<u64, HashSet<u64>> = HashMap::new();

    for rel in relationships {
        match rel.relationship_type {
            RelationshipType::WritesField => {
                writers_by_field.entry(rel.to_symbol_id).or_default().insert(rel.from_symbol_id);
            }
            RelationshipType::ReadsField => {
                readers_by_field.entry(rel.to_symbol_id).or_default().insert(rel.from_symbol_id);
            }
            _ => {}
        }
    }

    let mut seen = HashSet::new();
    let mut derived = Vec::new();
    for (field_id, writers) in &writers_by_field {
        let Some(readers) = readers_by_field.get(field_id) else { continue };
        for &writer in writers {
            for &reader in readers {
                if writer == reader || !seen.insert((writer, reader, *field_id)) {
                    continue;
                }
                let mut edge = UniversalRelationship::new(ids.next_relationship_id(), project_id, writer, reader, RelationshipType::DataFlow)
                    .with_confidence(0.5);
                edge.metadata.insert("via_field".to_string(), field_id.to_string());
                derived.push(edge);
            }
        }
    }
    derived
}

/// Singleton: a class exposing a static-style accessor (`instance`,
/// `get_instance`, `shared`) alongside a non-public constructor-like member.
fn detect_singletons(
    ids: &SymbolIdAllocator,
    project_id: u64,
    symbols: &[UniversalSymbol],
    members_by_class: &HashMap<u64, Vec<&UniversalSymbol>>,
) -> Result<Vec<DetectedPattern>, String> {
    let mut found = Vec::new();
    for class in symbols.iter().filter(|s| matches!(s.kind, SymbolKind::Class | SymbolKind::Struct)) {
        let Some(members) = members_by_class.get(&class.id) else { continue };
        let accessor = members
            .iter()
            .find(|m| m.kind.is_callable() && SINGLETON_ACCESSOR_NAMES.contains(&m.name.as_str()));
        let ctor = members
            .iter()
            .find(|m| m.kind.is_callable() && m.visibility != Visibility::Public && CONSTRUCTOR_NAMES.contains(&m.name.as_str()));
        if let (Some(accessor), Some(ctor)) = (accessor, ctor) {
            found.push(DetectedPattern::new(
                ids.next_pattern_id(),
                project_id,
                "singleton",
                class.qualified_name.clone(),
                vec![class.id, accessor.id, ctor.id],
                0.6,
            ));
        }
    }
    Ok(found)
}

/// Factory: a function whose return type names an interface/abstract symbol
/// and which is called from at least two distinct sites.
fn detect_factories(
    ids: &SymbolIdAllocator,
    project_id: u64,
    symbols: &[UniversalSymbol],
    relationships: &[UniversalRelationship],
) -> Result<Vec<DetectedPattern>, String> {
    let interfaces: HashSet<&str> = symbols
        .iter()
        .filter(|s| s.kind == SymbolKind::Interface || s.is_abstract)
        .map(|s| s.qualified_name.as_str())
        .collect();

    let mut callers_by_callee: HashMap<u64, HashSet<u64>> = HashMap::new();
    for rel in relationships.iter().filter(|r| r.relationship_type == RelationshipType::Calls) {
        callers_by_callee.entry(rel.to_symbol_id).or_default().insert(rel.from_symbol_id);
    }

    let mut found = Vec::new();
    for sym in symbols.iter().filter(|s| s.kind.is_callable()) {
        let Some(return_type) = &sym.return_type else { continue };
        if !interfaces.contains(return_type.as_str()) {
            continue;
        }
        let call_sites = callers_by_callee.get(&sym.id).map(HashSet::len).unwrap_or(0);
        if call_sites >= 2 {
            found.push(DetectedPattern::new(ids.next_pattern_id(), project_id, "factory", sym.qualified_name.clone(), vec![sym.id], 0.55));
        }
    }
    Ok(found)
}

/// God object: a class whose method + field count exceeds
/// [`GOD_OBJECT_THRESHOLD`].
fn detect_god_objects(
    ids: &SymbolIdAllocator,
    project_id: u64,
    symbols: &[UniversalSymbol],
    members_by_class: &HashMap<u64, Vec<&UniversalSymbol>>,
) -> Result<Vec<DetectedPattern>, String> {
    let mut found = Vec::new();
    for class in symbols.iter().filter(|s| matches!(s.kind, SymbolKind::Class | SymbolKind::Struct)) {
        let count = members_by_class.get(&class.id).map(Vec::len).unwrap_or(0);
        if count > GOD_OBJECT_THRESHOLD {
            let symbol_ids = members_by_class[&class.id].iter().map(|m| m.id).collect();
            found.push(DetectedPattern::new(ids.next_pattern_id(), project_id, "god_object", class.qualified_name.clone(), symbol_ids, 0.8));
        }
    }
    Ok(found)
}

fn group_members_by_class(symbols: &[UniversalSymbol]) -> HashMap<u64, Vec<&UniversalSymbol>> {
    let classes: Vec<&UniversalSymbol> = symbols.iter().filter(|s| matches!(s.kind, SymbolKind::Class | SymbolKind::Struct)).collect();
    let mut members_by_class = HashMap::new();
    for class in classes {
        let prefix = format!("{}::", class.qualified_name);
        let members: Vec<&UniversalSymbol> = symbols.iter().filter(|s| s.id != class.id && s.qualified_name.starts_with(&prefix)).collect();
        members_by_class.insert(class.id, members);
    }
    members_by_class
}

/// Parenthesized parameter count from a signature string, or `None` if no
/// parentheses are present (e.g. no signature was captured at all).
fn arity(signature: &Option<String>) -> Option<usize> {
    let sig = signature.as_ref()?;
    let open = sig.find('(')?;
    let mut depth = 0usize;
    let mut inner = String::new();
    for ch in sig[open..].chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            c if depth == 1 => inner.push(c),
            _ => {}
        }
    }
    let inner = inner.trim();
    if inner.is_empty() {
        Some(0)
    } else {
        Some(inner.split(',').count())
    }
}

fn aggregate_complexity(symbols: &[UniversalSymbol]) -> ComplexitySummary {
    let values: Vec<f32> = symbols.iter().filter_map(|s| s.complexity).collect();
    if values.is_empty() {
        return ComplexitySummary::default();
    }
    let sum: f32 = values.iter().sum();
    let mean = sum / values.len() as f32;
    let max = values.iter().cloned().fold(f32::MIN, f32::max);
    let high_complexity_count = values.iter().filter(|&&c| c > HIGH_COMPLEXITY_THRESHOLD).count();
    ComplexitySummary {
        mean,
        max,
        high_complexity_count,
        sampled: values.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::types::Language;

    fn sym(id: u64, name: &str, qualified: &str, kind: SymbolKind) -> UniversalSymbol {
        UniversalSymbol::new(id, 1, Language::Rust, name, qualified, kind, "a.rs", 1)
    }

    #[test]
    fn override_discovery_matches_same_name_same_arity_methods() {
        let ids = SymbolIdAllocator::new();
        let mut child = sym(1, "Dog", "Dog", SymbolKind::Class);
        child.id = 1;
        let parent = sym(2, "Animal", "Animal", SymbolKind::Class);
        let mut child_speak = sym(3, "speak", "Dog::speak", SymbolKind::Method);
        child_speak.signature = Some("speak()".to_string());
        let mut parent_speak = sym(4, "speak", "Animal::speak", SymbolKind::Method);
        parent_speak.signature = Some("speak()".to_string());

        let symbols = vec![child, parent, child_speak, parent_speak];
        let inherits = UniversalRelationship::new(1, 1, 1, 2, RelationshipType::Inherits);

        let derived = discover_overrides(&ids, 1, &symbols, &[inherits]);
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].from_symbol_id, 3);
        assert_eq!(derived[0].to_symbol_id, 4);
        assert_eq!(derived[0].confidence, 0.7);
    }

    #[test]
    fn override_discovery_skips_mismatched_arity() {
        let ids = SymbolIdAllocator::new();
        let child = sym(1, "Dog", "Dog", SymbolKind::Class);
        let parent = sym(2, "Animal", "Animal", SymbolKind::Class);
        let mut child_speak = sym(3, "speak", "Dog::speak", SymbolKind::Method);
        child_speak.signature = Some("speak(loudly)".to_string());
        let mut parent_speak = sym(4, "speak", "Animal::speak", SymbolKind::Method);
        parent_speak.signature = Some("speak()".to_string());

        let symbols = vec![child, parent, child_speak, parent_speak];
        let inherits = UniversalRelationship::new(1, 1, 1, 2, RelationshipType::Inherits);

        let derived = discover_overrides(&ids, 1, &symbols, &[inherits]);
        assert!(derived.is_empty());
    }

    #[test]
    fn data_flow_links_writer_to_reader_on_shared_field() {
        let ids = SymbolIdAllocator::new();
        let mut write_rel = UniversalRelationship::new(1, 1, 10, 99, RelationshipType::WritesField);
        write_rel.to_symbol_id = 99;
        let mut read_rel = UniversalRelationship::new(2, 1, 20, 99, RelationshipType::ReadsField);
        read_rel.to_symbol_id = 99;

        let derived = infer_data_flow(&ids, 1, &[write_rel, read_rel]);
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].from_symbol_id, 10);
        assert_eq!(derived[0].to_symbol_id, 20);
        assert_eq!(derived[0].confidence, 0.5);
    }

    #[test]
    fn data_flow_skips_self_pairs() {
        let ids = SymbolIdAllocator::new();
        let write_rel = UniversalRelationship::new(1, 1, 10, 99, RelationshipType::WritesField);
        let read_rel = UniversalRelationship::new(2, 1, 10, 99, RelationshipType::ReadsField);

        let derived = infer_data_flow(&ids, 1, &[write_rel, read_rel]);
        assert!(derived.is_empty());
    }

    #[test]
    fn god_object_flags_classes_over_threshold() {
        let ids = SymbolIdAllocator::new();
        let class = sym(1, "Big", "Big", SymbolKind::Class);
        let mut symbols = vec![class];
        for i in 0..(GOD_OBJECT_THRESHOLD + 1) {
            symbols.push(sym(100 + i as u64, "m", &format!("Big::m{i}"), SymbolKind::Method));
        }
        let members_by_class = group_members_by_class(&symbols);
        let found = detect_god_objects(&ids, 1, &symbols, &members_by_class).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "god_object");
    }

    #[test]
    fn god_object_ignores_classes_under_threshold() {
        let ids = SymbolIdAllocator::new();
        let class = sym(1, "Small", "Small", SymbolKind::Class);
        let method = sym(2, "m", "Small::m", SymbolKind::Method);
        let symbols = vec![class, method];
        let members_by_class = group_members_by_class(&symbols);
        let found = detect_god_objects(&ids, 1, &symbols, &members_by_class).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn singleton_requires_both_accessor_and_private_constructor() {
        let ids = SymbolIdAllocator::new();
        let class = sym(1, "Logger", "Logger", SymbolKind::Class);
        let mut ctor = sym(2, "new", "Logger::new", SymbolKind::Method);
        ctor.visibility = Visibility::Private;
        let accessor = sym(3, "instance", "Logger::instance", SymbolKind::Method);
        let symbols = vec![class, ctor, accessor];
        let members_by_class = group_members_by_class(&symbols);

        let found = detect_singletons(&ids, 1, &symbols, &members_by_class).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "singleton");
    }

    #[test]
    fn factory_requires_at_least_two_call_sites() {
        let ids = SymbolIdAllocator::new();
        let interface = sym(1, "Shape", "Shape", SymbolKind::Interface);
        let mut factory_fn = sym(2, "make_shape", "make_shape", SymbolKind::Function);
        factory_fn.return_type = Some("Shape".to_string());
        let symbols = vec![interface, factory_fn];
        let calls = vec![
            UniversalRelationship::new(1, 1, 10, 2, RelationshipType::Calls),
            UniversalRelationship::new(2, 1, 11, 2, RelationshipType::Calls),
        ];

        let found = detect_factories(&ids, 1, &symbols, &calls).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "factory");
    }

    #[test]
    fn factory_skipped_with_single_call_site() {
        let ids = SymbolIdAllocator::new();
        let interface = sym(1, "Shape", "Shape", SymbolKind::Interface);
        let mut factory_fn = sym(2, "make_shape", "make_shape", SymbolKind::Function);
        factory_fn.return_type = Some("Shape".to_string());
        let symbols = vec![interface, factory_fn];
        let calls = vec![UniversalRelationship::new(1, 1, 10, 2, RelationshipType::Calls)];

        let found = detect_factories(&ids, 1, &symbols, &calls).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn complexity_summary_aggregates_mean_max_and_high_count() {
        let mut a = sym(1, "a", "a", SymbolKind::Function);
        a.complexity = Some(3.0);
        let mut b = sym(2, "b", "b", SymbolKind::Function);
        b.complexity = Some(15.0);
        let symbols = vec![a, b];

        let summary = aggregate_complexity(&symbols);
        assert_eq!(summary.sampled, 2);
        assert_eq!(summary.max, 15.0);
        assert_eq!(summary.high_complexity_count, 1);
    }
}
