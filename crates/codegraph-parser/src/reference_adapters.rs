use async_trait::async_trait;
use codegraph_core::error::Result as CoreResult;
use codegraph_core::relationship::RelationshipInfo;
use codegraph_core::traits::{ParseOutput, ParserAdapter, SymbolInfo};
use codegraph_core::types::{Language, RelationshipType, SymbolKind, Visibility};
use regex::Regex;
use std::path::Path;

/// Toy regex-based adapter for a C-like grammar (`function name(...)` +
/// `name(...)` call sites). Exists so the dispatcher, resolver and
/// control-flow analyzer can be exercised end to end in tests without
/// depending on a real tree-sitter grammar, which is an external
/// collaborator outside this crate's scope.
#[derive(Default)]
pub struct CLikeReferenceAdapter {
    fn_re: Option<Regex>,
    call_re: Option<Regex>,
    spawn_re: Option<Regex>,
}

#[async_trait]
impl ParserAdapter for CLikeReferenceAdapter {
    fn initialize(&mut self) -> CoreResult<()> {
        self.fn_re = Some(Regex::new(r"(?m)^\s*(?:export\s+)?function\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
        self.call_re = Some(Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
        self.spawn_re = Some(Regex::new(r#"spawn\s*\(\s*['"]([^'"]+)['"]\s*,\s*\[\s*['"]([^'"]+)['"]"#).unwrap());
        Ok(())
    }

    fn supported_languages(&self) -> &[Language] {
        &[Language::TypeScript, Language::JavaScript]
    }

    async fn parse(&self, file_path: &Path, content: &str) -> CoreResult<ParseOutput> {
        let mut output = ParseOutput::default();
        let fn_re = self.fn_re.as_ref().expect("initialize() must be called first");
        let call_re = self.call_re.as_ref().expect("initialize() must be called first");
        let spawn_re = self.spawn_re.as_ref().expect("initialize() must be called first");

        let file_stem = file_path.file_stem().and_then(|s| s.to_str()).unwrap_or("module").to_string();

        for (line_idx, line) in content.lines().enumerate() {
            if let Some(caps) = fn_re.captures(line) {
                let name = caps[1].to_string();
                output.symbols.push(SymbolInfo {
                    name: name.clone(),
                    qualified_name: format!("{file_stem}::{name}"),
                    kind: SymbolKind::Function,
                    file_path: file_path.to_string_lossy().to_string(),
                    line: (line_idx + 1) as u32,
                    column: 0,
                    end_line: (line_idx + 1) as u32,
                    end_column: 0,
                    signature: Some(line.trim().to_string()),
                    return_type: None,
                    visibility: Visibility::Public,
                    namespace: None,
                    parent_scope: None,
                    is_definition: true,
                    is_exported: line.trim_start().starts_with("export"),
                    is_async: false,
                    is_abstract: false,
                    complexity: None,
                });
            }

            if let Some(caps) = spawn_re.captures(line) {
                output.relationships.push(RelationshipInfo {
                    cross_language: true,
                    bridge_type: Some(caps[1].to_string()),
                    ..RelationshipInfo::new(file_stem.clone(), caps[2].to_string(), RelationshipType::Spawns)
                });
            }
        }

        // Second pass: find calls from within each defined function's body
        // to any other name, including ones not defined in this file.
        let mut current_caller: Option<String> = None;
        for (line_idx, line) in content.lines().enumerate() {
            if let Some(caps) = fn_re.captures(line) {
                current_caller = Some(caps[1].to_string());
                continue;
            }
            let Some(caller) = &current_caller else { continue };
            for caps in call_re.captures_iter(line) {
                let callee = caps[1].to_string();
                if callee == *caller {
                    continue;
                }
                if callee == "function" || callee == "if" || callee == "for" || callee == "while" {
                    continue;
                }
                let mut rel = RelationshipInfo::new(caller.clone(), callee, RelationshipType::Calls);
                rel.line = Some((line_idx + 1) as u32);
                output.relationships.push(rel);
            }
        }

        Ok(output)
    }
}

/// Toy regex-based adapter for a Python-like grammar (`def name(...):`).
#[derive(Default)]
pub struct PythonLikeReferenceAdapter {
    fn_re: Option<Regex>,
    call_re: Option<Regex>,
}

#[async_trait]
impl ParserAdapter for PythonLikeReferenceAdapter {
    fn initialize(&mut self) -> CoreResult<()> {
        self.fn_re = Some(Regex::new(r"(?m)^\s*def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
        self.call_re = Some(Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
        Ok(())
    }

    fn supported_languages(&self) -> &[Language] {
        &[Language::Python]
    }

    async fn parse(&self, file_path: &Path, content: &str) -> CoreResult<ParseOutput> {
        let mut output = ParseOutput::default();
        let fn_re = self.fn_re.as_ref().expect("initialize() must be called first");
        let call_re = self.call_re.as_ref().expect("initialize() must be called first");
        let file_stem = file_path.file_stem().and_then(|s| s.to_str()).unwrap_or("module").to_string();

        let mut current_caller: Option<String> = None;
        for (line_idx, line) in content.lines().enumerate() {
            if let Some(caps) = fn_re.captures(line) {
                let name = caps[1].to_string();
                output.symbols.push(SymbolInfo {
                    name: name.clone(),
                    qualified_name: format!("{file_stem}::{name}"),
                    kind: SymbolKind::Function,
                    file_path: file_path.to_string_lossy().to_string(),
                    line: (line_idx + 1) as u32,
                    column: 0,
                    end_line: (line_idx + 1) as u32,
                    end_column: 0,
                    signature: Some(line.trim().to_string()),
                    return_type: None,
                    visibility: Visibility::Public,
                    namespace: None,
                    parent_scope: None,
                    is_definition: true,
                    is_exported: !name.starts_with('_'),
                    is_async: line.contains("async def"),
                    is_abstract: false,
                    complexity: None,
                });
                current_caller = Some(name);
                continue;
            }
            let Some(caller) = &current_caller else { continue };
            for caps in call_re.captures_iter(line) {
                let callee = caps[1].to_string();
                if callee == *caller || callee == "def" || callee == "if" || callee == "for" || callee == "while" {
                    continue;
                }
                let mut rel = RelationshipInfo::new(caller.clone(), callee, RelationshipType::Calls);
                rel.line = Some((line_idx + 1) as u32);
                output.relationships.push(rel);
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn c_like_adapter_extracts_function_symbols_and_calls() {
        let mut adapter = CLikeReferenceAdapter::default();
        adapter.initialize().unwrap();
        let content = "export function foo() {\n  bar();\n}\n\nfunction bar() {\n  return 1;\n}\n";
        let output = adapter.parse(&PathBuf::from("a.ts"), content).await.unwrap();
        assert_eq!(output.symbols.len(), 2);
        assert!(output.relationships.iter().any(|r| r.from_name == "foo" && r.to_name == "bar"));
    }

    #[tokio::test]
    async fn python_like_adapter_extracts_def_and_calls() {
        let mut adapter = PythonLikeReferenceAdapter::default();
        adapter.initialize().unwrap();
        let content = "def main():\n    helper()\n";
        let output = adapter.parse(&PathBuf::from("tool.py"), content).await.unwrap();
        assert_eq!(output.symbols.len(), 1);
        assert_eq!(output.symbols[0].name, "main");
    }
}
