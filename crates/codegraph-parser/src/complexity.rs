use codegraph_core::cfg::{BlockType, CfgEdgeType, ConditionalRecord, ControlFlowBlock, ControlFlowEdge, ControlFlowGraph, LoopRecord};
use codegraph_core::ids::SymbolIdAllocator;
use codegraph_core::traits::SyntaxNode;
use regex::Regex;
use std::time::{Duration, Instant};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Canonical, language-agnostic classification of a syntax node relevant to
/// control flow. Adapters report raw grammar-specific kind strings; this
/// analyzer normalizes them via [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    If,
    ElseBranch,
    While,
    DoWhile,
    For,
    Loop,
    Switch,
    SwitchCase,
    Try,
    Catch,
}

/// Maps a raw tree-sitter-style node kind onto a canonical decision point.
/// Deliberately excludes `&&`/`||`/`and`/`or` (short-circuit operators are
/// not decision points here, unlike some complexity calculators).
fn classify(kind: &str) -> Option<Decision> {
    match kind {
        "if_expression" | "if_statement" | "if_let_expression" | "guard_statement" => Some(Decision::If),
        "elif_clause" | "else_if_clause" => Some(Decision::If),
        "else_clause" | "else" => Some(Decision::ElseBranch),
        "while_expression" | "while_statement" => Some(Decision::While),
        "do_statement" | "repeat_while_statement" => Some(Decision::DoWhile),
        "for_expression" | "for_statement" | "for_in_statement" | "for_of_statement" | "foreach_statement"
        | "enhanced_for_statement" => Some(Decision::For),
        "loop_expression" => Some(Decision::Loop),
        "match_expression" | "switch_statement" | "switch_expression" | "select_statement" | "match_statement" => {
            Some(Decision::Switch)
        }
        "match_arm" | "case_clause" | "case" | "when_clause" => Some(Decision::SwitchCase),
        "try_statement" | "try_expression" => Some(Decision::Try),
        "catch_clause" | "except_clause" | "rescue" => Some(Decision::Catch),
        _ => None,
    }
}

struct WalkState {
    complexity: u32,
    conditionals: Vec<Decision>,
    loops: Vec<Decision>,
    deadline: Instant,
    timed_out: bool,
}

/// Computes a control-flow graph for one function-like symbol, given a
/// syntax tree adapter can walk. On timeout (default 5s) or when `root` is
/// `None`, falls back to a minimal or pattern-mode CFG so the run never
/// fails because of one pathological function.
pub fn analyze<T: SyntaxNode>(
    ids: &SymbolIdAllocator,
    symbol_id: u64,
    root: Option<&T>,
    source: &str,
    start_line: u32,
    end_line: u32,
) -> ControlFlowGraph {
    match root {
        Some(node) => analyze_tree(ids, symbol_id, node, source, start_line, end_line),
        None => analyze_patterns(ids, symbol_id, source, start_line, end_line),
    }
}

fn analyze_tree<T: SyntaxNode>(
    ids: &SymbolIdAllocator,
    symbol_id: u64,
    root: &T,
    _source: &str,
    start_line: u32,
    end_line: u32,
) -> ControlFlowGraph {
    let mut state = WalkState {
        complexity: 1,
        conditionals: Vec::new(),
        loops: Vec::new(),
        deadline: Instant::now() + DEFAULT_TIMEOUT,
        timed_out: false,
    };

    walk(root, &mut state);

    let entry_id = ids.next_block_id();
    let exit_id = ids.next_block_id();

    if state.timed_out {
        return ControlFlowGraph::minimal(symbol_id, entry_id, exit_id, start_line, end_line);
    }

    let mut blocks = vec![ControlFlowBlock {
        id: entry_id,
        symbol_id,
        block_type: BlockType::Entry,
        start_line,
        end_line: start_line,
        condition: None,
        loop_type: None,
        complexity: 1,
    }];
    let mut edges = Vec::new();
    let mut loops = Vec::new();
    let mut conditionals = Vec::new();
    let mut last_block = entry_id;

    for decision in &state.conditionals {
        let block_id = ids.next_block_id();
        let (block_type, has_else) = match decision {
            Decision::If | Decision::ElseBranch => (BlockType::Conditional, matches!(decision, Decision::ElseBranch)),
            Decision::Switch | Decision::SwitchCase => (BlockType::Switch, false),
            Decision::Try | Decision::Catch => (BlockType::Catch, false),
            _ => (BlockType::Basic, false),
        };
        blocks.push(ControlFlowBlock {
            id: block_id,
            symbol_id,
            block_type,
            start_line,
            end_line,
            condition: None,
            loop_type: None,
            complexity: 1,
        });
        edges.push(ControlFlowEdge {
            from_block: last_block,
            to_block: block_id,
            edge_type: CfgEdgeType::BranchTrue,
        });
        conditionals.push(ConditionalRecord { block_id, has_else });
        last_block = block_id;
    }

    for decision in &state.loops {
        let block_id = ids.next_block_id();
        let loop_type = match decision {
            Decision::While => "while",
            Decision::DoWhile => "do_while",
            Decision::For => "for",
            Decision::Loop => "loop",
            _ => "loop",
        };
        blocks.push(ControlFlowBlock {
            id: block_id,
            symbol_id,
            block_type: BlockType::Loop,
            start_line,
            end_line,
            condition: None,
            loop_type: Some(loop_type.to_string()),
            complexity: 1,
        });
        edges.push(ControlFlowEdge {
            from_block: last_block,
            to_block: block_id,
            edge_type: CfgEdgeType::Sequential,
        });
        edges.push(ControlFlowEdge {
            from_block: block_id,
            to_block: block_id,
            edge_type: CfgEdgeType::LoopBack,
        });
        loops.push(LoopRecord {
            block_id,
            loop_type: loop_type.to_string(),
        });
        last_block = block_id;
    }

    blocks.push(ControlFlowBlock {
        id: exit_id,
        symbol_id,
        block_type: BlockType::Exit,
        start_line: end_line,
        end_line,
        condition: None,
        loop_type: None,
        complexity: 0,
    });
    edges.push(ControlFlowEdge {
        from_block: last_block,
        to_block: exit_id,
        edge_type: CfgEdgeType::Sequential,
    });

    ControlFlowGraph {
        symbol_id,
        blocks,
        edges,
        entry_block_id: entry_id,
        exit_block_ids: vec![exit_id],
        loops,
        conditionals,
        complexity: state.complexity,
    }
}

fn walk<T: SyntaxNode>(node: &T, state: &mut WalkState) {
    if state.timed_out {
        return;
    }
    if Instant::now() > state.deadline {
        state.timed_out = true;
        return;
    }

    if let Some(decision) = classify(node.kind()) {
        // §4.3 counts each `if`, each `else` branch, each loop, and each
        // `switch` case as a decision point. The `switch`/`try`/`catch`
        // headers themselves are classified so a block gets synthesized for
        // them below, but only their case/catch bodies bump complexity.
        if matches!(
            decision,
            Decision::If
                | Decision::ElseBranch
                | Decision::SwitchCase
                | Decision::While
                | Decision::DoWhile
                | Decision::For
                | Decision::Loop
        ) {
            state.complexity += 1;
        }
        match decision {
            Decision::While | Decision::DoWhile | Decision::For | Decision::Loop => state.loops.push(decision),
            _ => state.conditionals.push(decision),
        }
    }

    for child in node.children() {
        walk(&child, state);
        if state.timed_out {
            return;
        }
    }
}

/// Entry point for adapters that never produce a syntax tree (the reference
/// adapters, and any regex/line-oriented adapter). Equivalent to calling
/// [`analyze`] with `root: None`, without requiring callers to name a
/// concrete `SyntaxNode` type just to pass `None`.
pub fn analyze_from_source(ids: &SymbolIdAllocator, symbol_id: u64, source: &str, start_line: u32, end_line: u32) -> ControlFlowGraph {
    analyze_patterns(ids, symbol_id, source, start_line, end_line)
}

/// Line-oriented regex fallback used when no syntax tree is available.
/// Produces a degraded but non-empty CFG: one block per matched header.
fn analyze_patterns(ids: &SymbolIdAllocator, symbol_id: u64, source: &str, start_line: u32, end_line: u32) -> ControlFlowGraph {
    let if_re = Regex::new(r"^\s*(\}?\s*else\s+)?if\b").unwrap();
    let else_re = Regex::new(r"^\s*\}?\s*else\s*\{?\s*$").unwrap();
    let for_re = Regex::new(r"^\s*for\b").unwrap();
    let while_re = Regex::new(r"^\s*while\b").unwrap();

    let entry_id = ids.next_block_id();
    let exit_id = ids.next_block_id();
    let mut blocks = vec![ControlFlowBlock {
        id: entry_id,
        symbol_id,
        block_type: BlockType::Entry,
        start_line,
        end_line: start_line,
        condition: None,
        loop_type: None,
        complexity: 1,
    }];
    let mut edges = Vec::new();
    let mut complexity = 1u32;
    let mut last_block = entry_id;
    let mut loops = Vec::new();
    let mut conditionals = Vec::new();

    for line in source.lines() {
        let (block_type, loop_type) = if if_re.is_match(line) {
            complexity += 1;
            (BlockType::Conditional, None)
        } else if else_re.is_match(line) {
            complexity += 1;
            (BlockType::Conditional, None)
        } else if for_re.is_match(line) {
            complexity += 1;
            (BlockType::Loop, Some("for"))
        } else if while_re.is_match(line) {
            complexity += 1;
            (BlockType::Loop, Some("while"))
        } else {
            continue;
        };

        let block_id = ids.next_block_id();
        blocks.push(ControlFlowBlock {
            id: block_id,
            symbol_id,
            block_type,
            start_line,
            end_line,
            condition: None,
            loop_type: loop_type.map(|s| s.to_string()),
            complexity: 1,
        });
        edges.push(ControlFlowEdge {
            from_block: last_block,
            to_block: block_id,
            edge_type: CfgEdgeType::Sequential,
        });
        if block_type == BlockType::Loop {
            loops.push(LoopRecord {
                block_id,
                loop_type: loop_type.unwrap_or("loop").to_string(),
            });
        } else {
            conditionals.push(ConditionalRecord { block_id, has_else: false });
        }
        last_block = block_id;
    }

    blocks.push(ControlFlowBlock {
        id: exit_id,
        symbol_id,
        block_type: BlockType::Exit,
        start_line: end_line,
        end_line,
        condition: None,
        loop_type: None,
        complexity: 0,
    });
    edges.push(ControlFlowEdge {
        from_block: last_block,
        to_block: exit_id,
        edge_type: CfgEdgeType::Sequential,
    });

    ControlFlowGraph {
        symbol_id,
        blocks,
        edges,
        entry_block_id: entry_id,
        exit_block_ids: vec![exit_id],
        loops,
        conditionals,
        complexity,
    }
}
