use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Entry,
    Exit,
    Basic,
    Conditional,
    Loop,
    Switch,
    Catch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CfgEdgeType {
    Sequential,
    BranchTrue,
    BranchFalse,
    LoopBack,
    Break,
    Continue,
    Return,
    Throw,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFlowBlock {
    pub id: u64,
    pub symbol_id: u64,
    pub block_type: BlockType,
    pub start_line: u32,
    pub end_line: u32,
    pub condition: Option<String>,
    pub loop_type: Option<String>,
    pub complexity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFlowEdge {
    pub from_block: u64,
    pub to_block: u64,
    pub edge_type: CfgEdgeType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopRecord {
    pub block_id: u64,
    pub loop_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalRecord {
    pub block_id: u64,
    pub has_else: bool,
}

/// Control-flow graph for a single symbol. `complexity` is seeded at 1 and
/// incremented once per decision point; short-circuit (`&&`/`||`) operators
/// are never counted as decision points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    pub symbol_id: u64,
    pub blocks: Vec<ControlFlowBlock>,
    pub edges: Vec<ControlFlowEdge>,
    pub entry_block_id: u64,
    pub exit_block_ids: Vec<u64>,
    pub loops: Vec<LoopRecord>,
    pub conditionals: Vec<ConditionalRecord>,
    pub complexity: u32,
}

impl ControlFlowGraph {
    /// The degenerate CFG returned when analysis exceeds its time budget or
    /// no richer information is available: one entry, one exit, complexity 1.
    pub fn minimal(symbol_id: u64, entry_block_id: u64, exit_block_id: u64, start_line: u32, end_line: u32) -> Self {
        let entry = ControlFlowBlock {
            id: entry_block_id,
            symbol_id,
            block_type: BlockType::Entry,
            start_line,
            end_line: start_line,
            condition: None,
            loop_type: None,
            complexity: 1,
        };
        let exit = ControlFlowBlock {
            id: exit_block_id,
            symbol_id,
            block_type: BlockType::Exit,
            start_line: end_line,
            end_line,
            condition: None,
            loop_type: None,
            complexity: 0,
        };
        Self {
            symbol_id,
            blocks: vec![entry, exit],
            edges: vec![ControlFlowEdge {
                from_block: entry_block_id,
                to_block: exit_block_id,
                edge_type: CfgEdgeType::Sequential,
            }],
            entry_block_id,
            exit_block_ids: vec![exit_block_id],
            loops: Vec::new(),
            conditionals: Vec::new(),
            complexity: 1,
        }
    }
}
