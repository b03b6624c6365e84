pub mod bloom;
pub mod cache;
pub mod context;
pub mod stats;

pub use bloom::NameBloomFilter;
pub use cache::{graph_edge_kind_for, GraphEdgeKind, SymbolResolutionCache};
pub use context::ResolutionContext;
pub use stats::CacheStats;
