use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic per-project id allocator.
///
/// Symbols, relationships, patterns and control-flow blocks each get their
/// own counter so ids never collide across entity kinds even though all of
/// them are plain `u64`s.
#[derive(Debug, Default)]
pub struct SymbolIdAllocator {
    symbol: AtomicU64,
    relationship: AtomicU64,
    pattern: AtomicU64,
    block: AtomicU64,
}

impl SymbolIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_symbol_id(&self) -> u64 {
        self.symbol.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_relationship_id(&self) -> u64 {
        self.relationship.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_pattern_id(&self) -> u64 {
        self.pattern.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_block_id(&self) -> u64 {
        self.block.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_disjoint_per_kind() {
        let alloc = SymbolIdAllocator::new();
        assert_eq!(alloc.next_symbol_id(), 1);
        assert_eq!(alloc.next_symbol_id(), 2);
        assert_eq!(alloc.next_relationship_id(), 1);
        assert_eq!(alloc.next_block_id(), 1);
    }
}
