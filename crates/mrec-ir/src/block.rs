//! Basic block IR.

use crate::stmt::Stmt;

/// IR for a basic block: the ordered statement body handed to a compiler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockIR {
    /// Starting PC of the block.
    pub start_pc: u32,
    /// Ending PC (exclusive) of the block, past the last decoded instruction.
    pub end_pc: u32,
    /// Number of guest instructions covered, delay slot included.
    pub guest_instructions: usize,
    /// Statements in execution order.
    pub stmts: Vec<Stmt>,
}

impl BlockIR {
    /// Create a new empty block.
    #[must_use]
    pub const fn new(start_pc: u32) -> Self {
        Self {
            start_pc,
            end_pc: start_pc,
            guest_instructions: 0,
            stmts: Vec::new(),
        }
    }

    /// Append a statement.
    pub fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    /// Record that the guest instruction at `pc` is covered by this block.
    pub const fn cover(&mut self, pc: u32) {
        self.end_pc = pc.wrapping_add(4);
        self.guest_instructions += 1;
    }

    /// Get block size in bytes.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.end_pc.wrapping_sub(self.start_pc)
    }

    /// Get number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    /// Check if block is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// The last statement, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Stmt> {
        self.stmts.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_tracks_end() {
        let mut block = BlockIR::new(0x0880_4000);
        assert_eq!(block.size(), 0);
        block.cover(0x0880_4000);
        block.cover(0x0880_4004);
        assert_eq!(block.end_pc, 0x0880_4008);
        assert_eq!(block.size(), 8);
        assert_eq!(block.guest_instructions, 2);
        assert!(block.is_empty());
    }
}
