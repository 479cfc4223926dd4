use std::sync::Arc;

use mrec_gen::CodeCompiler;
use mrec_ir::{BlockIR, Stmt};
use mrec_state::CpuState;
use tracing::trace;

use crate::error::ExecError;
use crate::interp::Frame;

/// How a block finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockExit {
    /// Control left through a branch, jump or fall-through; `regs.pc` holds
    /// the next address.
    Branch,
    /// A break or halt ran; `regs.pc` holds its address.
    Break { code: u32 },
}

/// An executable block. Cheap to clone; the body is shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledBlock {
    start_pc: u32,
    end_pc: u32,
    guest_instructions: usize,
    stmts: Arc<[Stmt]>,
}

impl CompiledBlock {
    #[must_use]
    pub const fn start_pc(&self) -> u32 {
        self.start_pc
    }

    /// One past the last guest instruction, delay slot included.
    #[must_use]
    pub const fn end_pc(&self) -> u32 {
        self.end_pc
    }

    #[must_use]
    pub const fn guest_instructions(&self) -> usize {
        self.guest_instructions
    }

    #[must_use]
    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    /// Run the block against `state`.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` on a memory fault or a syscall with no handler.
    /// Guest state reflects every statement executed before the failure.
    pub fn call(&self, state: &mut CpuState) -> Result<BlockExit, ExecError> {
        trace!(start = format!("{:#x}", self.start_pc), "call");
        let mut frame = Frame::new(state);
        frame.exec_all(&self.stmts)?;
        Ok(match frame.break_code() {
            Some(code) => BlockExit::Break { code },
            None => BlockExit::Branch,
        })
    }
}

/// Compiler that keeps block IR as data for interpretation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Interpreter;

impl Interpreter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CodeCompiler for Interpreter {
    type Output = CompiledBlock;

    fn compile(&self, block: BlockIR) -> CompiledBlock {
        CompiledBlock {
            start_pc: block.start_pc,
            end_pc: block.end_pc,
            guest_instructions: block.guest_instructions,
            stmts: block.stmts.into(),
        }
    }
}
