//! mrec - MIPS (Allegrex) block recompiler
//!
//! Turns guest code into executable basic blocks on demand. Each `create`
//! call decodes from an entry address to the first branch (plus its delay
//! slot) or break, translates the instructions to IR and compiles the IR into
//! a block that runs against a `CpuState`.
//!
//! # Example
//!
//! ```ignore
//! use mrec::{CpuState, GuestMemory, Recompiler};
//!
//! let memory = mrec::load_image("boot.bin", 0x0880_0000)?;
//! let mut recompiler = Recompiler::new(memory.clone());
//! let block = recompiler.create(0x0880_0000)?;
//! let mut state = CpuState::new(memory);
//! block.call(&mut state)?;
//! ```

// Re-export from sub-crates
pub use mrec_exec::{BlockExit, CompiledBlock, ExecError, Interpreter};
pub use mrec_gen::{
    BlockGenerator, CodeCompiler, DEFAULT_MAX_BLOCK_INSTRUCTIONS, GenError, GeneratorConfig,
    InstructionUsage, IrCompiler,
};
pub use mrec_ir::{BinaryOp, BlockIR, Expr, HiLoOp, Place, ReadExpr, Stmt, UnaryOp};
pub use mrec_isa::{
    AllegrexTable, AllegrexTranslator, DecodedInstruction, Instruction, InstructionClassifier,
    InstructionType, MemoryReader, Op, SemanticTranslator, TranslateError, disasm,
};
pub use mrec_state::{CpuState, GuestMemory, MemoryError, Registers, SyscallHandler};

mod error;
mod image;
pub mod metrics;
mod recompiler;

pub use error::{Error, Result};
pub use image::load_image;
pub use recompiler::{AllegrexGenerator, Recompiler, SharedRecompiler};
