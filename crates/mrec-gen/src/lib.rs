//! Basic block generation.
//!
//! `BlockGenerator` walks guest code from an entry address, translates each
//! instruction through a `SemanticTranslator`, applies the MIPS delay-slot
//! rules and hands the finished `BlockIR` to a `CodeCompiler`.
//!
//! The collaborator traits for reading memory, classifying words and
//! translating instructions live in `mrec-isa` and are re-exported here.

mod compiler;
mod config;
mod error;
mod generator;
mod usage;

pub use compiler::{CodeCompiler, IrCompiler};
pub use config::{DEFAULT_MAX_BLOCK_INSTRUCTIONS, GeneratorConfig};
pub use error::{GenError, Result};
pub use generator::BlockGenerator;
pub use usage::InstructionUsage;

pub use mrec_ir::BlockIR;
pub use mrec_isa::{
    DecodedInstruction, Instruction, InstructionClassifier, InstructionType, MemoryReader,
    SemanticTranslator, TranslateError,
};
