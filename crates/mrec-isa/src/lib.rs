//! Allegrex (PSP MIPS) instruction set support.
//!
//! This crate provides the static decode table, the opcode classifier built
//! on it, translation of decoded instructions into `mrec-ir` statements, and
//! a small disassembler used by the CLI.

mod disasm;
mod error;
mod table;
mod translate;
mod types;

pub use disasm::*;
pub use error::*;
pub use table::*;
pub use translate::*;
pub use types::*;
