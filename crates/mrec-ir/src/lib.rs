//! Intermediate representation for the MIPS block recompiler.
//!
//! This crate provides pure IR types with no Allegrex-specific knowledge.
//! Decoding and translation into IR live in `mrec-isa`.

mod block;
mod dump;
mod expr;
mod stmt;

pub use block::*;
pub use expr::*;
pub use stmt::*;
