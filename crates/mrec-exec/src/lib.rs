//! Block execution for the MIPS block recompiler.
//!
//! `Interpreter` is the `CodeCompiler` used by the recompiler facade. It
//! keeps the statement list as data and evaluates it against a `CpuState`
//! each time the resulting `CompiledBlock` is called.

mod block;
mod error;
mod interp;

pub use block::{BlockExit, CompiledBlock, Interpreter};
pub use error::ExecError;
