//! Allegrex guest state for block execution.
//!
//! `CpuState` bundles the register file, a flat little-endian guest memory
//! image and an optional syscall handler. Compiled blocks run against it.

mod memory;
mod state;

pub use memory::{GuestMemory, MemoryError};
pub use state::{CpuState, NUM_GPRS, Registers, SyscallHandler};
