use mrec_state::MemoryError;
use thiserror::Error;

/// Block execution errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("memory fault: {0}")]
    Memory(#[from] MemoryError),

    #[error("syscall {code:#x} with no handler installed")]
    NoSyscallHandler { code: u32 },

    #[error("unsupported access width {0}")]
    UnsupportedWidth(u8),
}
