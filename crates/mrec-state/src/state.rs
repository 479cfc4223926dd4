//! Register file and CPU state.

use std::fmt;

use crate::memory::GuestMemory;

pub use mrec_isa::NUM_GPRS;

/// Allegrex integer register file plus branch bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    gpr: [u32; NUM_GPRS],
    pub hi: u32,
    pub lo: u32,
    pub pc: u32,
    /// Outcome of the last branch statement.
    pub branch_flag: bool,
    /// Target recorded by the last branch statement.
    pub branch_pc: u32,
}

impl Registers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a GPR. `$zero` always reads 0.
    #[must_use]
    pub fn get(&self, reg: u8) -> u32 {
        match reg {
            0 => 0,
            r => self.gpr.get(usize::from(r)).copied().unwrap_or(0),
        }
    }

    /// Write a GPR. Writes to `$zero` and out-of-range indices are ignored.
    pub fn set(&mut self, reg: u8, value: u32) {
        if reg == 0 {
            return;
        }
        if let Some(slot) = self.gpr.get_mut(usize::from(reg)) {
            *slot = value;
        }
    }

    /// All GPRs, `$zero` first.
    #[must_use]
    pub const fn gprs(&self) -> &[u32; NUM_GPRS] {
        &self.gpr
    }
}

/// Host services invoked by `syscall`.
///
/// The handler reads arguments from and writes results to the register
/// file directly.
pub trait SyscallHandler: Send {
    fn syscall(&mut self, code: u32, regs: &mut Registers, memory: &mut GuestMemory);
}

impl<F> SyscallHandler for F
where
    F: FnMut(u32, &mut Registers, &mut GuestMemory) + Send,
{
    fn syscall(&mut self, code: u32, regs: &mut Registers, memory: &mut GuestMemory) {
        self(code, regs, memory);
    }
}

/// Everything a compiled block touches.
#[derive(Default)]
pub struct CpuState {
    pub regs: Registers,
    pub memory: GuestMemory,
    syscall_handler: Option<Box<dyn SyscallHandler>>,
}

impl CpuState {
    #[must_use]
    pub fn new(memory: GuestMemory) -> Self {
        Self {
            regs: Registers::new(),
            memory,
            syscall_handler: None,
        }
    }

    /// Install a syscall handler.
    #[must_use]
    pub fn with_syscall_handler(mut self, handler: impl SyscallHandler + 'static) -> Self {
        self.syscall_handler = Some(Box::new(handler));
        self
    }

    /// Replace the syscall handler.
    pub fn set_syscall_handler(&mut self, handler: Option<Box<dyn SyscallHandler>>) {
        self.syscall_handler = handler;
    }

    #[must_use]
    pub fn has_syscall_handler(&self) -> bool {
        self.syscall_handler.is_some()
    }

    /// Dispatch a syscall. Returns `false` when no handler is installed.
    pub fn syscall(&mut self, code: u32) -> bool {
        let Some(handler) = self.syscall_handler.as_mut() else {
            return false;
        };
        handler.syscall(code, &mut self.regs, &mut self.memory);
        true
    }
}

impl fmt::Debug for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpuState")
            .field("regs", &self.regs)
            .field("memory", &format_args!("{} bytes at {:#010x}", self.memory.len(), self.memory.base()))
            .field("syscall_handler", &self.syscall_handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_register_is_hardwired() {
        let mut regs = Registers::new();
        regs.set(0, 42);
        regs.set(4, 7);
        assert_eq!(regs.get(0), 0);
        assert_eq!(regs.get(4), 7);
        assert_eq!(regs.get(99), 0);
    }

    #[test]
    fn test_syscall_dispatch() {
        let mut state = CpuState::new(GuestMemory::new(0, 4));
        assert!(!state.syscall(0x2011));

        let mut state = state.with_syscall_handler(|code: u32, regs: &mut Registers, _: &mut GuestMemory| {
            regs.set(2, code);
        });
        assert!(state.has_syscall_handler());
        assert!(state.syscall(0x2011));
        assert_eq!(state.regs.get(2), 0x2011);
    }
}
