//! Statement IR.

use crate::expr::Expr;

/// Register-file destinations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Place {
    Reg(u8),
    Hi,
    Lo,
}

/// Operations producing a HI/LO pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum HiLoOp {
    Mult,
    MultU,
    Div,
    DivU,
    Madd,
    MaddU,
    Msub,
    MsubU,
}

/// Statement kinds.
///
/// A translated instruction is exactly one statement (use `Seq` for several
/// effects). The generator adds the bookkeeping variants `FunctionPrefix`,
/// `PostBranch`, `Likely` and `StorePc` around translated statements.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Stmt {
    /// Block prologue marker.
    FunctionPrefix,
    /// No effect.
    Nop,
    /// Write to a register, HI or LO.
    Write { place: Place, value: Expr },
    /// Write to memory.
    WriteMem { addr: Expr, value: Expr, width: u8 },
    /// 64-bit multiply/divide into HI/LO.
    HiLo { op: HiLoOp, left: Expr, right: Expr },
    /// Record branch outcome and target; the PC is committed by `PostBranch`.
    Branch { cond: Expr, target: Expr },
    /// Conditional execution.
    If {
        cond: Expr,
        then_stmts: Vec<Stmt>,
        else_stmts: Vec<Stmt>,
    },
    /// Several effects of one instruction, in order.
    Seq(Vec<Stmt>),
    /// System call with its 20-bit code.
    Syscall { code: u32 },
    /// Stop execution with a break code.
    Break { code: u32 },
    /// Commit the PC after a delay slot: the branch target if taken, else `next_pc`.
    PostBranch { next_pc: u32 },
    /// Delay-slot guard: when `likely`, `body` runs only if the branch was taken.
    Likely { likely: bool, body: Box<Stmt> },
    /// Store a constant PC.
    StorePc { pc: u32 },
}

impl Stmt {
    /// Create a register write. Writes to `$zero` become `Nop`.
    #[must_use]
    pub fn write_reg(reg: u8, value: Expr) -> Self {
        if reg == 0 {
            return Self::Nop;
        }
        Self::Write {
            place: Place::Reg(reg),
            value,
        }
    }

    /// Create a HI write.
    #[must_use]
    pub const fn write_hi(value: Expr) -> Self {
        Self::Write {
            place: Place::Hi,
            value,
        }
    }

    /// Create a LO write.
    #[must_use]
    pub const fn write_lo(value: Expr) -> Self {
        Self::Write {
            place: Place::Lo,
            value,
        }
    }

    /// Create a memory write statement.
    #[must_use]
    pub const fn write_mem(addr: Expr, value: Expr, width: u8) -> Self {
        Self::WriteMem { addr, value, width }
    }

    /// Create a HI/LO statement.
    #[must_use]
    pub const fn hilo(op: HiLoOp, left: Expr, right: Expr) -> Self {
        Self::HiLo { op, left, right }
    }

    /// Create a branch statement.
    #[must_use]
    pub const fn branch(cond: Expr, target: Expr) -> Self {
        Self::Branch { cond, target }
    }

    /// Create an if statement.
    #[must_use]
    pub const fn if_then(cond: Expr, then_stmts: Vec<Self>) -> Self {
        Self::If {
            cond,
            then_stmts,
            else_stmts: Vec::new(),
        }
    }

    /// Create an if-else statement.
    #[must_use]
    pub const fn if_then_else(cond: Expr, then_stmts: Vec<Self>, else_stmts: Vec<Self>) -> Self {
        Self::If {
            cond,
            then_stmts,
            else_stmts,
        }
    }

    /// Sequence several statements, dropping `Nop`s. Collapses to a single
    /// statement where possible.
    #[must_use]
    pub fn seq(stmts: Vec<Self>) -> Self {
        let mut stmts: Vec<Self> = stmts.into_iter().filter(|s| !s.is_nop()).collect();
        match stmts.len() {
            0 => Self::Nop,
            1 => stmts.pop().unwrap_or(Self::Nop),
            _ => Self::Seq(stmts),
        }
    }

    /// Wrap a delay-slot statement in a likely guard.
    #[must_use]
    pub fn likely(likely: bool, body: Self) -> Self {
        Self::Likely {
            likely,
            body: Box::new(body),
        }
    }

    /// Check if this statement has no effect.
    #[must_use]
    pub const fn is_nop(&self) -> bool {
        matches!(self, Self::Nop)
    }

    /// Check if this is a node added by block formation rather than translation.
    #[must_use]
    pub const fn is_bookkeeping(&self) -> bool {
        matches!(
            self,
            Self::FunctionPrefix | Self::PostBranch { .. } | Self::Likely { .. } | Self::StorePc { .. }
        )
    }
}
