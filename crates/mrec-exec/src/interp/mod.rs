//! Statement and expression evaluation.

use mrec_ir::{BinaryOp, Expr, HiLoOp, Place, ReadExpr, Stmt, TernaryOp, UnaryOp};
use mrec_state::CpuState;

use crate::error::ExecError;

/// Evaluation context for one block call.
pub(crate) struct Frame<'a> {
    state: &'a mut CpuState,
    break_code: Option<u32>,
}

impl<'a> Frame<'a> {
    pub(crate) const fn new(state: &'a mut CpuState) -> Self {
        Self {
            state,
            break_code: None,
        }
    }

    pub(crate) const fn break_code(&self) -> Option<u32> {
        self.break_code
    }

    pub(crate) fn exec_all(&mut self, stmts: &[Stmt]) -> Result<(), ExecError> {
        for stmt in stmts {
            self.exec(stmt)?;
        }
        Ok(())
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<(), ExecError> {
        match stmt {
            Stmt::FunctionPrefix => self.state.regs.branch_flag = false,
            Stmt::Nop => {}
            Stmt::Write { place, value } => {
                let value = self.eval(value)?;
                let regs = &mut self.state.regs;
                match place {
                    Place::Reg(reg) => regs.set(*reg, value),
                    Place::Hi => regs.hi = value,
                    Place::Lo => regs.lo = value,
                }
            }
            Stmt::WriteMem { addr, value, width } => {
                let addr = self.eval(addr)?;
                let value = self.eval(value)?;
                self.store(addr, value, *width)?;
            }
            Stmt::HiLo { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.hilo(*op, left, right);
            }
            Stmt::Branch { cond, target } => {
                let taken = self.eval(cond)? != 0;
                let target = self.eval(target)?;
                self.state.regs.branch_flag = taken;
                self.state.regs.branch_pc = target;
            }
            Stmt::If {
                cond,
                then_stmts,
                else_stmts,
            } => {
                if self.eval(cond)? != 0 {
                    self.exec_all(then_stmts)?;
                } else {
                    self.exec_all(else_stmts)?;
                }
            }
            Stmt::Seq(stmts) => self.exec_all(stmts)?,
            Stmt::Syscall { code } => {
                if !self.state.syscall(*code) {
                    return Err(ExecError::NoSyscallHandler { code: *code });
                }
            }
            Stmt::Break { code } => self.break_code = Some(*code),
            Stmt::PostBranch { next_pc } => {
                let regs = &mut self.state.regs;
                regs.pc = if regs.branch_flag {
                    regs.branch_pc
                } else {
                    *next_pc
                };
            }
            Stmt::Likely { likely, body } => {
                if !*likely || self.state.regs.branch_flag {
                    self.exec(body)?;
                }
            }
            Stmt::StorePc { pc } => self.state.regs.pc = *pc,
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr) -> Result<u32, ExecError> {
        Ok(match expr {
            Expr::Imm(v) => *v,
            Expr::Read(read) => self.read(read)?,
            Expr::Unary { op, expr } => unary(*op, self.eval(expr)?),
            Expr::Binary { op, left, right } => binary(*op, self.eval(left)?, self.eval(right)?),
            Expr::Ternary {
                op: TernaryOp::Select,
                first,
                second,
                third,
            } => {
                if self.eval(first)? != 0 {
                    self.eval(second)?
                } else {
                    self.eval(third)?
                }
            }
        })
    }

    fn read(&self, read: &ReadExpr) -> Result<u32, ExecError> {
        let regs = &self.state.regs;
        Ok(match read {
            ReadExpr::Reg(reg) => regs.get(*reg),
            ReadExpr::Hi => regs.hi,
            ReadExpr::Lo => regs.lo,
            ReadExpr::BranchFlag => u32::from(regs.branch_flag),
            ReadExpr::Mem {
                addr,
                width,
                signed,
            } => self.load(self.eval(addr)?, *width, *signed)?,
        })
    }

    fn load(&self, addr: u32, width: u8, signed: bool) -> Result<u32, ExecError> {
        let memory = &self.state.memory;
        Ok(match (width, signed) {
            (1, false) => u32::from(memory.load8(addr)?),
            (1, true) => i32::from(memory.load8(addr)?.cast_signed()).cast_unsigned(),
            (2, false) => u32::from(memory.load16(addr)?),
            (2, true) => i32::from(memory.load16(addr)?.cast_signed()).cast_unsigned(),
            (4, _) => memory.load32(addr)?,
            _ => return Err(ExecError::UnsupportedWidth(width)),
        })
    }

    fn store(&mut self, addr: u32, value: u32, width: u8) -> Result<(), ExecError> {
        let memory = &mut self.state.memory;
        let bytes = value.to_le_bytes();
        match width {
            1 => memory.store8(addr, bytes[0])?,
            2 => memory.store16(addr, u16::from_le_bytes([bytes[0], bytes[1]]))?,
            4 => memory.store32(addr, value)?,
            _ => return Err(ExecError::UnsupportedWidth(width)),
        }
        Ok(())
    }

    fn hilo(&mut self, op: HiLoOp, left: u32, right: u32) {
        let regs = &mut self.state.regs;
        let acc = (u64::from(regs.hi) << 32) | u64::from(regs.lo);
        let signed = || i64::from(left.cast_signed()) * i64::from(right.cast_signed());
        let unsigned = || u64::from(left) * u64::from(right);
        let (hi, lo) = match op {
            HiLoOp::Mult => split(signed().cast_unsigned()),
            HiLoOp::MultU => split(unsigned()),
            HiLoOp::Madd => split(acc.wrapping_add(signed().cast_unsigned())),
            HiLoOp::MaddU => split(acc.wrapping_add(unsigned())),
            HiLoOp::Msub => split(acc.wrapping_sub(signed().cast_unsigned())),
            HiLoOp::MsubU => split(acc.wrapping_sub(unsigned())),
            HiLoOp::Div => {
                let (l, r) = (left.cast_signed(), right.cast_signed());
                if r == 0 {
                    (left, if l < 0 { 1 } else { u32::MAX })
                } else {
                    (
                        l.wrapping_rem(r).cast_unsigned(),
                        l.wrapping_div(r).cast_unsigned(),
                    )
                }
            }
            HiLoOp::DivU => {
                if right == 0 {
                    (left, u32::MAX)
                } else {
                    (left % right, left / right)
                }
            }
        };
        regs.hi = hi;
        regs.lo = lo;
    }
}

/// Split a 64-bit product into `(hi, lo)`.
#[allow(clippy::cast_possible_truncation)]
const fn split(value: u64) -> (u32, u32) {
    ((value >> 32) as u32, value as u32)
}

fn unary(op: UnaryOp, v: u32) -> u32 {
    match op {
        UnaryOp::Not => !v,
        UnaryOp::Neg => v.wrapping_neg(),
        UnaryOp::Sext8 => i32::from(v.to_le_bytes()[0].cast_signed()).cast_unsigned(),
        UnaryOp::Sext16 => {
            let [b0, b1, _, _] = v.to_le_bytes();
            i32::from(i16::from_le_bytes([b0, b1])).cast_unsigned()
        }
        UnaryOp::Clz => v.leading_zeros(),
        UnaryOp::Clo => v.leading_ones(),
        UnaryOp::Wsbh => ((v & 0x00FF_00FF) << 8) | ((v >> 8) & 0x00FF_00FF),
        UnaryOp::Wsbw => v.swap_bytes(),
        UnaryOp::Bitrev => v.reverse_bits(),
    }
}

fn binary(op: BinaryOp, l: u32, r: u32) -> u32 {
    let (sl, sr) = (l.cast_signed(), r.cast_signed());
    match op {
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Sub => l.wrapping_sub(r),
        BinaryOp::And => l & r,
        BinaryOp::Or => l | r,
        BinaryOp::Xor => l ^ r,
        BinaryOp::Nor => !(l | r),
        BinaryOp::Sll => l.wrapping_shl(r),
        BinaryOp::Srl => l.wrapping_shr(r),
        BinaryOp::Sra => sl.wrapping_shr(r).cast_unsigned(),
        BinaryOp::Rotr => l.rotate_right(r & 31),
        BinaryOp::Eq => u32::from(l == r),
        BinaryOp::Ne => u32::from(l != r),
        BinaryOp::Lt => u32::from(sl < sr),
        BinaryOp::Ltu => u32::from(l < r),
        BinaryOp::Le => u32::from(sl <= sr),
        BinaryOp::Gt => u32::from(sl > sr),
        BinaryOp::Ge => u32::from(sl >= sr),
        BinaryOp::Min => sl.min(sr).cast_unsigned(),
        BinaryOp::Max => sl.max(sr).cast_unsigned(),
    }
}
