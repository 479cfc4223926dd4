//! IR dump: human-readable text for expressions, statements and blocks.

use std::fmt::{self, Display, Formatter};

use crate::block::BlockIR;
use crate::expr::{BinaryOp, Expr, ReadExpr, TernaryOp, UnaryOp};
use crate::stmt::{HiLoOp, Place, Stmt};

const fn unary_name(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Not => "not",
        UnaryOp::Neg => "neg",
        UnaryOp::Sext8 => "sext8",
        UnaryOp::Sext16 => "sext16",
        UnaryOp::Clz => "clz",
        UnaryOp::Clo => "clo",
        UnaryOp::Wsbh => "wsbh",
        UnaryOp::Wsbw => "wsbw",
        UnaryOp::Bitrev => "bitrev",
    }
}

const fn binary_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::And => "&",
        BinaryOp::Or => "|",
        BinaryOp::Xor => "^",
        BinaryOp::Nor => "nor",
        BinaryOp::Sll => "<<",
        BinaryOp::Srl => ">>u",
        BinaryOp::Sra => ">>s",
        BinaryOp::Rotr => "rotr",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<s",
        BinaryOp::Ltu => "<u",
        BinaryOp::Le => "<=s",
        BinaryOp::Gt => ">s",
        BinaryOp::Ge => ">=s",
        BinaryOp::Min => "min",
        BinaryOp::Max => "max",
    }
}

const fn hilo_name(op: HiLoOp) -> &'static str {
    match op {
        HiLoOp::Mult => "mult",
        HiLoOp::MultU => "multu",
        HiLoOp::Div => "div",
        HiLoOp::DivU => "divu",
        HiLoOp::Madd => "madd",
        HiLoOp::MaddU => "maddu",
        HiLoOp::Msub => "msub",
        HiLoOp::MsubU => "msubu",
    }
}

impl Display for Place {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reg(r) => write!(f, "r{r}"),
            Self::Hi => f.write_str("hi"),
            Self::Lo => f.write_str("lo"),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imm(v) => write!(f, "{v:#x}"),
            Self::Read(read) => match read {
                ReadExpr::Reg(r) => write!(f, "r{r}"),
                ReadExpr::Hi => f.write_str("hi"),
                ReadExpr::Lo => f.write_str("lo"),
                ReadExpr::BranchFlag => f.write_str("branch_flag"),
                ReadExpr::Mem {
                    addr,
                    width,
                    signed,
                } => {
                    let sign = if *signed { 's' } else { 'u' };
                    write!(f, "mem{sign}{}[{addr}]", u32::from(*width) * 8)
                }
            },
            Self::Unary { op, expr } => write!(f, "{}({expr})", unary_name(*op)),
            Self::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", binary_symbol(*op))
            }
            Self::Ternary {
                op: TernaryOp::Select,
                first,
                second,
                third,
            } => write!(f, "({first} ? {second} : {third})"),
        }
    }
}

fn write_indent(f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("    ")?;
    }
    Ok(())
}

fn write_stmts(f: &mut Formatter<'_>, stmts: &[Stmt], depth: usize) -> fmt::Result {
    for stmt in stmts {
        write_stmt(f, stmt, depth)?;
    }
    Ok(())
}

fn write_stmt(f: &mut Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    match stmt {
        Stmt::Seq(stmts) => return write_stmts(f, stmts, depth),
        Stmt::If {
            cond,
            then_stmts,
            else_stmts,
        } => {
            write_indent(f, depth)?;
            writeln!(f, "if {cond} {{")?;
            write_stmts(f, then_stmts, depth + 1)?;
            if !else_stmts.is_empty() {
                write_indent(f, depth)?;
                writeln!(f, "}} else {{")?;
                write_stmts(f, else_stmts, depth + 1)?;
            }
            write_indent(f, depth)?;
            return writeln!(f, "}}");
        }
        Stmt::Likely { likely, body } => {
            write_indent(f, depth)?;
            if *likely {
                writeln!(f, "if branch_flag {{")?;
                write_stmt(f, body, depth + 1)?;
                write_indent(f, depth)?;
                return writeln!(f, "}}");
            }
            writeln!(f, "delay_slot:")?;
            return write_stmt(f, body, depth + 1);
        }
        _ => {}
    }

    write_indent(f, depth)?;
    match stmt {
        Stmt::FunctionPrefix => writeln!(f, "prologue"),
        Stmt::Nop => writeln!(f, "nop"),
        Stmt::Write { place, value } => writeln!(f, "{place} = {value}"),
        Stmt::WriteMem { addr, value, width } => {
            writeln!(f, "mem{}[{addr}] = {value}", u32::from(*width) * 8)
        }
        Stmt::HiLo { op, left, right } => {
            writeln!(f, "hi:lo = {}({left}, {right})", hilo_name(*op))
        }
        Stmt::Branch { cond, target } => writeln!(f, "branch {target} if {cond}"),
        Stmt::Syscall { code } => writeln!(f, "syscall {code:#x}"),
        Stmt::Break { code } => writeln!(f, "break {code:#x}"),
        Stmt::PostBranch { next_pc } => writeln!(f, "post_branch else {next_pc:#010x}"),
        Stmt::StorePc { pc } => writeln!(f, "pc = {pc:#010x}"),
        Stmt::Seq(_) | Stmt::If { .. } | Stmt::Likely { .. } => Ok(()),
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_stmt(f, self, 0)
    }
}

impl Display for BlockIR {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "block_{:08x}: ; {:#010x}..{:#010x}, {} instructions",
            self.start_pc, self.start_pc, self.end_pc, self.guest_instructions
        )?;
        write_stmts(f, &self.stmts, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_display() {
        let expr = Expr::add(Expr::reg(4), Expr::imm(16));
        assert_eq!(expr.to_string(), "(r4 + 0x10)");
        let load = Expr::mem_s(Expr::reg(29), 2);
        assert_eq!(load.to_string(), "mems16[r29]");
    }

    #[test]
    fn test_block_display() {
        let mut block = BlockIR::new(0x0880_0000);
        block.push(Stmt::FunctionPrefix);
        block.push(Stmt::write_reg(2, Expr::imm(1)));
        block.push(Stmt::likely(true, Stmt::write_reg(3, Expr::reg(2))));
        block.push(Stmt::PostBranch {
            next_pc: 0x0880_0008,
        });
        block.cover(0x0880_0000);
        block.cover(0x0880_0004);

        let text = block.to_string();
        assert!(text.starts_with("block_08800000:"));
        assert!(text.contains("    prologue\n"));
        assert!(text.contains("    r2 = 0x1\n"));
        assert!(text.contains("    if branch_flag {\n        r3 = r2\n    }\n"));
        assert!(text.contains("post_branch else 0x08800008"));
    }
}
