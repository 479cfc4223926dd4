//! Translation of decoded Allegrex instructions into IR statements.

use mrec_ir::{Expr, HiLoOp, Stmt};

use crate::error::TranslateError;
use crate::types::{DecodedInstruction, Instruction, Op, REG_RA};

/// Produces the IR for one decoded instruction.
///
/// A translation is a single statement; several effects are wrapped in
/// `Stmt::Seq`. Translators never touch the PC directly: branches record
/// their outcome and the block generator commits it after the delay slot.
pub trait SemanticTranslator {
    /// Translate one instruction.
    ///
    /// # Errors
    ///
    /// Returns `TranslateError::NotImplemented` for instruction types with no
    /// known semantics.
    fn translate(&self, decoded: &DecodedInstruction) -> Result<Stmt, TranslateError>;
}

impl<T: SemanticTranslator + ?Sized> SemanticTranslator for &T {
    fn translate(&self, decoded: &DecodedInstruction) -> Result<Stmt, TranslateError> {
        (**self).translate(decoded)
    }
}

/// Translator for the Allegrex integer core.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllegrexTranslator;

impl AllegrexTranslator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SemanticTranslator for AllegrexTranslator {
    fn translate(&self, decoded: &DecodedInstruction) -> Result<Stmt, TranslateError> {
        let i = &decoded.instruction;
        let stmt = match decoded.op() {
            Op::Sll => shift_imm(i, Expr::sll),
            Op::Srl => shift_imm(i, Expr::srl),
            Op::Sra => shift_imm(i, Expr::sra),
            Op::Rotr => shift_imm(i, Expr::rotr),
            Op::Sllv => shift_var(i, Expr::sll),
            Op::Srlv => shift_var(i, Expr::srl),
            Op::Srav => shift_var(i, Expr::sra),
            Op::Rotrv => shift_var(i, Expr::rotr),

            // Allegrex never raises overflow exceptions.
            Op::Add | Op::Addu => alu_r(i, Expr::add),
            Op::Sub | Op::Subu => alu_r(i, Expr::sub),
            Op::And => alu_r(i, Expr::and),
            Op::Or => alu_r(i, Expr::or),
            Op::Xor => alu_r(i, Expr::xor),
            Op::Nor => alu_r(i, Expr::nor),
            Op::Slt => alu_r(i, Expr::lt),
            Op::Sltu => alu_r(i, Expr::ltu),
            Op::Max => alu_r(i, Expr::max),
            Op::Min => alu_r(i, Expr::min),
            Op::Movz => conditional_move(i, Expr::eq),
            Op::Movn => conditional_move(i, Expr::ne),
            Op::Clz => Stmt::write_reg(i.rd(), Expr::clz(Expr::reg(i.rs()))),
            Op::Clo => Stmt::write_reg(i.rd(), Expr::clo(Expr::reg(i.rs()))),

            Op::Mfhi => Stmt::write_reg(i.rd(), Expr::hi()),
            Op::Mflo => Stmt::write_reg(i.rd(), Expr::lo()),
            Op::Mthi => Stmt::write_hi(Expr::reg(i.rs())),
            Op::Mtlo => Stmt::write_lo(Expr::reg(i.rs())),
            Op::Mult => hilo(i, HiLoOp::Mult),
            Op::Multu => hilo(i, HiLoOp::MultU),
            Op::Div => hilo(i, HiLoOp::Div),
            Op::Divu => hilo(i, HiLoOp::DivU),
            Op::Madd => hilo(i, HiLoOp::Madd),
            Op::Maddu => hilo(i, HiLoOp::MaddU),
            Op::Msub => hilo(i, HiLoOp::Msub),
            Op::Msubu => hilo(i, HiLoOp::MsubU),

            Op::Addi | Op::Addiu => alu_i(i, Expr::add, i.simm16_u32()),
            Op::Slti => alu_i(i, Expr::lt, i.simm16_u32()),
            Op::Sltiu => alu_i(i, Expr::ltu, i.simm16_u32()),
            Op::Andi => alu_i(i, Expr::and, i.uimm16()),
            Op::Ori => alu_i(i, Expr::or, i.uimm16()),
            Op::Xori => alu_i(i, Expr::xor, i.uimm16()),
            Op::Lui => Stmt::write_reg(i.rt(), Expr::imm(i.uimm16() << 16)),

            Op::Ext => ext(i),
            Op::Ins => ins(i),
            Op::Wsbh => Stmt::write_reg(i.rd(), Expr::wsbh(Expr::reg(i.rt()))),
            Op::Wsbw => Stmt::write_reg(i.rd(), Expr::wsbw(Expr::reg(i.rt()))),
            Op::Seb => Stmt::write_reg(i.rd(), Expr::sext8(Expr::reg(i.rt()))),
            Op::Seh => Stmt::write_reg(i.rd(), Expr::sext16(Expr::reg(i.rt()))),
            Op::Bitrev => Stmt::write_reg(i.rd(), Expr::bitrev(Expr::reg(i.rt()))),

            Op::Lb => load(i, 1, true),
            Op::Lbu => load(i, 1, false),
            Op::Lh => load(i, 2, true),
            Op::Lhu => load(i, 2, false),
            Op::Lw | Op::Ll => load(i, 4, false),
            Op::Lwl => load_left(i),
            Op::Lwr => load_right(i),
            Op::Sb => store(i, 1),
            Op::Sh => store(i, 2),
            Op::Sw => store(i, 4),
            Op::Swl => store_left(i),
            Op::Swr => store_right(i),
            Op::Sc => Stmt::seq(vec![store(i, 4), Stmt::write_reg(i.rt(), Expr::imm(1))]),

            Op::Beq | Op::Beql => branch(i, Expr::eq(Expr::reg(i.rs()), Expr::reg(i.rt()))),
            Op::Bne | Op::Bnel => branch(i, Expr::ne(Expr::reg(i.rs()), Expr::reg(i.rt()))),
            Op::Blez | Op::Blezl => branch(i, Expr::le(Expr::reg(i.rs()), Expr::imm(0))),
            Op::Bgtz | Op::Bgtzl => branch(i, Expr::gt(Expr::reg(i.rs()), Expr::imm(0))),
            Op::Bltz | Op::Bltzl => branch(i, Expr::lt(Expr::reg(i.rs()), Expr::imm(0))),
            Op::Bgez | Op::Bgezl => branch(i, Expr::ge(Expr::reg(i.rs()), Expr::imm(0))),
            Op::Bltzal | Op::Bltzall => Stmt::seq(vec![
                branch(i, Expr::lt(Expr::reg(i.rs()), Expr::imm(0))),
                link(i, REG_RA),
            ]),
            Op::Bgezal | Op::Bgezall => Stmt::seq(vec![
                branch(i, Expr::ge(Expr::reg(i.rs()), Expr::imm(0))),
                link(i, REG_RA),
            ]),
            Op::J => Stmt::branch(Expr::imm(1), Expr::imm(i.jump_target())),
            Op::Jal => Stmt::seq(vec![
                Stmt::branch(Expr::imm(1), Expr::imm(i.jump_target())),
                link(i, REG_RA),
            ]),
            Op::Jr => Stmt::branch(Expr::imm(1), Expr::reg(i.rs())),
            // The target is read before the link so `jalr $ra, $ra` jumps to the old value.
            Op::Jalr => Stmt::seq(vec![
                Stmt::branch(Expr::imm(1), Expr::reg(i.rs())),
                link(i, i.rd()),
            ]),

            Op::Syscall => Stmt::Syscall { code: i.code20() },
            Op::Break => Stmt::Break { code: i.code20() },
            Op::Halt => Stmt::Break { code: 0 },
            Op::Sync | Op::Cache => Stmt::Nop,

            Op::Unknown => {
                return Err(TranslateError::NotImplemented {
                    name: decoded.name(),
                    address: decoded.pc(),
                });
            }
        };
        Ok(stmt)
    }
}

fn alu_r<F>(i: &Instruction, op: F) -> Stmt
where
    F: FnOnce(Expr, Expr) -> Expr,
{
    Stmt::write_reg(i.rd(), op(Expr::reg(i.rs()), Expr::reg(i.rt())))
}

fn alu_i<F>(i: &Instruction, op: F, imm: u32) -> Stmt
where
    F: FnOnce(Expr, Expr) -> Expr,
{
    Stmt::write_reg(i.rt(), op(Expr::reg(i.rs()), Expr::imm(imm)))
}

fn shift_imm<F>(i: &Instruction, op: F) -> Stmt
where
    F: FnOnce(Expr, Expr) -> Expr,
{
    Stmt::write_reg(i.rd(), op(Expr::reg(i.rt()), Expr::imm(i.sa())))
}

/// Variable shifts use the low five bits of `rs`.
fn shift_var<F>(i: &Instruction, op: F) -> Stmt
where
    F: FnOnce(Expr, Expr) -> Expr,
{
    let amount = Expr::and(Expr::reg(i.rs()), Expr::imm(0x1F));
    Stmt::write_reg(i.rd(), op(Expr::reg(i.rt()), amount))
}

fn conditional_move<F>(i: &Instruction, test: F) -> Stmt
where
    F: FnOnce(Expr, Expr) -> Expr,
{
    if i.rd() == 0 {
        return Stmt::Nop;
    }
    Stmt::if_then(
        test(Expr::reg(i.rt()), Expr::imm(0)),
        vec![Stmt::write_reg(i.rd(), Expr::reg(i.rs()))],
    )
}

fn hilo(i: &Instruction, op: HiLoOp) -> Stmt {
    Stmt::hilo(op, Expr::reg(i.rs()), Expr::reg(i.rt()))
}

const fn field_mask(size: u32) -> u32 {
    if size >= 32 { u32::MAX } else { (1 << size) - 1 }
}

fn ext(i: &Instruction) -> Stmt {
    let mask = field_mask(i.ext_size());
    let value = Expr::and(Expr::srl(Expr::reg(i.rs()), Expr::imm(i.pos())), Expr::imm(mask));
    Stmt::write_reg(i.rt(), value)
}

fn ins(i: &Instruction) -> Stmt {
    let pos = i.pos();
    let mask = field_mask(i.ins_size());
    let kept = Expr::and(Expr::reg(i.rt()), Expr::imm(!(mask.wrapping_shl(pos))));
    let inserted = Expr::sll(Expr::and(Expr::reg(i.rs()), Expr::imm(mask)), Expr::imm(pos));
    Stmt::write_reg(i.rt(), Expr::or(kept, inserted))
}

fn effective_address(i: &Instruction) -> Expr {
    Expr::add(Expr::reg(i.rs()), Expr::imm(i.simm16_u32()))
}

fn load(i: &Instruction, width: u8, signed: bool) -> Stmt {
    Stmt::write_reg(i.rt(), Expr::mem(effective_address(i), width, signed))
}

fn store(i: &Instruction, width: u8) -> Stmt {
    Stmt::write_mem(effective_address(i), Expr::reg(i.rt()), width)
}

/// Aligned word address and the bit offset of the byte within it.
fn unaligned_parts(i: &Instruction) -> (Expr, Expr) {
    let addr = effective_address(i);
    let aligned = Expr::and(addr.clone(), Expr::imm(!3));
    let bit_offset = Expr::sll(Expr::and(addr, Expr::imm(3)), Expr::imm(3));
    (aligned, bit_offset)
}

fn load_left(i: &Instruction) -> Stmt {
    let (aligned, shift) = unaligned_parts(i);
    let kept = Expr::and(
        Expr::reg(i.rt()),
        Expr::srl(Expr::imm(0x00FF_FFFF), shift.clone()),
    );
    let loaded = Expr::sll(Expr::mem_u(aligned, 4), Expr::sub(Expr::imm(24), shift));
    Stmt::write_reg(i.rt(), Expr::or(kept, loaded))
}

fn load_right(i: &Instruction) -> Stmt {
    let (aligned, shift) = unaligned_parts(i);
    let kept = Expr::and(
        Expr::reg(i.rt()),
        Expr::sll(Expr::imm(0xFFFF_FF00), Expr::sub(Expr::imm(24), shift.clone())),
    );
    let loaded = Expr::srl(Expr::mem_u(aligned, 4), shift);
    Stmt::write_reg(i.rt(), Expr::or(kept, loaded))
}

fn store_left(i: &Instruction) -> Stmt {
    let (aligned, shift) = unaligned_parts(i);
    let kept = Expr::and(
        Expr::mem_u(aligned.clone(), 4),
        Expr::sll(Expr::imm(0xFFFF_FF00), shift.clone()),
    );
    let stored = Expr::srl(Expr::reg(i.rt()), Expr::sub(Expr::imm(24), shift));
    Stmt::write_mem(aligned, Expr::or(kept, stored), 4)
}

fn store_right(i: &Instruction) -> Stmt {
    let (aligned, shift) = unaligned_parts(i);
    let kept = Expr::and(
        Expr::mem_u(aligned.clone(), 4),
        Expr::srl(Expr::imm(0x00FF_FFFF), Expr::sub(Expr::imm(24), shift.clone())),
    );
    let stored = Expr::sll(Expr::reg(i.rt()), shift);
    Stmt::write_mem(aligned, Expr::or(kept, stored), 4)
}

fn branch(i: &Instruction, cond: Expr) -> Stmt {
    Stmt::branch(cond, Expr::imm(i.branch_target()))
}

/// Return address: past the delay slot.
fn link(i: &Instruction, reg: u8) -> Stmt {
    Stmt::write_reg(reg, Expr::imm(i.pc.wrapping_add(8)))
}

#[cfg(test)]
mod tests;
