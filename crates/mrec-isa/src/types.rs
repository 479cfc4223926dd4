//! Core types for the Allegrex ISA.

use std::fmt::{self, Display};

/// Closed identifier for every instruction type the decode table knows.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Op {
    Unknown,
    // Shifts
    Sll,
    Srl,
    Sra,
    Rotr,
    Sllv,
    Srlv,
    Srav,
    Rotrv,
    // Register ALU
    Add,
    Addu,
    Sub,
    Subu,
    And,
    Or,
    Xor,
    Nor,
    Slt,
    Sltu,
    Max,
    Min,
    Movz,
    Movn,
    Clz,
    Clo,
    // HI/LO
    Mfhi,
    Mthi,
    Mflo,
    Mtlo,
    Mult,
    Multu,
    Div,
    Divu,
    Madd,
    Maddu,
    Msub,
    Msubu,
    // Immediate ALU
    Addi,
    Addiu,
    Slti,
    Sltiu,
    Andi,
    Ori,
    Xori,
    Lui,
    // Bit manipulation
    Ext,
    Ins,
    Wsbh,
    Wsbw,
    Seb,
    Seh,
    Bitrev,
    // Loads and stores
    Lb,
    Lbu,
    Lh,
    Lhu,
    Lw,
    Lwl,
    Lwr,
    Ll,
    Sb,
    Sh,
    Sw,
    Swl,
    Swr,
    Sc,
    // Branches and jumps
    Beq,
    Bne,
    Blez,
    Bgtz,
    Bltz,
    Bgez,
    Bltzal,
    Bgezal,
    Beql,
    Bnel,
    Blezl,
    Bgtzl,
    Bltzl,
    Bgezl,
    Bltzall,
    Bgezall,
    J,
    Jal,
    Jr,
    Jalr,
    // System
    Syscall,
    Break,
    Sync,
    Cache,
    Halt,
}

/// Operand layout, used by the disassembler.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Format {
    None,
    /// `rd, rs, rt`
    RdRsRt,
    /// `rd, rt, sa`
    RdRtSa,
    /// `rd, rt, rs`
    RdRtRs,
    /// `rd, rs`
    RdRs,
    /// `rd, rt`
    RdRt,
    /// `rd`
    Rd,
    /// `rs`
    Rs,
    /// `rs, rt`
    RsRt,
    /// `rt, rs, simm`
    RtRsImm,
    /// `rt, rs, uimm`
    RtRsUImm,
    /// `rt, uimm`
    RtUImm,
    /// `rs, rt, target`
    RsRtOff,
    /// `rs, target`
    RsOff,
    /// `target`
    Target,
    /// `rt, simm(rs)`
    RtMem,
    /// `code`
    Code,
    /// `rt, rs, pos, size`
    BitField,
}

/// Instruction type descriptor: the classifier's answer for an encoding.
///
/// Descriptors are `'static` and shared by every decode of the same pattern.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct InstructionType {
    /// Mnemonic, stable across releases.
    pub name: &'static str,
    pub op: Op,
    /// A word matches when `word & mask == value`.
    pub mask: u32,
    pub value: u32,
    pub format: Format,
    /// Branch or jump whose effect commits one instruction later.
    pub has_delayed_branch: bool,
    /// Delay slot is squashed when the branch is not taken.
    pub is_likely: bool,
    pub is_syscall: bool,
    /// Ends the block without a delay slot.
    pub is_break: bool,
}

impl InstructionType {
    #[must_use]
    pub const fn new(name: &'static str, op: Op, mask: u32, value: u32, format: Format) -> Self {
        Self {
            name,
            op,
            mask,
            value,
            format,
            has_delayed_branch: false,
            is_likely: false,
            is_syscall: false,
            is_break: false,
        }
    }

    /// Mark as a delayed branch.
    #[must_use]
    pub const fn delayed(mut self) -> Self {
        self.has_delayed_branch = true;
        self
    }

    /// Mark as a likely (squashing) delayed branch.
    #[must_use]
    pub const fn likely(mut self) -> Self {
        self.has_delayed_branch = true;
        self.is_likely = true;
        self
    }

    /// Mark as a system call.
    #[must_use]
    pub const fn syscall(mut self) -> Self {
        self.is_syscall = true;
        self
    }

    /// Mark as a block-ending stop instruction.
    #[must_use]
    pub const fn stop(mut self) -> Self {
        self.is_break = true;
        self
    }

    /// Check if `word` is an encoding of this type.
    #[must_use]
    pub const fn matches(&self, word: u32) -> bool {
        word & self.mask == self.value
    }
}

impl Display for InstructionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Descriptor for encodings no table entry matches.
pub static UNKNOWN: InstructionType = InstructionType::new("unknown", Op::Unknown, 0, 0, Format::None);

/// A raw guest instruction word and the address it was fetched from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Instruction {
    pub word: u32,
    pub pc: u32,
}

impl Instruction {
    #[must_use]
    pub const fn new(word: u32, pc: u32) -> Self {
        Self { word, pc }
    }

    /// Fetch the word at `pc`.
    pub fn fetch<M: MemoryReader + ?Sized>(memory: &M, pc: u32) -> Self {
        Self::new(memory.read_word(pc), pc)
    }

    #[must_use]
    pub const fn opcode(&self) -> u32 {
        self.word >> 26
    }

    #[must_use]
    pub const fn rs(&self) -> u8 {
        ((self.word >> 21) & 0x1F) as u8
    }

    #[must_use]
    pub const fn rt(&self) -> u8 {
        ((self.word >> 16) & 0x1F) as u8
    }

    #[must_use]
    pub const fn rd(&self) -> u8 {
        ((self.word >> 11) & 0x1F) as u8
    }

    #[must_use]
    pub const fn sa(&self) -> u32 {
        (self.word >> 6) & 0x1F
    }

    #[must_use]
    pub const fn funct(&self) -> u32 {
        self.word & 0x3F
    }

    /// Low 16 bits, zero-extended.
    #[must_use]
    pub const fn uimm16(&self) -> u32 {
        self.word & 0xFFFF
    }

    /// Low 16 bits, sign-extended.
    #[must_use]
    pub const fn simm16(&self) -> i32 {
        (self.word & 0xFFFF) as u16 as i16 as i32
    }

    /// Low 16 bits, sign-extended, as an unsigned word.
    #[must_use]
    pub const fn simm16_u32(&self) -> u32 {
        self.simm16().cast_unsigned()
    }

    #[must_use]
    pub const fn target26(&self) -> u32 {
        self.word & 0x03FF_FFFF
    }

    /// Code field of `syscall` and `break`.
    #[must_use]
    pub const fn code20(&self) -> u32 {
        (self.word >> 6) & 0x000F_FFFF
    }

    /// Bit position of `ext`/`ins`.
    #[must_use]
    pub const fn pos(&self) -> u32 {
        self.sa()
    }

    /// Field size of `ext` (msbd + 1).
    #[must_use]
    pub const fn ext_size(&self) -> u32 {
        self.rd() as u32 + 1
    }

    /// Field size of `ins` (msb - lsb + 1).
    #[must_use]
    pub const fn ins_size(&self) -> u32 {
        (self.rd() as u32 + 1).saturating_sub(self.pos())
    }

    /// Address of the delay slot.
    #[must_use]
    pub const fn delay_slot_pc(&self) -> u32 {
        self.pc.wrapping_add(4)
    }

    /// PC-relative branch target.
    #[must_use]
    pub const fn branch_target(&self) -> u32 {
        self.pc
            .wrapping_add(4)
            .wrapping_add(self.simm16_u32().wrapping_shl(2))
    }

    /// Region-absolute jump target.
    #[must_use]
    pub const fn jump_target(&self) -> u32 {
        (self.pc.wrapping_add(4) & 0xF000_0000) | (self.target26() << 2)
    }
}

/// An instruction paired with its type descriptor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DecodedInstruction {
    pub instruction: Instruction,
    pub ty: &'static InstructionType,
}

impl DecodedInstruction {
    #[must_use]
    pub const fn new(instruction: Instruction, ty: &'static InstructionType) -> Self {
        Self { instruction, ty }
    }

    /// Instruction-type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.ty.name
    }

    #[must_use]
    pub const fn op(&self) -> Op {
        self.ty.op
    }

    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.instruction.pc
    }
}

/// Word-addressable read of the guest image.
pub trait MemoryReader {
    /// Read the little-endian word at `address`.
    fn read_word(&self, address: u32) -> u32;
}

impl<M: MemoryReader + ?Sized> MemoryReader for &M {
    fn read_word(&self, address: u32) -> u32 {
        (**self).read_word(address)
    }
}

impl<M: MemoryReader + ?Sized> MemoryReader for std::sync::Arc<M> {
    fn read_word(&self, address: u32) -> u32 {
        (**self).read_word(address)
    }
}

// Register ABI names
pub const REG_ZERO: u8 = 0;
pub const REG_AT: u8 = 1;
pub const REG_V0: u8 = 2;
pub const REG_V1: u8 = 3;
pub const REG_A0: u8 = 4;
pub const REG_A1: u8 = 5;
pub const REG_A2: u8 = 6;
pub const REG_A3: u8 = 7;
pub const REG_T0: u8 = 8;
pub const REG_S0: u8 = 16;
pub const REG_GP: u8 = 28;
pub const REG_SP: u8 = 29;
pub const REG_FP: u8 = 30;
pub const REG_RA: u8 = 31;

/// Number of general-purpose registers.
pub const NUM_GPRS: usize = 32;

/// Get register ABI name.
#[must_use]
pub const fn reg_name(reg: u8) -> &'static str {
    match reg {
        0 => "zero",
        1 => "at",
        2 => "v0",
        3 => "v1",
        4 => "a0",
        5 => "a1",
        6 => "a2",
        7 => "a3",
        8 => "t0",
        9 => "t1",
        10 => "t2",
        11 => "t3",
        12 => "t4",
        13 => "t5",
        14 => "t6",
        15 => "t7",
        16 => "s0",
        17 => "s1",
        18 => "s2",
        19 => "s3",
        20 => "s4",
        21 => "s5",
        22 => "s6",
        23 => "s7",
        24 => "t8",
        25 => "t9",
        26 => "k0",
        27 => "k1",
        28 => "gp",
        29 => "sp",
        30 => "fp",
        31 => "ra",
        _ => "??",
    }
}
