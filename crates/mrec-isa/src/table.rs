//! Allegrex decode table and the opcode classifier built on it.

use tracing::trace;

use crate::types::{Format, InstructionType, Op, UNKNOWN};

/// Resolves a raw word (and its address) to an instruction type.
///
/// Implementations must be total: encodings they do not know map to an
/// "unknown" descriptor rather than failing.
pub trait InstructionClassifier: Send + Sync {
    fn classify(&self, word: u32, address: u32) -> &'static InstructionType;
}

impl<C: InstructionClassifier + ?Sized> InstructionClassifier for &C {
    fn classify(&self, word: u32, address: u32) -> &'static InstructionType {
        (**self).classify(word, address)
    }
}

const SPECIAL: u32 = 0xFC00_003F;
const SPECIAL_3R: u32 = 0xFC00_07FF;
const SPECIAL_SHIFT: u32 = 0xFFE0_003F;
const SPECIAL_HILO: u32 = 0xFC00_FFFF;
const REGIMM: u32 = 0xFC1F_0000;
const PRIMARY: u32 = 0xFC00_0000;
const BSHFL: u32 = 0xFFE0_07FF;

const fn special(funct: u32) -> u32 {
    funct
}

const fn regimm(rt: u32) -> u32 {
    0x0400_0000 | (rt << 16)
}

const fn primary(op: u32) -> u32 {
    op << 26
}

const fn bshfl(sa: u32) -> u32 {
    0x7C00_0020 | (sa << 6)
}

/// All known Allegrex integer-core encodings.
pub static INSTRUCTIONS: &[InstructionType] = &[
    // SPECIAL shifts
    InstructionType::new("sll", Op::Sll, SPECIAL_SHIFT, special(0x00), Format::RdRtSa),
    InstructionType::new("srl", Op::Srl, SPECIAL_SHIFT, special(0x02), Format::RdRtSa),
    InstructionType::new("rotr", Op::Rotr, SPECIAL_SHIFT, 0x0020_0000 | special(0x02), Format::RdRtSa),
    InstructionType::new("sra", Op::Sra, SPECIAL_SHIFT, special(0x03), Format::RdRtSa),
    InstructionType::new("sllv", Op::Sllv, SPECIAL_3R, special(0x04), Format::RdRtRs),
    InstructionType::new("srlv", Op::Srlv, SPECIAL_3R, special(0x06), Format::RdRtRs),
    InstructionType::new("rotrv", Op::Rotrv, SPECIAL_3R, 0x40 | special(0x06), Format::RdRtRs),
    InstructionType::new("srav", Op::Srav, SPECIAL_3R, special(0x07), Format::RdRtRs),
    // SPECIAL jumps and system
    InstructionType::new("jr", Op::Jr, 0xFC1F_FFFF, special(0x08), Format::Rs).delayed(),
    InstructionType::new("jalr", Op::Jalr, 0xFC1F_07FF, special(0x09), Format::RdRs).delayed(),
    InstructionType::new("movz", Op::Movz, SPECIAL_3R, special(0x0A), Format::RdRsRt),
    InstructionType::new("movn", Op::Movn, SPECIAL_3R, special(0x0B), Format::RdRsRt),
    InstructionType::new("syscall", Op::Syscall, SPECIAL, special(0x0C), Format::Code).syscall(),
    InstructionType::new("break", Op::Break, SPECIAL, special(0x0D), Format::Code).stop(),
    InstructionType::new("sync", Op::Sync, 0xFFFF_F83F, special(0x0F), Format::None),
    // SPECIAL HI/LO
    InstructionType::new("mfhi", Op::Mfhi, 0xFFFF_07FF, special(0x10), Format::Rd),
    InstructionType::new("mthi", Op::Mthi, 0xFC1F_FFFF, special(0x11), Format::Rs),
    InstructionType::new("mflo", Op::Mflo, 0xFFFF_07FF, special(0x12), Format::Rd),
    InstructionType::new("mtlo", Op::Mtlo, 0xFC1F_FFFF, special(0x13), Format::Rs),
    InstructionType::new("clz", Op::Clz, 0xFC1F_07FF, special(0x16), Format::RdRs),
    InstructionType::new("clo", Op::Clo, 0xFC1F_07FF, special(0x17), Format::RdRs),
    InstructionType::new("mult", Op::Mult, SPECIAL_HILO, special(0x18), Format::RsRt),
    InstructionType::new("multu", Op::Multu, SPECIAL_HILO, special(0x19), Format::RsRt),
    InstructionType::new("div", Op::Div, SPECIAL_HILO, special(0x1A), Format::RsRt),
    InstructionType::new("divu", Op::Divu, SPECIAL_HILO, special(0x1B), Format::RsRt),
    InstructionType::new("madd", Op::Madd, SPECIAL_HILO, special(0x1C), Format::RsRt),
    InstructionType::new("maddu", Op::Maddu, SPECIAL_HILO, special(0x1D), Format::RsRt),
    InstructionType::new("msub", Op::Msub, SPECIAL_HILO, special(0x2E), Format::RsRt),
    InstructionType::new("msubu", Op::Msubu, SPECIAL_HILO, special(0x2F), Format::RsRt),
    // SPECIAL ALU
    InstructionType::new("add", Op::Add, SPECIAL_3R, special(0x20), Format::RdRsRt),
    InstructionType::new("addu", Op::Addu, SPECIAL_3R, special(0x21), Format::RdRsRt),
    InstructionType::new("sub", Op::Sub, SPECIAL_3R, special(0x22), Format::RdRsRt),
    InstructionType::new("subu", Op::Subu, SPECIAL_3R, special(0x23), Format::RdRsRt),
    InstructionType::new("and", Op::And, SPECIAL_3R, special(0x24), Format::RdRsRt),
    InstructionType::new("or", Op::Or, SPECIAL_3R, special(0x25), Format::RdRsRt),
    InstructionType::new("xor", Op::Xor, SPECIAL_3R, special(0x26), Format::RdRsRt),
    InstructionType::new("nor", Op::Nor, SPECIAL_3R, special(0x27), Format::RdRsRt),
    InstructionType::new("slt", Op::Slt, SPECIAL_3R, special(0x2A), Format::RdRsRt),
    InstructionType::new("sltu", Op::Sltu, SPECIAL_3R, special(0x2B), Format::RdRsRt),
    InstructionType::new("max", Op::Max, SPECIAL_3R, special(0x2C), Format::RdRsRt),
    InstructionType::new("min", Op::Min, SPECIAL_3R, special(0x2D), Format::RdRsRt),
    // REGIMM branches
    InstructionType::new("bltz", Op::Bltz, REGIMM, regimm(0x00), Format::RsOff).delayed(),
    InstructionType::new("bgez", Op::Bgez, REGIMM, regimm(0x01), Format::RsOff).delayed(),
    InstructionType::new("bltzl", Op::Bltzl, REGIMM, regimm(0x02), Format::RsOff).likely(),
    InstructionType::new("bgezl", Op::Bgezl, REGIMM, regimm(0x03), Format::RsOff).likely(),
    InstructionType::new("bltzal", Op::Bltzal, REGIMM, regimm(0x10), Format::RsOff).delayed(),
    InstructionType::new("bgezal", Op::Bgezal, REGIMM, regimm(0x11), Format::RsOff).delayed(),
    InstructionType::new("bltzall", Op::Bltzall, REGIMM, regimm(0x12), Format::RsOff).likely(),
    InstructionType::new("bgezall", Op::Bgezall, REGIMM, regimm(0x13), Format::RsOff).likely(),
    // Jumps and branches
    InstructionType::new("j", Op::J, PRIMARY, primary(0x02), Format::Target).delayed(),
    InstructionType::new("jal", Op::Jal, PRIMARY, primary(0x03), Format::Target).delayed(),
    InstructionType::new("beq", Op::Beq, PRIMARY, primary(0x04), Format::RsRtOff).delayed(),
    InstructionType::new("bne", Op::Bne, PRIMARY, primary(0x05), Format::RsRtOff).delayed(),
    InstructionType::new("blez", Op::Blez, REGIMM, primary(0x06), Format::RsOff).delayed(),
    InstructionType::new("bgtz", Op::Bgtz, REGIMM, primary(0x07), Format::RsOff).delayed(),
    InstructionType::new("beql", Op::Beql, PRIMARY, primary(0x14), Format::RsRtOff).likely(),
    InstructionType::new("bnel", Op::Bnel, PRIMARY, primary(0x15), Format::RsRtOff).likely(),
    InstructionType::new("blezl", Op::Blezl, REGIMM, primary(0x16), Format::RsOff).likely(),
    InstructionType::new("bgtzl", Op::Bgtzl, REGIMM, primary(0x17), Format::RsOff).likely(),
    // Immediate ALU
    InstructionType::new("addi", Op::Addi, PRIMARY, primary(0x08), Format::RtRsImm),
    InstructionType::new("addiu", Op::Addiu, PRIMARY, primary(0x09), Format::RtRsImm),
    InstructionType::new("slti", Op::Slti, PRIMARY, primary(0x0A), Format::RtRsImm),
    InstructionType::new("sltiu", Op::Sltiu, PRIMARY, primary(0x0B), Format::RtRsImm),
    InstructionType::new("andi", Op::Andi, PRIMARY, primary(0x0C), Format::RtRsUImm),
    InstructionType::new("ori", Op::Ori, PRIMARY, primary(0x0D), Format::RtRsUImm),
    InstructionType::new("xori", Op::Xori, PRIMARY, primary(0x0E), Format::RtRsUImm),
    InstructionType::new("lui", Op::Lui, 0xFFE0_0000, primary(0x0F), Format::RtUImm),
    // SPECIAL2 / SPECIAL3
    InstructionType::new("halt", Op::Halt, 0xFFFF_FFFF, 0x7000_0000, Format::None).stop(),
    InstructionType::new("ext", Op::Ext, SPECIAL, 0x7C00_0000, Format::BitField),
    InstructionType::new("ins", Op::Ins, SPECIAL, 0x7C00_0004, Format::BitField),
    InstructionType::new("wsbh", Op::Wsbh, BSHFL, bshfl(0x02), Format::RdRt),
    InstructionType::new("wsbw", Op::Wsbw, BSHFL, bshfl(0x03), Format::RdRt),
    InstructionType::new("seb", Op::Seb, BSHFL, bshfl(0x10), Format::RdRt),
    InstructionType::new("bitrev", Op::Bitrev, BSHFL, bshfl(0x14), Format::RdRt),
    InstructionType::new("seh", Op::Seh, BSHFL, bshfl(0x18), Format::RdRt),
    // Loads and stores
    InstructionType::new("lb", Op::Lb, PRIMARY, primary(0x20), Format::RtMem),
    InstructionType::new("lh", Op::Lh, PRIMARY, primary(0x21), Format::RtMem),
    InstructionType::new("lwl", Op::Lwl, PRIMARY, primary(0x22), Format::RtMem),
    InstructionType::new("lw", Op::Lw, PRIMARY, primary(0x23), Format::RtMem),
    InstructionType::new("lbu", Op::Lbu, PRIMARY, primary(0x24), Format::RtMem),
    InstructionType::new("lhu", Op::Lhu, PRIMARY, primary(0x25), Format::RtMem),
    InstructionType::new("lwr", Op::Lwr, PRIMARY, primary(0x26), Format::RtMem),
    InstructionType::new("sb", Op::Sb, PRIMARY, primary(0x28), Format::RtMem),
    InstructionType::new("sh", Op::Sh, PRIMARY, primary(0x29), Format::RtMem),
    InstructionType::new("swl", Op::Swl, PRIMARY, primary(0x2A), Format::RtMem),
    InstructionType::new("sw", Op::Sw, PRIMARY, primary(0x2B), Format::RtMem),
    InstructionType::new("swr", Op::Swr, PRIMARY, primary(0x2E), Format::RtMem),
    InstructionType::new("cache", Op::Cache, PRIMARY, primary(0x2F), Format::None),
    InstructionType::new("ll", Op::Ll, PRIMARY, primary(0x30), Format::RtMem),
    InstructionType::new("sc", Op::Sc, PRIMARY, primary(0x38), Format::RtMem),
];

const NUM_OPCODES: usize = 64;

/// Decode table indexed by primary opcode.
///
/// Within an opcode bucket, entries with more fixed bits are tried first, so
/// `rotr` wins over `srl` and `sll` with a zero word still decodes as `sll`.
pub struct AllegrexTable {
    buckets: Vec<Vec<&'static InstructionType>>,
}

impl AllegrexTable {
    /// Build the table from the static instruction list.
    #[must_use]
    pub fn new() -> Self {
        Self::from_entries(INSTRUCTIONS)
    }

    /// Build a table from an arbitrary entry list.
    #[must_use]
    pub fn from_entries(entries: &'static [InstructionType]) -> Self {
        let mut buckets: Vec<Vec<&'static InstructionType>> = vec![Vec::new(); NUM_OPCODES];
        for entry in entries {
            let opcode = (entry.value >> 26) as usize;
            buckets[opcode].push(entry);
        }
        for bucket in &mut buckets {
            // Stable sort keeps declaration order among equally specific entries.
            bucket.sort_by_key(|entry| std::cmp::Reverse(entry.mask.count_ones()));
        }
        Self { buckets }
    }

    /// Look up the entry for `word`, if any.
    #[must_use]
    pub fn find(&self, word: u32) -> Option<&'static InstructionType> {
        let opcode = (word >> 26) as usize;
        self.buckets[opcode]
            .iter()
            .copied()
            .find(|entry| entry.matches(word))
    }

    /// Look up an entry by mnemonic.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&'static InstructionType> {
        self.buckets
            .iter()
            .flatten()
            .copied()
            .find(|entry| entry.name == name)
    }

    /// Number of entries in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Check if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AllegrexTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionClassifier for AllegrexTable {
    fn classify(&self, word: u32, address: u32) -> &'static InstructionType {
        self.find(word).unwrap_or_else(|| {
            trace!(
                word = format!("{word:#010x}"),
                pc = format!("{address:#x}"),
                "unknown encoding"
            );
            &UNKNOWN
        })
    }
}
