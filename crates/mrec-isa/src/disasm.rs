//! Text disassembly of decoded instructions.

use crate::types::{DecodedInstruction, Format, reg_name};

/// Render an instruction in conventional assembler syntax.
#[must_use]
pub fn disasm(decoded: &DecodedInstruction) -> String {
    let i = &decoded.instruction;
    let mnemonic = decoded.name();
    let (rs, rt, rd) = (reg_name(i.rs()), reg_name(i.rt()), reg_name(i.rd()));
    match decoded.ty.format {
        Format::None => mnemonic.to_string(),
        Format::RdRsRt => format!("{mnemonic} {rd}, {rs}, {rt}"),
        Format::RdRtSa => format!("{mnemonic} {rd}, {rt}, {}", i.sa()),
        Format::RdRtRs => format!("{mnemonic} {rd}, {rt}, {rs}"),
        Format::RdRs => format!("{mnemonic} {rd}, {rs}"),
        Format::RdRt => format!("{mnemonic} {rd}, {rt}"),
        Format::Rd => format!("{mnemonic} {rd}"),
        Format::Rs => format!("{mnemonic} {rs}"),
        Format::RsRt => format!("{mnemonic} {rs}, {rt}"),
        Format::RtRsImm => format!("{mnemonic} {rt}, {rs}, {}", i.simm16()),
        Format::RtRsUImm => format!("{mnemonic} {rt}, {rs}, {:#x}", i.uimm16()),
        Format::RtUImm => format!("{mnemonic} {rt}, {:#x}", i.uimm16()),
        Format::RsRtOff => format!("{mnemonic} {rs}, {rt}, {:#010x}", i.branch_target()),
        Format::RsOff => format!("{mnemonic} {rs}, {:#010x}", i.branch_target()),
        Format::Target => format!("{mnemonic} {:#010x}", i.jump_target()),
        Format::RtMem => format!("{mnemonic} {rt}, {}({rs})", i.simm16()),
        Format::Code => format!("{mnemonic} {:#x}", i.code20()),
        Format::BitField => {
            let size = if decoded.ty.name == "ins" {
                i.ins_size()
            } else {
                i.ext_size()
            };
            format!("{mnemonic} {rt}, {rs}, {}, {size}", i.pos())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{AllegrexTable, InstructionClassifier};
    use crate::types::Instruction;

    fn render(word: u32, pc: u32) -> String {
        let table = AllegrexTable::new();
        disasm(&DecodedInstruction::new(
            Instruction::new(word, pc),
            table.classify(word, pc),
        ))
    }

    #[test]
    fn test_disasm_forms() {
        assert_eq!(render(0x0085_1021, 0), "addu v0, a0, a1");
        assert_eq!(render(0x27BD_FFF0, 0), "addiu sp, sp, -16");
        assert_eq!(render(0x8FBF_000C, 0), "lw ra, 12(sp)");
        assert_eq!(render(0x03E0_0008, 0), "jr ra");
        assert_eq!(render(0x0A20_1000, 0x0880_0000), "j 0x08804000");
        assert_eq!(render(0x1085_0003, 0x0880_0000), "beq a0, a1, 0x08800010");
        assert_eq!(render(0x0008_044C, 0), "syscall 0x2011");
        assert_eq!(render(0x7C82_3A00, 0), "ext v0, a0, 8, 8");
        assert_eq!(render(0x0000_000F, 0), "sync");
        assert_eq!(render(0x4600_0000, 0), "unknown");
    }
}
