use super::*;
use crate::table::{AllegrexTable, InstructionClassifier};
use crate::types::{REG_A0, REG_A1, REG_SP, REG_V0};
use mrec_ir::Place;

const PC: u32 = 0x0880_0100;

fn translate(word: u32) -> Result<Stmt, TranslateError> {
    let table = AllegrexTable::new();
    let decoded = DecodedInstruction::new(Instruction::new(word, PC), table.classify(word, PC));
    AllegrexTranslator::new().translate(&decoded)
}

fn ok(word: u32) -> Stmt {
    match translate(word) {
        Ok(stmt) => stmt,
        Err(err) => panic!("translation of {word:#010x} failed: {err}"),
    }
}

#[test]
fn test_nop_translates_to_nop() {
    assert_eq!(ok(0x0000_0000), Stmt::Nop);
}

#[test]
fn test_addu() {
    // addu $v0, $a0, $a1
    assert_eq!(
        ok(0x0085_1021),
        Stmt::write_reg(REG_V0, Expr::add(Expr::reg(REG_A0), Expr::reg(REG_A1)))
    );
}

#[test]
fn test_write_to_zero_is_dropped() {
    // addiu $zero, $a0, 1
    assert_eq!(ok(0x2480_0001), Stmt::Nop);
}

#[test]
fn test_addiu_sign_extends() {
    // addiu $sp, $sp, -16
    assert_eq!(
        ok(0x27BD_FFF0),
        Stmt::write_reg(REG_SP, Expr::add(Expr::reg(REG_SP), Expr::imm(0xFFFF_FFF0)))
    );
}

#[test]
fn test_lui_folds() {
    // lui $a0, 0x0880
    assert_eq!(ok(0x3C04_0880), Stmt::write_reg(REG_A0, Expr::imm(0x0880_0000)));
}

#[test]
fn test_lw_reads_memory() {
    // lw $v0, 12($sp)
    let stmt = ok(0x8FA2_000C);
    let Stmt::Write { place, value } = stmt else {
        panic!("expected a register write");
    };
    assert_eq!(place, Place::Reg(REG_V0));
    assert!(value.reads_memory());
}

#[test]
fn test_sw_writes_memory() {
    // sw $ra, 12($sp)
    assert!(matches!(ok(0xAFBF_000C), Stmt::WriteMem { width: 4, .. }));
}

#[test]
fn test_beq_records_target() {
    // beq $a0, $a1, +3
    assert_eq!(
        ok(0x1085_0003),
        Stmt::branch(
            Expr::eq(Expr::reg(REG_A0), Expr::reg(REG_A1)),
            Expr::imm(PC + 4 + 12)
        )
    );
}

#[test]
fn test_jal_links_past_delay_slot() {
    // jal 0x08804000
    let stmt = ok(0x0E20_1000);
    let Stmt::Seq(stmts) = stmt else {
        panic!("expected branch and link");
    };
    assert_eq!(stmts[0], Stmt::branch(Expr::imm(1), Expr::imm(0x0880_4000)));
    assert_eq!(stmts[1], Stmt::write_reg(REG_RA, Expr::imm(PC + 8)));
}

#[test]
fn test_jalr_branches_before_linking() {
    // jalr $ra, $a0
    let Stmt::Seq(stmts) = ok(0x0080_F809) else {
        panic!("expected branch and link");
    };
    assert!(matches!(stmts[0], Stmt::Branch { .. }));
    assert_eq!(stmts[1], Stmt::write_reg(REG_RA, Expr::imm(PC + 8)));
}

#[test]
fn test_system_instructions() {
    assert_eq!(ok(0x0008_044C), Stmt::Syscall { code: 0x2011 });
    assert_eq!(ok(0x0000_000D), Stmt::Break { code: 0 });
    assert_eq!(ok(0x0000_040D), Stmt::Break { code: 0x10 });
    assert_eq!(ok(0x7000_0000), Stmt::Break { code: 0 });
    assert_eq!(ok(0x0000_000F), Stmt::Nop);
}

#[test]
fn test_mult_uses_hilo() {
    // mult $a0, $a1
    assert_eq!(
        ok(0x0085_0018),
        Stmt::hilo(HiLoOp::Mult, Expr::reg(REG_A0), Expr::reg(REG_A1))
    );
}

#[test]
fn test_unknown_not_implemented() {
    let err = translate(0x4600_0000).unwrap_err();
    assert_eq!(
        err,
        TranslateError::NotImplemented {
            name: "unknown",
            address: PC,
        }
    );
    assert_eq!(err.to_string(), "not implemented 'unknown' at 0x08800100");
}

#[test]
fn test_every_known_entry_translates() {
    for entry in crate::table::INSTRUCTIONS {
        assert!(
            translate(entry.value).is_ok(),
            "{} has no translation",
            entry.name
        );
    }
}
