use std::cell::RefCell;

use mrec_ir::Expr;
use mrec_isa::{Format, InstructionType, Op, TranslateError};

use super::*;
use crate::compiler::IrCompiler;
use crate::config::DEFAULT_MAX_BLOCK_INSTRUCTIONS;

const BASE: u32 = 0x0880_0000;

const W_PLAIN: u32 = 1;
const W_OTHER: u32 = 2;
const W_BRANCH: u32 = 3;
const W_LIKELY: u32 = 4;
const W_SYSCALL: u32 = 5;
const W_BREAK: u32 = 6;
const W_MISSING: u32 = 7;

static PLAIN: InstructionType = InstructionType::new("plain", Op::Addu, 0, 0, Format::None);
static OTHER: InstructionType = InstructionType::new("other", Op::Or, 0, 0, Format::None);
static BRANCH: InstructionType =
    InstructionType::new("branch", Op::Beq, 0, 0, Format::None).delayed();
static LIKELY: InstructionType =
    InstructionType::new("likely", Op::Beql, 0, 0, Format::None).likely();
static SYSCALL: InstructionType =
    InstructionType::new("syscall", Op::Syscall, 0, 0, Format::None).syscall();
static BREAK: InstructionType =
    InstructionType::new("break", Op::Break, 0, 0, Format::None).stop();
static MISSING: InstructionType =
    InstructionType::new("missing", Op::Unknown, 0, 0, Format::None);

/// Word-per-slot memory that logs every address read.
struct ScriptedMemory {
    words: Vec<u32>,
    reads: RefCell<Vec<u32>>,
}

impl MemoryReader for ScriptedMemory {
    fn read_word(&self, address: u32) -> u32 {
        self.reads.borrow_mut().push(address);
        let index = (address.wrapping_sub(BASE) / 4) as usize;
        self.words.get(index).copied().unwrap_or(W_PLAIN)
    }
}

struct ScriptedClassifier;

impl InstructionClassifier for ScriptedClassifier {
    fn classify(&self, word: u32, _address: u32) -> &'static InstructionType {
        match word {
            W_OTHER => &OTHER,
            W_BRANCH => &BRANCH,
            W_LIKELY => &LIKELY,
            W_SYSCALL => &SYSCALL,
            W_BREAK => &BREAK,
            W_MISSING => &MISSING,
            _ => &PLAIN,
        }
    }
}

/// Emits a statement that identifies the instruction's address.
struct ScriptedTranslator;

impl SemanticTranslator for ScriptedTranslator {
    fn translate(
        &self,
        decoded: &DecodedInstruction,
    ) -> std::result::Result<Stmt, TranslateError> {
        let pc = decoded.pc();
        Ok(match decoded.op() {
            Op::Syscall => Stmt::Syscall { code: pc },
            Op::Break => Stmt::Break { code: pc },
            Op::Beq | Op::Beql => branch(pc),
            Op::Unknown => {
                return Err(TranslateError::NotImplemented {
                    name: decoded.name(),
                    address: pc,
                });
            }
            _ => marker(pc),
        })
    }
}

fn marker(pc: u32) -> Stmt {
    Stmt::write_reg(1, Expr::imm(pc))
}

fn branch(pc: u32) -> Stmt {
    Stmt::branch(Expr::imm(1), Expr::imm(pc))
}

type TestGenerator = BlockGenerator<ScriptedMemory, ScriptedClassifier, ScriptedTranslator, IrCompiler>;

fn generator(words: &[u32]) -> TestGenerator {
    let memory = ScriptedMemory {
        words: words.to_vec(),
        reads: RefCell::new(Vec::new()),
    };
    BlockGenerator::new(memory, ScriptedClassifier, ScriptedTranslator, IrCompiler)
}

fn reads(generator: &TestGenerator) -> Vec<u32> {
    generator.memory().reads.borrow().clone()
}

fn usage(generator: &TestGenerator) -> Vec<(&'static str, u64)> {
    generator
        .instruction_usage()
        .into_iter()
        .map(|u| (u.name, u.count))
        .collect()
}

#[test]
fn test_plain_instructions_in_address_order() {
    let mut generator = generator(&[W_PLAIN, W_OTHER, W_BREAK]);
    let block = generator.create(BASE).unwrap();
    assert_eq!(
        block.stmts,
        vec![
            Stmt::FunctionPrefix,
            marker(BASE),
            marker(BASE + 4),
            Stmt::Break { code: BASE + 8 },
            Stmt::StorePc { pc: BASE + 8 },
        ]
    );
    assert_eq!(block.start_pc, BASE);
    assert_eq!(block.end_pc, BASE + 12);
    assert_eq!(block.guest_instructions, 3);
}

#[test]
fn test_delay_slot_runs_before_post_branch() {
    let mut generator = generator(&[W_PLAIN, W_BRANCH, W_OTHER, W_PLAIN]);
    let block = generator.create(BASE).unwrap();
    assert_eq!(
        block.stmts,
        vec![
            Stmt::FunctionPrefix,
            marker(BASE),
            branch(BASE + 4),
            Stmt::likely(false, marker(BASE + 8)),
            Stmt::PostBranch {
                next_pc: BASE + 12
            },
        ]
    );
    assert_eq!(block.end_pc, BASE + 12);
}

#[test]
fn test_nothing_decoded_past_delay_slot() {
    let mut generator = generator(&[W_BRANCH, W_PLAIN, W_PLAIN, W_PLAIN]);
    generator.create(BASE).unwrap();
    assert_eq!(reads(&generator), vec![BASE, BASE + 4]);
}

#[test]
fn test_likely_branch_guards_delay_slot() {
    let mut generator = generator(&[W_LIKELY, W_OTHER]);
    let block = generator.create(BASE).unwrap();
    assert_eq!(
        block.stmts,
        vec![
            Stmt::FunctionPrefix,
            branch(BASE),
            Stmt::likely(true, marker(BASE + 4)),
            Stmt::PostBranch { next_pc: BASE + 8 },
        ]
    );
}

#[test]
fn test_syscall_in_delay_slot_runs_after_post_branch() {
    let mut generator = generator(&[W_BRANCH, W_SYSCALL]);
    let block = generator.create(BASE).unwrap();
    assert_eq!(
        block.stmts,
        vec![
            Stmt::FunctionPrefix,
            branch(BASE),
            Stmt::PostBranch { next_pc: BASE + 8 },
            Stmt::likely(false, Stmt::Syscall { code: BASE + 4 }),
        ]
    );
}

#[test]
fn test_syscall_in_likely_delay_slot() {
    let mut generator = generator(&[W_LIKELY, W_SYSCALL]);
    let block = generator.create(BASE).unwrap();
    assert_eq!(
        block.stmts[2..],
        [
            Stmt::PostBranch { next_pc: BASE + 8 },
            Stmt::likely(true, Stmt::Syscall { code: BASE + 4 }),
        ]
    );
}

#[test]
fn test_plain_syscall_stores_next_pc_and_continues() {
    let mut generator = generator(&[W_PLAIN, W_SYSCALL, W_OTHER, W_BREAK]);
    let block = generator.create(BASE).unwrap();
    assert_eq!(
        block.stmts,
        vec![
            Stmt::FunctionPrefix,
            marker(BASE),
            Stmt::StorePc { pc: BASE + 8 },
            Stmt::Syscall { code: BASE + 4 },
            marker(BASE + 8),
            Stmt::Break { code: BASE + 12 },
            Stmt::StorePc { pc: BASE + 12 },
        ]
    );
}

#[test]
fn test_break_terminates_immediately() {
    let mut generator = generator(&[W_BREAK, W_PLAIN]);
    let block = generator.create(BASE).unwrap();
    assert_eq!(block.last(), Some(&Stmt::StorePc { pc: BASE }));
    assert_eq!(reads(&generator), vec![BASE]);
}

#[test]
fn test_zero_entry_point_rejected() {
    let mut generator = generator(&[W_BREAK]);
    assert_eq!(
        generator.create(0),
        Err(GenError::InvalidEntryPoint { address: 0 })
    );
    assert!(reads(&generator).is_empty());
    assert!(generator.instruction_usage().is_empty());
}

#[test]
fn test_oversized_block_fails_at_bound() {
    let words = vec![W_PLAIN; DEFAULT_MAX_BLOCK_INSTRUCTIONS + 1];
    let mut generator = generator(&words);
    assert_eq!(
        generator.create(BASE),
        Err(GenError::BlockTooLarge {
            address: BASE,
            limit: DEFAULT_MAX_BLOCK_INSTRUCTIONS,
        })
    );
    assert_eq!(
        usage(&generator),
        vec![("plain", DEFAULT_MAX_BLOCK_INSTRUCTIONS as u64)]
    );
}

#[test]
fn test_configured_bound() {
    let config = GeneratorConfig::new().with_max_block_instructions(4);

    let mut fits = generator(&[W_PLAIN, W_PLAIN, W_PLAIN, W_BREAK]).with_config(config);
    assert!(fits.create(BASE).is_ok());

    let mut too_long =
        generator(&[W_PLAIN, W_PLAIN, W_PLAIN, W_PLAIN, W_BREAK]).with_config(config);
    assert_eq!(
        too_long.create(BASE),
        Err(GenError::BlockTooLarge {
            address: BASE,
            limit: 4
        })
    );
}

#[test]
fn test_not_implemented_propagates() {
    let mut generator = generator(&[W_PLAIN, W_MISSING, W_BREAK]);
    let err = generator.create(BASE).unwrap_err();
    assert_eq!(
        err,
        GenError::NotImplemented {
            name: "missing",
            address: BASE + 4,
        }
    );
    assert_eq!(err.to_string(), "not implemented 'missing' at 0x08800004");
}

#[test]
fn test_not_implemented_in_delay_slot() {
    let mut generator = generator(&[W_BRANCH, W_MISSING]);
    assert_eq!(
        generator.create(BASE),
        Err(GenError::NotImplemented {
            name: "missing",
            address: BASE + 4,
        })
    );
}

#[test]
fn test_usage_skips_delay_slot() {
    let mut generator = generator(&[W_PLAIN, W_PLAIN, W_OTHER, W_BRANCH, W_OTHER]);
    generator.create(BASE).unwrap();
    assert_eq!(
        usage(&generator),
        vec![("plain", 2), ("branch", 1), ("other", 1)]
    );
}

#[test]
fn test_usage_accumulates_and_resets() {
    let mut generator = generator(&[W_PLAIN, W_BREAK, W_OTHER, W_BREAK]);
    generator.create(BASE).unwrap();
    generator.create(BASE + 8).unwrap();
    generator.create(BASE).unwrap();
    assert_eq!(
        usage(&generator),
        vec![("break", 3), ("plain", 2), ("other", 1)]
    );

    generator.reset_instruction_usage();
    assert!(generator.instruction_usage().is_empty());
}

#[test]
fn test_decode_instruction_has_no_side_effects() {
    let generator = generator(&[W_PLAIN, W_LIKELY]);
    let decoded = generator.decode_instruction(BASE + 4);
    assert_eq!(decoded.name(), "likely");
    assert_eq!(decoded.pc(), BASE + 4);
    assert_eq!(decoded.instruction.word, W_LIKELY);
    assert!(decoded.ty.is_likely);
    assert!(generator.instruction_usage().is_empty());
}

#[test]
fn test_generation_is_deterministic() {
    let program = [W_PLAIN, W_SYSCALL, W_OTHER, W_LIKELY, W_SYSCALL];
    let mut first = generator(&program);
    let mut second = generator(&program);
    let a = first.create(BASE).unwrap();
    let b = second.create(BASE).unwrap();
    assert_eq!(a, b);
    assert_eq!(usage(&first), usage(&second));
}

#[test]
fn test_output_comes_from_compiler() {
    struct StmtCount;

    impl CodeCompiler for StmtCount {
        type Output = (u32, usize);

        fn compile(&self, block: BlockIR) -> (u32, usize) {
            (block.start_pc, block.len())
        }
    }

    let memory = ScriptedMemory {
        words: vec![W_PLAIN, W_BREAK],
        reads: RefCell::new(Vec::new()),
    };
    let mut generator = BlockGenerator::new(memory, ScriptedClassifier, ScriptedTranslator, StmtCount);
    assert_eq!(generator.create(BASE), Ok((BASE, 4)));
}
