//! Integration tests for the recompiler over real Allegrex encodings.

use std::io::Write;
use std::sync::{Arc, Mutex};

use mrec::{
    BlockExit, CpuState, DEFAULT_MAX_BLOCK_INSTRUCTIONS, Error, GenError, GeneratorConfig,
    GuestMemory, Recompiler, Registers, Stmt,
};

const BASE: u32 = 0x0880_0000;

const NOP: u32 = 0x0000_0000;
const BREAK: u32 = 0x0000_000D;
const JR_RA: u32 = 0x03E0_0008;
const SYSCALL_2011: u32 = 0x0008_044C;
const ADDIU_V0_ZERO_1: u32 = 0x2402_0001; // addiu $v0, $zero, 1
const ADDIU_V0_V0_2: u32 = 0x2442_0002; // addiu $v0, $v0, 2
const ADDIU_V0_ZERO_7: u32 = 0x2402_0007; // addiu $v0, $zero, 7
const COP1_ADD_S: u32 = 0x4600_0000;

fn recompiler(words: &[u32]) -> Recompiler {
    Recompiler::new(GuestMemory::from_words(BASE, words))
}

fn state(words: &[u32]) -> CpuState {
    let mut memory = GuestMemory::from_words(BASE, words);
    memory.resize(0x1000);
    CpuState::new(memory)
}

#[test]
fn test_straight_line_block_ends_at_break() {
    let words = [ADDIU_V0_ZERO_1, ADDIU_V0_V0_2, BREAK];
    let mut rec = recompiler(&words);
    let block = rec.create(BASE).unwrap();
    assert_eq!(block.start_pc(), BASE);
    assert_eq!(block.end_pc(), BASE + 12);
    assert_eq!(block.guest_instructions(), 3);
    assert_eq!(block.stmts().first(), Some(&Stmt::FunctionPrefix));
    assert_eq!(block.stmts().last(), Some(&Stmt::StorePc { pc: BASE + 8 }));

    let mut state = state(&words);
    assert_eq!(block.call(&mut state).unwrap(), BlockExit::Break { code: 0 });
    assert_eq!(state.regs.get(2), 3);
    assert_eq!(state.regs.pc, BASE + 8);
}

#[test]
fn test_jal_links_and_runs_delay_slot() {
    // addiu $a0, $zero, 5; jal 0x08800040; addiu $v0, $zero, 7
    let words = [0x2404_0005, 0x0E20_0010, ADDIU_V0_ZERO_7, NOP];
    let mut rec = recompiler(&words);
    let block = rec.create(BASE).unwrap();
    assert_eq!(block.guest_instructions(), 3);
    assert_eq!(block.end_pc(), BASE + 12);

    let mut state = state(&words);
    assert_eq!(block.call(&mut state).unwrap(), BlockExit::Branch);
    assert_eq!(state.regs.get(4), 5);
    assert_eq!(state.regs.get(31), BASE + 12);
    assert_eq!(state.regs.get(2), 7);
    assert_eq!(state.regs.pc, 0x0880_0040);
}

#[test]
fn test_branch_likely_squashes_slot_when_not_taken() {
    // beql $a0, $a1, +3; addiu $v0, $zero, 7
    let words = [0x5085_0003, ADDIU_V0_ZERO_7];
    let mut rec = recompiler(&words);
    let block = rec.create(BASE).unwrap();

    let mut state = state(&words);
    state.regs.set(4, 1);
    state.regs.set(5, 2);
    block.call(&mut state).unwrap();
    assert_eq!(state.regs.get(2), 0);
    assert_eq!(state.regs.pc, BASE + 8);

    state.regs.set(5, 1);
    block.call(&mut state).unwrap();
    assert_eq!(state.regs.get(2), 7);
    assert_eq!(state.regs.pc, BASE + 16);
}

#[test]
fn test_syscall_stores_next_pc_first() {
    let words = [SYSCALL_2011, BREAK];
    let mut rec = recompiler(&words);
    let block = rec.create(BASE).unwrap();
    assert_eq!(
        block.stmts(),
        &[
            Stmt::FunctionPrefix,
            Stmt::StorePc { pc: BASE + 4 },
            Stmt::Syscall { code: 0x2011 },
            Stmt::Break { code: 0 },
            Stmt::StorePc { pc: BASE + 4 },
        ]
    );

    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let mut state = state(&words).with_syscall_handler(
        move |code: u32, regs: &mut Registers, _: &mut GuestMemory| {
            log.lock().unwrap().push((code, regs.pc));
        },
    );
    assert_eq!(block.call(&mut state).unwrap(), BlockExit::Break { code: 0 });
    assert_eq!(*seen.lock().unwrap(), vec![(0x2011, BASE + 4)]);
}

#[test]
fn test_syscall_in_delay_slot_runs_after_pc_commit() {
    let words = [JR_RA, SYSCALL_2011];
    let mut rec = recompiler(&words);
    let block = rec.create(BASE).unwrap();
    let stmts = block.stmts();
    assert!(matches!(stmts[stmts.len() - 2], Stmt::PostBranch { next_pc } if next_pc == BASE + 8));
    assert!(matches!(&stmts[stmts.len() - 1], Stmt::Likely { likely: false, .. }));

    let seen = Arc::new(Mutex::new(None));
    let log = Arc::clone(&seen);
    let mut state = state(&words).with_syscall_handler(
        move |_: u32, regs: &mut Registers, _: &mut GuestMemory| {
            *log.lock().unwrap() = Some(regs.pc);
        },
    );
    state.regs.set(31, 0x0880_0100);
    block.call(&mut state).unwrap();
    assert_eq!(*seen.lock().unwrap(), Some(0x0880_0100));
}

#[test]
fn test_hilo_through_translated_code() {
    // mult $a0, $a1; mflo $v0; mfhi $v1; break
    let words = [0x0085_0018, 0x0000_1012, 0x0000_1810, BREAK];
    let mut rec = recompiler(&words);
    let block = rec.create(BASE).unwrap();

    let mut state = state(&words);
    state.regs.set(4, 0xFFFF_FFFE);
    state.regs.set(5, 3);
    block.call(&mut state).unwrap();
    assert_eq!(state.regs.get(2), 0xFFFF_FFFA);
    assert_eq!(state.regs.get(3), 0xFFFF_FFFF);
}

#[test]
fn test_unaligned_word_load() {
    // lui $a0, 0x0880; ori $a0, $a0, 0x41; lwl $v0, 3($a0); lwr $v0, 0($a0); break
    let words = [0x3C04_0880, 0x3484_0041, 0x8882_0003, 0x9882_0000, BREAK];
    let mut rec = recompiler(&words);
    let block = rec.create(BASE).unwrap();

    let mut state = state(&words);
    state
        .memory
        .write_bytes(BASE + 0x40, &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77])
        .unwrap();
    block.call(&mut state).unwrap();
    assert_eq!(state.regs.get(2), 0x4433_2211);
}

#[test]
fn test_invalid_entry_point() {
    let mut rec = recompiler(&[NOP, BREAK]);
    let err = rec.create(0).unwrap_err();
    assert!(matches!(
        err,
        Error::Generate(GenError::InvalidEntryPoint { address: 0 })
    ));
    assert!(rec.instruction_usage().is_empty());
}

#[test]
fn test_block_too_large() {
    let mut rec = Recompiler::new(GuestMemory::new(BASE, 0x10_0000));
    let err = rec.create(BASE).unwrap_err();
    assert!(matches!(
        err,
        Error::Generate(GenError::BlockTooLarge { address: BASE, limit })
            if limit == DEFAULT_MAX_BLOCK_INSTRUCTIONS
    ));
    let usage = rec.instruction_usage();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].name, "sll");
    assert_eq!(usage[0].count, 100_000);
}

#[test]
fn test_configured_bound() {
    let config = GeneratorConfig::new().with_max_block_instructions(4);
    let mut rec = Recompiler::with_config(GuestMemory::new(BASE, 0x100), config);
    assert!(matches!(
        rec.create(BASE),
        Err(Error::Generate(GenError::BlockTooLarge { limit: 4, .. }))
    ));
}

#[test]
fn test_unknown_instruction_is_not_implemented() {
    let mut rec = recompiler(&[NOP, COP1_ADD_S, BREAK]);
    let err = rec.create(BASE).unwrap_err();
    assert!(matches!(
        err,
        Error::Generate(GenError::NotImplemented { name: "unknown", address })
            if address == BASE + 4
    ));
    assert!(err.to_string().contains("not implemented"));
}

#[test]
fn test_usage_accumulates_across_blocks() {
    // Delay slots are decoded without being counted.
    let words = [ADDIU_V0_ZERO_1, ADDIU_V0_V0_2, JR_RA, NOP];
    let mut rec = recompiler(&words);
    rec.create(BASE).unwrap();
    rec.create(BASE).unwrap();

    let usage: Vec<_> = rec
        .instruction_usage()
        .into_iter()
        .map(|u| (u.name, u.count))
        .collect();
    assert_eq!(usage, vec![("addiu", 4), ("jr", 2)]);

    rec.reset_instruction_usage();
    assert!(rec.instruction_usage().is_empty());
}

#[test]
fn test_decode_does_not_count() {
    let rec = recompiler(&[JR_RA, NOP]);
    let decoded = rec.decode_instruction(BASE);
    assert_eq!(decoded.name(), "jr");
    assert!(decoded.ty.has_delayed_branch);
    assert_eq!(rec.disassemble(BASE), "jr ra");
    assert!(rec.instruction_usage().is_empty());
}

#[test]
fn test_generation_is_deterministic() {
    let words = [ADDIU_V0_ZERO_1, 0x5085_0003, SYSCALL_2011];
    let mut rec = recompiler(&words);
    let first = rec.lift(BASE).unwrap();
    let second = rec.lift(BASE).unwrap();
    assert_eq!(first, second);
    assert_eq!(rec.create(BASE).unwrap().stmts(), first.stmts.as_slice());
}

#[test]
fn test_shared_recompiler_from_threads() {
    let shared = recompiler(&[ADDIU_V0_ZERO_1, JR_RA, NOP]).into_shared();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            std::thread::spawn(move || shared.create(BASE).map(|b| b.guest_instructions()))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 3);
    }
    let usage = shared.instruction_usage();
    assert_eq!(usage.iter().map(|u| u.count).sum::<u64>(), 8);
}

#[test]
fn test_load_image_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for word in [ADDIU_V0_ZERO_1, BREAK] {
        file.write_all(&word.to_le_bytes()).unwrap();
    }
    file.flush().unwrap();

    let memory = mrec::load_image(file.path(), BASE).unwrap();
    assert_eq!(memory.base(), BASE);
    assert_eq!(memory.len(), 8);
    let mut rec = Recompiler::new(memory);
    assert_eq!(rec.create(BASE).unwrap().guest_instructions(), 2);
}

#[test]
fn test_load_image_past_address_space() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0; 16]).unwrap();
    file.flush().unwrap();

    assert!(matches!(
        mrec::load_image(file.path(), 0xFFFF_FFF8),
        Err(Error::ImageTooLarge { size: 16, .. })
    ));
}
