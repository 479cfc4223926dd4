//! Disasm command.

use std::path::Path;

use mrec::{MemoryReader, Recompiler};
use tracing::info;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `disasm` command.
pub fn cmd_disasm(image: &Path, base: u32, start: u32, count: usize) -> i32 {
    info!(image = %image.display(), start = format!("{start:#x}"), "disassembling");

    let Some(memory) = super::load(image, base) else {
        return EXIT_FAILURE;
    };
    let recompiler = Recompiler::new(memory);

    let mut address = start;
    for _ in 0..count {
        let word = recompiler.memory().read_word(address);
        println!("{address:08x}:  {word:08x}  {}", recompiler.disassemble(address));
        address = address.wrapping_add(4);
    }
    EXIT_SUCCESS
}
