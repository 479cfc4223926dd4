//! Scan command: generate consecutive blocks and report instruction usage.

use std::path::Path;

use mrec::{InstructionUsage, Recompiler};
use tracing::{debug, error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `scan` command.
///
/// Each block starts where the previous one ended. The usage table is
/// printed even when a block fails, covering everything decoded so far.
pub fn cmd_scan(image: &Path, base: u32, start: u32, count: usize) -> i32 {
    info!(image = %image.display(), start = format!("{start:#x}"), count, "scanning");

    let Some(memory) = super::load(image, base) else {
        return EXIT_FAILURE;
    };
    let end = memory.end();
    let mut recompiler = Recompiler::new(memory);

    let mut address = start;
    let mut blocks = 0usize;
    let mut exit_code = EXIT_SUCCESS;
    while blocks < count && u64::from(address) < end {
        match recompiler.lift(address) {
            Ok(block) => {
                debug!(
                    start = format!("{:#x}", block.start_pc),
                    end = format!("{:#x}", block.end_pc),
                    "block"
                );
                blocks += 1;
                if block.end_pc <= address {
                    break;
                }
                address = block.end_pc;
            }
            Err(e) => {
                error!(error = %e, "scan stopped");
                exit_code = EXIT_FAILURE;
                break;
            }
        }
    }

    print_usage(&recompiler.instruction_usage());
    info!(blocks, "done");
    exit_code
}

fn print_usage(usage: &[InstructionUsage]) {
    let total: u64 = usage.iter().map(|u| u.count).sum();
    println!("{:<12} {:>10}", "instruction", "count");
    for entry in usage {
        println!("{:<12} {:>10}", entry.name, entry.count);
    }
    println!("{:<12} {total:>10}", "total");
}
