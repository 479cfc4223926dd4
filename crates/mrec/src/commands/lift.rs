//! Lift command.

use std::path::Path;

use mrec::Recompiler;
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

/// Handle the `lift` command.
pub fn cmd_lift(image: &Path, base: u32, entry: u32) -> i32 {
    info!(image = %image.display(), entry = format!("{entry:#x}"), "lifting");

    let Some(memory) = super::load(image, base) else {
        return EXIT_FAILURE;
    };
    let mut recompiler = Recompiler::new(memory);

    match recompiler.lift(entry) {
        Ok(block) => {
            print!("{block}");
            info!(
                instructions = block.guest_instructions,
                end = format!("{:#x}", block.end_pc),
                "done"
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(error = %e, "lift failed");
            EXIT_FAILURE
        }
    }
}
