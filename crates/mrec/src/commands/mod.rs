//! Command implementations.
//!
//! Each submodule handles one CLI command.

mod disasm;
mod lift;
mod scan;

use std::path::Path;

use mrec::{GuestMemory, load_image};
use tracing::error;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Lift { image, base, entry } => {
            lift::cmd_lift(image, *base, entry.unwrap_or(*base))
        }
        Commands::Scan {
            image,
            base,
            start,
            count,
        } => scan::cmd_scan(image, *base, start.unwrap_or(*base), *count),
        Commands::Disasm {
            image,
            base,
            start,
            count,
        } => disasm::cmd_disasm(image, *base, start.unwrap_or(*base), *count),
    }
}

/// Load an image, logging the failure.
fn load(image: &Path, base: u32) -> Option<GuestMemory> {
    match load_image(image, base) {
        Ok(memory) => Some(memory),
        Err(e) => {
            error!(image = %image.display(), error = %e, "failed to load image");
            None
        }
    }
}
