//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

/// Default load address for raw images (PSP user memory).
const DEFAULT_BASE: &str = "0x08800000";

#[derive(Parser)]
#[command(name = "mrec")]
#[command(about = "MIPS (Allegrex) block recompiler")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one block and print its IR
    Lift {
        /// Raw binary image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Load address of the image (hex)
        #[arg(long, default_value = DEFAULT_BASE, value_parser = parse_hex)]
        base: u32,

        /// Block entry address (hex, defaults to the load address)
        #[arg(long, value_parser = parse_hex)]
        entry: Option<u32>,
    },
    /// Generate consecutive blocks and print instruction usage
    Scan {
        /// Raw binary image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Load address of the image (hex)
        #[arg(long, default_value = DEFAULT_BASE, value_parser = parse_hex)]
        base: u32,

        /// First block address (hex, defaults to the load address)
        #[arg(long, value_parser = parse_hex)]
        start: Option<u32>,

        /// Maximum number of blocks to generate
        #[arg(short = 'n', long, default_value = "16")]
        count: usize,
    },
    /// Disassemble instructions
    Disasm {
        /// Raw binary image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Load address of the image (hex)
        #[arg(long, default_value = DEFAULT_BASE, value_parser = parse_hex)]
        base: u32,

        /// First address (hex, defaults to the load address)
        #[arg(long, value_parser = parse_hex)]
        start: Option<u32>,

        /// Number of instructions
        #[arg(short = 'n', long, default_value = "32")]
        count: usize,
    },
}

/// Parse a 32-bit address, with or without a `0x` prefix.
fn parse_hex(s: &str) -> Result<u32, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(&digits.replace('_', ""), 16)
        .map_err(|e| format!("invalid address '{s}': {e}"))
}
