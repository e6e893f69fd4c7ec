//! Command-line surface
//!
//! Grounded on the historical `emulate` binary's `Args` struct: a
//! `clap::Parser` derive with doc comments as help text and bare
//! `#[arg(short, long)] bool` flags. The source file is deliberately
//! `Option<String>` rather than a required positional so `main` can
//! print the exact historical "missing filename" message instead of
//! clap's generic "required argument" diagnostic.

use clap::Parser;

/// A user-space interpreter for a subset of the LEGv8 assembly language.
#[derive(Parser, Debug)]
#[command(name = "legv8", version, about, long_about = None)]
pub struct Cli {
    /// Show all register values after each instruction, with changed
    /// registers highlighted.
    #[arg(long)]
    pub all: bool,

    /// Show only the final register state once the program halts.
    /// Overrides --all.
    #[arg(long)]
    pub end: bool,

    /// Suppress the "Executing: ..." trace printed before each
    /// instruction.
    #[arg(long = "no-log")]
    pub no_log: bool,

    /// Path to the LEGv8 assembly source file.
    pub source_file: Option<String>,
}
