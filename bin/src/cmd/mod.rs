//! CLI subcommand modules.
//!
//! This module contains the implementations for all surprise CLI subcommands.

pub(crate) mod importance;
pub(crate) mod ingest;
pub(crate) mod merge;
pub(crate) mod train;

/// Prints a boxed section header.
pub(crate) fn banner(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", title);
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}
