//! Usage-boundary errors for the CLI binary (§7). These wrap the I/O
//! failures `anyhow::Context` can't phrase on its own; everything else
//! (semantic diagnostics) flows through `DiagnosticBag`, not this type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read source file '{}'", path.display())]
    ReadSource { path: PathBuf },

    #[error("could not write TAC output to '{}'", path.display())]
    WriteOutput { path: PathBuf },

    #[error("TAC generation failed on a program that passed checking")]
    Generate,
}
