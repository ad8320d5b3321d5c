// CLI subcommand dispatch.

use clap::Subcommand;

pub mod apply;
pub mod bib;
pub mod check;
pub mod diff;

#[derive(Subcommand)]
pub enum Command {
    /// Word-level diff between two document files
    Diff(diff::DiffArgs),
    /// Bibliography order and compiled citation preview
    Bib(bib::BibArgs),
    /// Apply a replacement and print the change event
    Apply(apply::ApplyArgs),
    /// Verify parse/render round-trip fidelity
    Check(check::CheckArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Diff(args) => diff::run(args),
        Command::Bib(args) => bib::run(args),
        Command::Apply(args) => apply::run(args),
        Command::Check(args) => check::run(args),
    }
}
