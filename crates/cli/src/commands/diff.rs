// `redline diff` — word-level diff between two document files.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use redline_core::diff::{diff, DiffBlock, DiffKind};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Document before the edit.
    pub before: PathBuf,

    /// Document after the edit.
    pub after: PathBuf,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResult {
    pub blocks: Vec<DiffBlock>,
    pub inserted_words: usize,
    pub deleted_words: usize,
}

pub fn run(args: DiffArgs) -> anyhow::Result<()> {
    let before = std::fs::read_to_string(&args.before)
        .with_context(|| format!("failed to read {}", args.before.display()))?;
    let after = std::fs::read_to_string(&args.after)
        .with_context(|| format!("failed to read {}", args.after.display()))?;

    let format = OutputFormat::detect(args.json);
    let result = diff_files(&before, &after);
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn diff_files(before: &str, after: &str) -> DiffResult {
    let blocks = diff(before, after);
    let inserted_words = word_count(&blocks, DiffKind::Insert);
    let deleted_words = word_count(&blocks, DiffKind::Delete);
    DiffResult { blocks, inserted_words, deleted_words }
}

fn word_count(blocks: &[DiffBlock], kind: DiffKind) -> usize {
    blocks
        .iter()
        .filter(|block| block.kind == kind)
        .map(|block| block.value.split_whitespace().count())
        .sum()
}

fn format_human(result: &DiffResult) -> String {
    if result.blocks.iter().all(|block| block.kind == DiffKind::Equal) {
        return "No changes.".into();
    }

    let mut lines = Vec::new();
    for block in &result.blocks {
        let prefix = match block.kind {
            DiffKind::Equal => "  ",
            DiffKind::Delete => "- ",
            DiffKind::Insert => "+ ",
        };
        for line in block.value.lines() {
            lines.push(format!("{prefix}{line}"));
        }
    }
    lines.push(format!("(+{} words, -{} words)", result.inserted_words, result.deleted_words));
    lines.join("\n")
}
