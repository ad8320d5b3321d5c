// `redline check` — verify parse/render round-trip fidelity for files.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use redline_core::doc::{parse, render};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Files to verify.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub files: Vec<FileCheck>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCheck {
    pub path: String,
    /// Whether `render(parse(content))` reproduced the file exactly.
    pub round_trips: bool,
    /// First line where the rendered output diverges, 1-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_divergent_line: Option<usize>,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        files.push(check_content(path.display().to_string(), &content));
    }

    let format = OutputFormat::detect(args.json);
    let all_clean = files.iter().all(|file| file.round_trips);
    output::print_output(format, &CheckResult { files }, format_human)?;

    if !all_clean {
        anyhow::bail!("some files do not round-trip");
    }
    Ok(())
}

fn check_content(path: String, content: &str) -> FileCheck {
    let rendered = render(&parse(content));
    if rendered == content {
        return FileCheck { path, round_trips: true, first_divergent_line: None };
    }

    let divergent = content
        .split('\n')
        .zip(rendered.split('\n'))
        .position(|(original, output)| original != output)
        .map(|index| index + 1)
        // fallback: line counts differ
        .unwrap_or_else(|| content.split('\n').count().min(rendered.split('\n').count()));

    FileCheck { path, round_trips: false, first_divergent_line: Some(divergent) }
}

fn format_human(result: &CheckResult) -> String {
    result
        .files
        .iter()
        .map(|file| match file.first_divergent_line {
            None => format!("ok      {}", file.path),
            Some(line) => format!("DIVERGE {} (line {line})", file.path),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
