// `redline bib` — bibliography order and compiled citation preview.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use redline_core::citation::bibliography::{bibliography_order, compile_citations};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct BibArgs {
    /// Section files, in document order.
    #[arg(required = true)]
    pub sections: Vec<PathBuf>,

    /// Also print each section with citation clusters compiled to ranks.
    #[arg(long)]
    compile: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BibResult {
    /// Citation ids in first-appearance order; index + 1 is the rank.
    pub order: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compiled: Vec<CompiledSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledSection {
    pub path: String,
    pub content: String,
}

pub fn run(args: BibArgs) -> anyhow::Result<()> {
    let mut contents = Vec::with_capacity(args.sections.len());
    for path in &args.sections {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        contents.push((path.display().to_string(), content));
    }

    let format = OutputFormat::detect(args.json);
    let result = compile(&contents, args.compile);
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn compile(contents: &[(String, String)], include_compiled: bool) -> BibResult {
    let order = bibliography_order(contents.iter().map(|(_, content)| content.as_str()));

    let compiled = if include_compiled {
        contents
            .iter()
            .map(|(path, content)| CompiledSection {
                path: path.clone(),
                content: compile_citations(content, &order),
            })
            .collect()
    } else {
        Vec::new()
    };

    BibResult { order, compiled }
}

fn format_human(result: &BibResult) -> String {
    if result.order.is_empty() {
        return "No citations found.".into();
    }

    let mut lines = Vec::new();
    for (index, id) in result.order.iter().enumerate() {
        lines.push(format!("[{}] {id}", index + 1));
    }
    for section in &result.compiled {
        lines.push(String::new());
        lines.push(format!("--- {}", section.path));
        lines.push(section.content.clone());
    }
    lines.join("\n")
}
