// `redline apply` — build a replacement transaction against a document
// file and print the preview plus the recorded change event.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use redline_core::transaction::{build_replace_all, build_replace_range, EditInput, EditOutcome};
use redline_core::types::{Actor, SectionChangeEvent};

use crate::config::GlobalConfig;
use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Document to edit.
    pub file: PathBuf,

    /// Replacement text (or target content without --from/--to).
    #[arg(long, value_name = "TEXT")]
    pub with: String,

    /// Start of the replaced range in tree positions.
    #[arg(long, requires = "to")]
    pub from: Option<i64>,

    /// End of the replaced range in tree positions.
    #[arg(long, requires = "from")]
    pub to: Option<i64>,

    /// Free-text request to record on the change event.
    #[arg(long)]
    pub request: Option<String>,

    /// Attribute the edit to a human author with this name.
    #[arg(long, value_name = "NAME", conflicts_with = "actor_model")]
    pub actor_user: Option<String>,

    /// Attribute the edit to an AI model with this label.
    #[arg(long, value_name = "MODEL")]
    pub actor_model: Option<String>,

    /// Write the preview content back to the file.
    #[arg(long)]
    pub write: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    pub preview_content: String,
    pub event: SectionChangeEvent,
}

pub fn run(args: ApplyArgs) -> anyhow::Result<()> {
    let base = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let format = OutputFormat::detect(args.json);
    let config = GlobalConfig::load();
    let input = EditInput {
        actor: resolve_actor(&args, &config),
        request: args.request.clone(),
        thread_id: None,
    };

    let outcome = build_outcome(&base, &args, input);
    tracing::debug!(
        file = %args.file.display(),
        steps = outcome.event.steps.len(),
        "built replacement transaction"
    );

    if args.write {
        std::fs::write(&args.file, &outcome.preview_content)
            .with_context(|| format!("failed to write {}", args.file.display()))?;
    }

    let result =
        ApplyResult { preview_content: outcome.preview_content, event: outcome.event };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn build_outcome(base: &str, args: &ApplyArgs, input: EditInput) -> EditOutcome {
    match (args.from, args.to) {
        (Some(from), Some(to)) => build_replace_range(base, from, to, &args.with, input),
        _ => build_replace_all(base, &args.with, input),
    }
}

fn resolve_actor(args: &ApplyArgs, config: &GlobalConfig) -> Actor {
    if let Some(name) = &args.actor_user {
        return Actor::User { user_id: name.clone(), name: name.clone() };
    }
    if let Some(model) = &args.actor_model {
        return Actor::Llm { model: model.clone() };
    }
    config.user_actor()
}

fn format_human(result: &ApplyResult) -> String {
    let selection = &result.event.selection;
    let mut lines = vec![
        format!(
            "{} replaced [{}, {})",
            result.event.actor.label(),
            selection.from,
            selection.to
        ),
        String::new(),
        result.preview_content.clone(),
    ];
    if let Some(request) = &result.event.request {
        lines.insert(1, format!("request: {request}"));
    }
    lines.join("\n")
}
