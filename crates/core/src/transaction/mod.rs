// Change transactions: an atomic, ordered list of structural edit steps
// plus the audited change event describing who asked for them.
//
// A transaction is constructed synchronously against a base tree and
// applied atomically; callers only ever observe the base document or the
// fully-applied result.

pub mod step;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::doc::{parse, render, DocTree};
use crate::types::{Actor, SectionChangeEvent, Selection};

pub use step::{map_pos_through, ReplaceStep, Slice};

/// An in-flight transaction: the evolving document plus the steps that
/// produced it.
#[derive(Debug, Clone)]
pub struct Transaction {
    doc: DocTree,
    steps: Vec<ReplaceStep>,
}

impl Transaction {
    pub fn new(doc: DocTree) -> Self {
        Self { doc, steps: Vec::new() }
    }

    /// Replace `[from, to)` (already clamped) with a slice.
    pub fn replace(&mut self, from: usize, to: usize, slice: Slice) {
        let step = ReplaceStep::new(&self.doc, from, to, slice);
        self.doc = step.apply(&self.doc);
        self.steps.push(step);
    }

    pub fn doc(&self) -> &DocTree {
        &self.doc
    }

    pub fn steps(&self) -> &[ReplaceStep] {
        &self.steps
    }

    /// Map a pre-transaction position through every step in order.
    pub fn map_pos(&self, pos: usize) -> usize {
        map_pos_through(&self.steps, pos)
    }

    pub fn into_parts(self) -> (DocTree, Vec<ReplaceStep>) {
        (self.doc, self.steps)
    }
}

/// Attribution and context for a proposed edit.
#[derive(Debug, Clone)]
pub struct EditInput {
    pub actor: Actor,
    /// Free-text request or prompt behind the edit; blank means none.
    pub request: Option<String>,
    /// Comment thread the edit originated from, if any.
    pub thread_id: Option<Uuid>,
}

impl EditInput {
    pub fn from_actor(actor: Actor) -> Self {
        Self { actor, request: None, thread_id: None }
    }
}

/// Result of building a transaction: the rendered preview plus the
/// recorded change event.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub preview_content: String,
    pub event: SectionChangeEvent,
}

/// Replace the entire document content with `target`.
///
/// The event's selection spans the full original document extent.
pub fn build_replace_all(base: &str, target: &str, input: EditInput) -> EditOutcome {
    let base_doc = parse(base);
    let size = base_doc.size();

    let mut transaction = Transaction::new(base_doc);
    transaction.replace(0, size, Slice::closed(parse(target).paragraphs));

    finish(transaction, Selection { from: 0, to: size }, input)
}

/// Replace `[from, to)` with `replacement`, splicing so that partial
/// paragraph boundaries merge with the surrounding content.
///
/// The range is clamped into the document; a range entirely outside the
/// bounds collapses to an empty insert at the nearest boundary. Never an
/// error: AI-proposed ranges routinely drift.
pub fn build_replace_range(
    base: &str,
    from: i64,
    to: i64,
    replacement: &str,
    input: EditInput,
) -> EditOutcome {
    let base_doc = parse(base);
    let size = base_doc.size() as i64;

    let clamped_from = from.clamp(0, size) as usize;
    let clamped_to = to.clamp(clamped_from as i64, size) as usize;
    if clamped_from as i64 != from || clamped_to as i64 != to {
        debug!(from, to, clamped_from, clamped_to, size, "clamped replacement range");
    }

    let mut transaction = Transaction::new(base_doc);
    transaction.replace(clamped_from, clamped_to, Slice::open(parse(replacement).paragraphs));

    finish(transaction, Selection { from: clamped_from, to: clamped_to }, input)
}

fn finish(transaction: Transaction, selection: Selection, input: EditInput) -> EditOutcome {
    let (doc, steps) = transaction.into_parts();
    let request = input
        .request
        .map(|request| request.trim().to_string())
        .filter(|request| !request.is_empty());

    EditOutcome {
        preview_content: render(&doc),
        event: SectionChangeEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor: input.actor,
            selection,
            thread_id: input.thread_id,
            request,
            steps,
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::types::Actor;

    use super::{build_replace_all, build_replace_range, EditInput};

    fn llm() -> EditInput {
        EditInput::from_actor(Actor::Llm { model: "test-model".into() })
    }

    #[test]
    fn replace_all_spans_full_extent_and_previews_target() {
        let outcome = build_replace_all("old one\nold two", "brand new", llm());

        assert_eq!(outcome.preview_content, "brand new");
        assert_eq!(outcome.event.selection.from, 0);
        assert_eq!(outcome.event.selection.to, 18); // two paragraph nodes of size 9
        assert_eq!(outcome.event.steps.len(), 1);
    }

    #[test]
    fn replace_range_splices_within_a_paragraph() {
        let outcome = build_replace_range("The quick brown fox", 5, 10, "agile", llm());

        assert_eq!(outcome.preview_content, "The agile brown fox");
        assert_eq!(outcome.event.selection.from, 5);
        assert_eq!(outcome.event.selection.to, 10);
    }

    #[test]
    fn replace_range_clamps_out_of_range_requests() {
        let base = "short";
        let size = 7i64; // 5 chars + paragraph tokens

        let outcome = build_replace_range(base, -5, size + 50, "whole new text", llm());

        assert_eq!(outcome.event.selection.from, 0);
        assert_eq!(outcome.event.selection.to, size as usize);
        assert_eq!(outcome.preview_content, "whole new text");
    }

    #[test]
    fn fully_out_of_bounds_range_collapses_to_boundary_insert() {
        let outcome = build_replace_range("base", 100, 200, "and more", llm());

        assert_eq!(outcome.event.selection.from, 6);
        assert_eq!(outcome.event.selection.to, 6);
        // the end boundary is between paragraphs, so the insert stands alone
        assert_eq!(outcome.preview_content, "base\nand more");
    }

    #[test]
    fn negative_collapsed_range_inserts_at_start() {
        let outcome = build_replace_range("base", -20, -10, "lead", llm());

        assert_eq!(outcome.event.selection.from, 0);
        assert_eq!(outcome.event.selection.to, 0);
        assert_eq!(outcome.preview_content, "lead\nbase");
    }

    #[test]
    fn multi_paragraph_replacement_merges_boundaries() {
        // replace "two" in the middle paragraph with a two-paragraph slice
        let base = "one\ntwo\nthree";
        let outcome = build_replace_range(base, 6, 9, "2a\n2b", llm());

        assert_eq!(outcome.preview_content, "one\n2a\n2b\nthree");
    }

    #[test]
    fn request_is_trimmed_and_blank_becomes_none() {
        let mut input = llm();
        input.request = Some("  tighten the prose  ".into());
        let outcome = build_replace_all("a", "b", input);
        assert_eq!(outcome.event.request.as_deref(), Some("tighten the prose"));

        let mut input = llm();
        input.request = Some("   ".into());
        let outcome = build_replace_all("a", "b", input);
        assert_eq!(outcome.event.request, None);
    }

    #[test]
    fn event_replays_to_the_preview() {
        let base = "alpha beta gamma";
        let outcome = build_replace_range(base, 7, 12, "BETA!", llm());

        let replayed = crate::history::replay_event(base, &outcome.event)
            .expect("replay against the base content should succeed");
        assert_eq!(replayed, outcome.preview_content);
    }
}
