// Structural edit steps: serializable, replayable, position-mapping.
//
// A `ReplaceStep` is the only step kind: it swaps the content of a
// `[from, to)` range for a slice of paragraphs. Applying the ordered step
// list of a change event to the document it was built against reproduces
// the exact post-edit document; the same `map_pos` arithmetic drives both
// transaction application and comment-anchor remapping, so the two can
// never drift apart.

use serde::{Deserialize, Serialize};

use crate::doc::{DocTree, Paragraph, ResolvedPos};

/// Paragraph content to splice in, with open sides.
///
/// An open side merges its boundary paragraph into the partial paragraph
/// left standing at the corresponding cut, instead of starting (or
/// ending) a fresh paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slice {
    pub content: Vec<Paragraph>,
    pub open_start: bool,
    pub open_end: bool,
}

impl Slice {
    /// The empty slice: pure deletion.
    pub fn empty() -> Self {
        Self { content: Vec::new(), open_start: true, open_end: true }
    }

    /// A slice that merges into surrounding paragraphs on both sides.
    pub fn open(content: Vec<Paragraph>) -> Self {
        Self { content, open_start: true, open_end: true }
    }

    /// A slice of standalone paragraphs, merging on neither side.
    pub fn closed(content: Vec<Paragraph>) -> Self {
        Self { content, open_start: false, open_end: false }
    }
}

/// Replace `[from, to)` with a slice.
///
/// `inserted` is the size the slice occupies in the result document,
/// recorded at build time so the step maps positions without access to
/// either document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplaceStep {
    pub from: usize,
    pub to: usize,
    pub slice: Slice,
    pub inserted: usize,
}

impl ReplaceStep {
    /// Build a step against `doc`, computing the inserted size from the
    /// actual application. `from`/`to` must already be clamped into
    /// `0..=doc.size()` with `from <= to`.
    pub fn new(doc: &DocTree, from: usize, to: usize, slice: Slice) -> Self {
        let mut step = Self { from, to, slice, inserted: 0 };
        let after = step.apply(doc);
        step.inserted = (after.size() + (to - from))
            .checked_sub(doc.size())
            .expect("replace step removed more than its deleted range");
        step
    }

    /// Apply this step to a document, producing the new document.
    ///
    /// Pure and total: positions are clamped into the document rather
    /// than failing, so replay against a compatible document is exact
    /// while a stray step still degrades deterministically.
    pub fn apply(&self, doc: &DocTree) -> DocTree {
        let from = self.from.min(doc.size());
        let to = self.to.clamp(from, doc.size());

        let (left_paragraphs, left_partial) = match doc.resolve(from) {
            ResolvedPos::Gap(index) => (doc.paragraphs[..index].to_vec(), None),
            ResolvedPos::Inside { paragraph, offset } => (
                doc.paragraphs[..paragraph].to_vec(),
                Some(doc.paragraphs[paragraph].split_at(offset).0),
            ),
        };
        let (right_partial, right_paragraphs) = match doc.resolve(to) {
            ResolvedPos::Gap(index) => (None, doc.paragraphs[index..].to_vec()),
            ResolvedPos::Inside { paragraph, offset } => (
                Some(doc.paragraphs[paragraph].split_at(offset).1),
                doc.paragraphs[paragraph + 1..].to_vec(),
            ),
        };

        let mut paragraphs = left_paragraphs;
        self.glue(&mut paragraphs, left_partial, right_partial);
        paragraphs.extend(right_paragraphs);
        DocTree { paragraphs }
    }

    /// Map a position in the pre-step document to the post-step document.
    ///
    /// Positions inside the replaced range collapse onto its start; this
    /// is how a fully-deleted anchor ends up with `from >= to`.
    pub fn map_pos(&self, pos: usize) -> usize {
        if pos < self.from {
            pos
        } else if pos >= self.to {
            pos - (self.to - self.from) + self.inserted
        } else {
            self.from
        }
    }

    fn glue(
        &self,
        out: &mut Vec<Paragraph>,
        left_partial: Option<Paragraph>,
        right_partial: Option<Paragraph>,
    ) {
        let mut content = self.slice.content.clone();

        if content.is_empty() {
            match (left_partial, right_partial) {
                (Some(left), Some(right)) => out.push(Paragraph::concat(left, right)),
                (Some(left), None) => out.push(left),
                (None, Some(right)) => out.push(right),
                (None, None) => {}
            }
            return;
        }

        let first = content.remove(0);
        match left_partial {
            Some(left) if self.slice.open_start => out.push(Paragraph::concat(left, first)),
            Some(left) => {
                out.push(left);
                out.push(first);
            }
            None => out.push(first),
        }
        out.extend(content);

        if let Some(right) = right_partial {
            if self.slice.open_end {
                let last = out.pop().expect("glue always pushes at least one paragraph");
                out.push(Paragraph::concat(last, right));
            } else {
                out.push(right);
            }
        }
    }
}

/// Map a position through an ordered step list, in step order.
pub fn map_pos_through(steps: &[ReplaceStep], pos: usize) -> usize {
    steps.iter().fold(pos, |pos, step| step.map_pos(pos))
}

#[cfg(test)]
mod tests {
    use crate::doc::{parse, render};

    use super::{map_pos_through, ReplaceStep, Slice};

    fn open_slice(text: &str) -> Slice {
        Slice::open(parse(text).paragraphs)
    }

    #[test]
    fn replace_within_one_paragraph() {
        let doc = parse("The quick brown fox");
        // positions 5..10 cover "quick" (open token at 0, chars from 1)
        let step = ReplaceStep::new(&doc, 5, 10, open_slice("agile"));

        assert_eq!(render(&step.apply(&doc)), "The agile brown fox");
        assert_eq!(step.inserted, 5);
    }

    #[test]
    fn delete_across_paragraph_boundary_merges_paragraphs() {
        let doc = parse("ab\ncd");
        // [2, 6) spans "b", the paragraph break, and "c"
        let step = ReplaceStep::new(&doc, 2, 6, Slice::empty());

        assert_eq!(render(&step.apply(&doc)), "ad");
        assert_eq!(step.inserted, 0);
    }

    #[test]
    fn multi_paragraph_open_slice_splits_the_host_paragraph() {
        let doc = parse("abcd");
        let step = ReplaceStep::new(&doc, 2, 2, open_slice("X\nY"));

        assert_eq!(render(&step.apply(&doc)), "aX\nYbcd");
        assert_eq!(step.inserted, 4);
    }

    #[test]
    fn closed_slice_keeps_replacement_paragraphs_standalone() {
        let doc = parse("abcd");
        let step = ReplaceStep::new(&doc, 2, 2, Slice::closed(parse("X").paragraphs));

        assert_eq!(render(&step.apply(&doc)), "a\nX\nbcd");
    }

    #[test]
    fn replace_whole_document_with_closed_slice() {
        let doc = parse("old one\nold two");
        let step =
            ReplaceStep::new(&doc, 0, doc.size(), Slice::closed(parse("fresh").paragraphs));

        assert_eq!(render(&step.apply(&doc)), "fresh");
    }

    #[test]
    fn atomic_citation_node_never_splits() {
        let doc = parse("a [[ref:x]] b");
        // content: "a " (2) + citation (1) + " b" (2); delete the node at [3, 4)
        let step = ReplaceStep::new(&doc, 3, 4, Slice::empty());

        assert_eq!(render(&step.apply(&doc)), "a  b");
    }

    #[test]
    fn map_pos_shifts_after_and_collapses_inside() {
        let doc = parse("The quick brown fox");
        let step = ReplaceStep::new(&doc, 5, 11, open_slice("agile "));

        assert_eq!(step.map_pos(3), 3); // before the window
        assert_eq!(step.map_pos(5), 5); // window start collapses onto itself
        assert_eq!(step.map_pos(8), 5); // interior collapses to start
        assert_eq!(step.map_pos(11), 11); // window end shifts by the delta
        assert_eq!(step.map_pos(15), 15);
    }

    #[test]
    fn insertion_at_a_point_shifts_trailing_positions() {
        let doc = parse("abcd");
        let step = ReplaceStep::new(&doc, 3, 3, open_slice("XY"));

        assert_eq!(step.map_pos(2), 2);
        assert_eq!(step.map_pos(3), 5); // at the insert point, follows the tail
        assert_eq!(step.map_pos(4), 6);
    }

    #[test]
    fn map_pos_through_applies_steps_in_order() {
        let doc = parse("one two three");
        let first = ReplaceStep::new(&doc, 1, 4, Slice::empty()); // drop "one"
        let after_first = first.apply(&doc);
        let second = ReplaceStep::new(&after_first, 1, 1, open_slice("zero "));

        let steps = vec![first, second];
        // position after "three" in the original
        assert_eq!(map_pos_through(&steps, 14), 16);
        // inside the deleted word: collapses to the cut, then trails the insert
        assert_eq!(map_pos_through(&steps, 2), 6);
    }

    #[test]
    fn steps_round_trip_through_json() {
        let doc = parse("serialize me");
        let step = ReplaceStep::new(&doc, 1, 3, open_slice("X [[ref:a]]"));

        let json = serde_json::to_string(&step).expect("step should serialize");
        let back: ReplaceStep = serde_json::from_str(&json).expect("step should deserialize");

        assert_eq!(back, step);
        assert_eq!(render(&back.apply(&doc)), render(&step.apply(&doc)));
    }
}
