// Version history playback: re-apply recorded change events.

use thiserror::Error;

use crate::doc::{parse, render, DocTree};
use crate::types::{SectionChangeEvent, SectionVersion};

/// Replay failures. Builder-side clamping never produces these; they mean
/// an event is being replayed against content it was not built for.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    #[error("step {step} of event {event} spans {from}..{to} but the document size is {size}")]
    StepOutOfBounds { event: uuid::Uuid, step: usize, from: usize, to: usize, size: usize },
}

/// Re-apply one change event's steps to `content`, reconstructing the
/// exact post-edit content.
pub fn replay_event(content: &str, event: &SectionChangeEvent) -> Result<String, ReplayError> {
    let mut doc = parse(content);
    apply_event(&mut doc, event)?;
    Ok(render(&doc))
}

/// Re-apply a sequence of change events in order.
pub fn replay_events<'a, I>(content: &str, events: I) -> Result<String, ReplayError>
where
    I: IntoIterator<Item = &'a SectionChangeEvent>,
{
    let mut doc = parse(content);
    for event in events {
        apply_event(&mut doc, event)?;
    }
    Ok(render(&doc))
}

/// Rebuild a committed version's content from its base plus its events.
///
/// For a well-formed version this equals `version.content`; a mismatch
/// means the stored snapshot and its event log disagree.
pub fn reconstruct_version(version: &SectionVersion) -> Result<String, ReplayError> {
    replay_events(&version.base_content, &version.change_events)
}

fn apply_event(doc: &mut DocTree, event: &SectionChangeEvent) -> Result<(), ReplayError> {
    for (index, step) in event.steps.iter().enumerate() {
        let size = doc.size();
        if step.from > step.to || step.to > size {
            return Err(ReplayError::StepOutOfBounds {
                event: event.id,
                step: index,
                from: step.from,
                to: step.to,
                size,
            });
        }
        *doc = step.apply(doc);
    }
    Ok(())
}
