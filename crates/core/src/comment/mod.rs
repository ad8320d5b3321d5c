// Comment threads and their text-range anchors.
//
// Anchors are remapped through every transaction with the same position
// arithmetic the transaction itself used, in step order. An anchor whose
// range collapses (or leaves the document) is orphaned: frozen with its
// last-good text snapshot, never remapped again, never deleted.

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::doc::DocTree;
use crate::transaction::step::ReplaceStep;
use crate::types::{
    Actor, AiEditRecord, CommentAnchor, CommentMessage, CommentThread, ThreadStatus,
};

/// Transient highlighted region, e.g. the range under discussion while a
/// comment is being authored. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionLock {
    pub from: usize,
    pub to: usize,
}

/// How anchors are presented by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationMode {
    /// Every live anchor gets an inline highlight.
    Highlights,
    /// Every live anchor gets a positioned marker at its start; only the
    /// selected thread's range is highlighted inline.
    Bubbles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationKind {
    Inline { from: usize, to: usize },
    Marker { pos: usize },
}

/// One UI decoration, resolvable back to exactly one thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoration {
    pub thread_id: Uuid,
    pub kind: DecorationKind,
    pub selected: bool,
}

/// Remap an anchor through an ordered step list.
///
/// Orphaned anchors come back unchanged (they are frozen). A live anchor
/// whose mapped range collapses or leaves `doc_size` is returned orphaned
/// with its previous text snapshot intact.
pub fn remap_anchor(anchor: &CommentAnchor, steps: &[ReplaceStep], doc_size: usize) -> CommentAnchor {
    if anchor.orphaned {
        return anchor.clone();
    }

    let mut from = anchor.from;
    let mut to = anchor.to;
    for step in steps {
        from = step.map_pos(from);
        to = step.map_pos(to);
    }

    if from >= to || to > doc_size {
        warn!(
            old_from = anchor.from,
            old_to = anchor.to,
            from,
            to,
            doc_size,
            "comment anchor orphaned by document edit"
        );
        return CommentAnchor { from: anchor.from, to: anchor.to, text: anchor.text.clone(), orphaned: true };
    }

    CommentAnchor { from, to, text: anchor.text.clone(), orphaned: false }
}

/// Owned-by-the-caller session state for one section's comment threads.
#[derive(Debug, Clone, Default)]
pub struct CommentSession {
    threads: Vec<CommentThread>,
    selection: Option<SelectionLock>,
}

impl CommentSession {
    pub fn new(threads: Vec<CommentThread>) -> Self {
        Self { threads, selection: None }
    }

    pub fn threads(&self) -> &[CommentThread] {
        &self.threads
    }

    pub fn thread(&self, thread_id: Uuid) -> Option<&CommentThread> {
        self.threads.iter().find(|thread| thread.id == thread_id)
    }

    pub fn into_threads(self) -> Vec<CommentThread> {
        self.threads
    }

    /// Open a new thread anchored at the active selection.
    ///
    /// The range is clamped into the document; the anchor snapshots the
    /// covered text, which also becomes the thread excerpt.
    pub fn create_thread(
        &mut self,
        doc: &DocTree,
        actor: Actor,
        from: usize,
        to: usize,
        body: impl Into<String>,
    ) -> Uuid {
        let size = doc.size();
        let from = from.min(size);
        let to = to.clamp(from, size);
        let text = doc.text_between(from, to);
        let now = Utc::now();

        let thread = CommentThread {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            created_by: actor.clone(),
            anchor: Some(CommentAnchor { from, to, text: text.clone(), orphaned: from >= to }),
            excerpt: text,
            messages: vec![CommentMessage {
                id: Uuid::new_v4(),
                author: actor,
                body: body.into(),
                created_at: now,
            }],
            status: ThreadStatus::Open,
            resolved_at: None,
            resolved_by: None,
            ai_edits: Vec::new(),
        };
        let id = thread.id;
        self.threads.push(thread);
        id
    }

    pub fn add_message(&mut self, thread_id: Uuid, author: Actor, body: impl Into<String>) -> Option<Uuid> {
        let thread = self.threads.iter_mut().find(|thread| thread.id == thread_id)?;
        let message = CommentMessage {
            id: Uuid::new_v4(),
            author,
            body: body.into(),
            created_at: Utc::now(),
        };
        let id = message.id;
        thread.messages.push(message);
        thread.updated_at = Utc::now();
        Some(id)
    }

    /// Mark a thread resolved. Does not touch the anchor.
    pub fn resolve(&mut self, thread_id: Uuid, actor: Actor) -> bool {
        let Some(thread) = self.threads.iter_mut().find(|thread| thread.id == thread_id) else {
            return false;
        };
        let now = Utc::now();
        thread.status = ThreadStatus::Resolved;
        thread.resolved_at = Some(now);
        thread.resolved_by = Some(actor);
        thread.updated_at = now;
        true
    }

    /// Reopen a resolved thread, clearing the resolution record. Does not
    /// touch the anchor.
    pub fn reopen(&mut self, thread_id: Uuid) -> bool {
        let Some(thread) = self.threads.iter_mut().find(|thread| thread.id == thread_id) else {
            return false;
        };
        thread.status = ThreadStatus::Open;
        thread.resolved_at = None;
        thread.resolved_by = None;
        thread.updated_at = Utc::now();
        true
    }

    /// Explicit delete: the only way a thread disappears.
    pub fn delete(&mut self, thread_id: Uuid) -> bool {
        let before = self.threads.len();
        self.threads.retain(|thread| thread.id != thread_id);
        self.threads.len() != before
    }

    /// Link an AI edit's change event back to the thread it came from.
    pub fn record_ai_edit(&mut self, thread_id: Uuid, message_id: Uuid, change_event_id: Uuid) -> bool {
        let Some(thread) = self.threads.iter_mut().find(|thread| thread.id == thread_id) else {
            return false;
        };
        thread.ai_edits.push(AiEditRecord {
            message_id,
            change_event_id,
            applied_at: Utc::now(),
        });
        thread.updated_at = Utc::now();
        true
    }

    pub fn lock_selection(&mut self, from: usize, to: usize) {
        self.selection = Some(SelectionLock { from, to });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<SelectionLock> {
        self.selection
    }

    /// Remap every live anchor (and the selection lock) through a
    /// transaction's steps, in step order. `doc` is the post-transaction
    /// document: live anchors refresh their text snapshot against it.
    pub fn apply_transaction(&mut self, steps: &[ReplaceStep], doc: &DocTree) {
        let size = doc.size();

        for thread in &mut self.threads {
            let Some(anchor) = thread.anchor.as_ref() else {
                continue;
            };
            let mut remapped = remap_anchor(anchor, steps, size);
            if !remapped.orphaned {
                remapped.text = doc.text_between(remapped.from, remapped.to);
            }
            thread.anchor = Some(remapped);
        }

        if let Some(lock) = self.selection {
            let mut from = lock.from;
            let mut to = lock.to;
            for step in steps {
                from = step.map_pos(from);
                to = step.map_pos(to);
            }
            // An invalid lock clears entirely rather than collapsing.
            self.selection =
                (from < to && to <= size).then_some(SelectionLock { from, to });
        }
    }

    /// Decorations for the UI layer, in document order.
    pub fn decorations(&self, mode: DecorationMode, selected: Option<Uuid>) -> Vec<Decoration> {
        let mut decorations = Vec::new();

        for thread in &self.threads {
            let Some(anchor) = thread.anchor.as_ref() else {
                continue;
            };
            if anchor.orphaned {
                continue;
            }
            let is_selected = selected == Some(thread.id);

            match mode {
                DecorationMode::Highlights => decorations.push(Decoration {
                    thread_id: thread.id,
                    kind: DecorationKind::Inline { from: anchor.from, to: anchor.to },
                    selected: is_selected,
                }),
                DecorationMode::Bubbles => {
                    decorations.push(Decoration {
                        thread_id: thread.id,
                        kind: DecorationKind::Marker { pos: anchor.from },
                        selected: is_selected,
                    });
                    if is_selected {
                        decorations.push(Decoration {
                            thread_id: thread.id,
                            kind: DecorationKind::Inline { from: anchor.from, to: anchor.to },
                            selected: true,
                        });
                    }
                }
            }
        }

        decorations.sort_by_key(|decoration| match decoration.kind {
            DecorationKind::Inline { from, .. } => from,
            DecorationKind::Marker { pos } => pos,
        });
        decorations
    }

    /// Resolve a click position to exactly one thread.
    ///
    /// Among live anchors covering `pos`, the smallest range wins; ties go
    /// to the most recently updated thread.
    pub fn thread_at(&self, pos: usize) -> Option<Uuid> {
        self.threads
            .iter()
            .filter_map(|thread| {
                let anchor = thread.anchor.as_ref()?;
                if anchor.orphaned || pos < anchor.from || pos >= anchor.to {
                    return None;
                }
                Some((anchor.to - anchor.from, thread.updated_at, thread.id))
            })
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
            .map(|(_, _, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use crate::doc::parse;
    use crate::transaction::{Slice, Transaction};
    use crate::types::{Actor, ThreadStatus};

    use super::{CommentSession, DecorationKind, DecorationMode};

    fn user() -> Actor {
        Actor::User { user_id: "u-1".into(), name: "Dana".into() }
    }

    #[test]
    fn create_thread_snapshots_anchor_text() {
        let doc = parse("The quick brown fox");
        let mut session = CommentSession::default();

        let id = session.create_thread(&doc, user(), 5, 10, "tighten this");

        let thread = session.thread(id).expect("thread should exist");
        let anchor = thread.anchor.as_ref().expect("anchor should be set");
        assert_eq!(anchor.text, "quick");
        assert_eq!(thread.excerpt, "quick");
        assert!(!anchor.orphaned);
        assert_eq!(thread.status, ThreadStatus::Open);
    }

    #[test]
    fn anchor_follows_edits_before_it() {
        let doc = parse("The quick brown fox");
        let mut session = CommentSession::default();
        let id = session.create_thread(&doc, user(), 11, 16, "about brown");

        // replace "The" with "A" ahead of the anchor
        let mut transaction = Transaction::new(doc);
        transaction.replace(1, 4, Slice::open(parse("A").paragraphs));
        session.apply_transaction(transaction.steps(), transaction.doc());

        let anchor = session.thread(id).unwrap().anchor.as_ref().unwrap();
        assert!(!anchor.orphaned);
        assert_eq!(anchor.from, 9);
        assert_eq!(anchor.to, 14);
        assert_eq!(anchor.text, "brown");
    }

    #[test]
    fn full_deletion_orphans_anchor_and_keeps_text() {
        let doc = parse("The quick brown fox");
        let mut session = CommentSession::default();
        let id = session.create_thread(&doc, user(), 11, 16, "about brown");

        // delete "quick brown fox" entirely
        let mut transaction = Transaction::new(doc);
        transaction.replace(5, 20, Slice::empty());
        session.apply_transaction(transaction.steps(), transaction.doc());

        let anchor = session.thread(id).unwrap().anchor.as_ref().unwrap();
        assert!(anchor.orphaned);
        assert_eq!(anchor.text, "brown");
        // status is untouched by orphaning
        assert_eq!(session.thread(id).unwrap().status, ThreadStatus::Open);
    }

    #[test]
    fn orphaned_anchor_is_frozen_on_later_transactions() {
        let doc = parse("abcdef");
        let mut session = CommentSession::default();
        let id = session.create_thread(&doc, user(), 2, 4, "note");

        let mut transaction = Transaction::new(doc);
        transaction.replace(1, 7, Slice::empty());
        session.apply_transaction(transaction.steps(), transaction.doc());
        let orphaned = session.thread(id).unwrap().anchor.clone().unwrap();
        assert!(orphaned.orphaned);

        // another edit must not move the frozen anchor
        let mut second = Transaction::new(transaction.into_parts().0);
        second.replace(1, 1, Slice::open(parse("XYZ").paragraphs));
        session.apply_transaction(second.steps(), second.doc());

        assert_eq!(session.thread(id).unwrap().anchor.clone().unwrap(), orphaned);
    }

    #[test]
    fn resolve_and_reopen_leave_anchor_alone() {
        let doc = parse("some commented text");
        let mut session = CommentSession::default();
        let id = session.create_thread(&doc, user(), 6, 15, "look here");
        let anchor_before = session.thread(id).unwrap().anchor.clone();

        assert!(session.resolve(id, user()));
        let thread = session.thread(id).unwrap();
        assert_eq!(thread.status, ThreadStatus::Resolved);
        assert!(thread.resolved_at.is_some());
        assert!(thread.resolved_by.is_some());
        assert_eq!(thread.anchor, anchor_before);

        assert!(session.reopen(id));
        let thread = session.thread(id).unwrap();
        assert_eq!(thread.status, ThreadStatus::Open);
        assert!(thread.resolved_at.is_none());
        assert!(thread.resolved_by.is_none());
        assert_eq!(thread.anchor, anchor_before);
    }

    #[test]
    fn delete_is_explicit_and_terminal() {
        let doc = parse("text");
        let mut session = CommentSession::default();
        let id = session.create_thread(&doc, user(), 1, 3, "note");

        assert!(session.delete(id));
        assert!(session.thread(id).is_none());
        assert!(!session.delete(id));
    }

    #[test]
    fn selection_lock_remaps_and_clears_when_invalid() {
        let doc = parse("The quick brown fox");
        let mut session = CommentSession::default();
        session.lock_selection(11, 16);

        // edit before the lock shifts it
        let mut transaction = Transaction::new(doc);
        transaction.replace(1, 4, Slice::open(parse("A").paragraphs));
        session.apply_transaction(transaction.steps(), transaction.doc());
        assert_eq!(session.selection().map(|lock| (lock.from, lock.to)), Some((9, 14)));

        // deleting the locked range clears the lock instead of collapsing it
        let mut second = Transaction::new(transaction.into_parts().0);
        second.replace(9, 14, Slice::empty());
        session.apply_transaction(second.steps(), second.doc());
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn highlights_mode_decorates_every_live_anchor() {
        let doc = parse("alpha beta gamma delta");
        let mut session = CommentSession::default();
        let first = session.create_thread(&doc, user(), 1, 6, "a");
        let second = session.create_thread(&doc, user(), 7, 11, "b");

        let decorations = session.decorations(DecorationMode::Highlights, Some(second));

        assert_eq!(decorations.len(), 2);
        assert_eq!(decorations[0].thread_id, first);
        assert!(!decorations[0].selected);
        assert_eq!(decorations[0].kind, DecorationKind::Inline { from: 1, to: 6 });
        assert!(decorations[1].selected);
    }

    #[test]
    fn bubbles_mode_highlights_only_the_selected_thread() {
        let doc = parse("alpha beta gamma delta");
        let mut session = CommentSession::default();
        let first = session.create_thread(&doc, user(), 1, 6, "a");
        let second = session.create_thread(&doc, user(), 7, 11, "b");

        let decorations = session.decorations(DecorationMode::Bubbles, Some(second));

        let markers: Vec<_> = decorations
            .iter()
            .filter(|d| matches!(d.kind, DecorationKind::Marker { .. }))
            .collect();
        let inlines: Vec<_> = decorations
            .iter()
            .filter(|d| matches!(d.kind, DecorationKind::Inline { .. }))
            .collect();

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].thread_id, first);
        assert_eq!(inlines.len(), 1);
        assert_eq!(inlines[0].thread_id, second);
        assert!(inlines[0].selected);
    }

    #[test]
    fn orphaned_anchors_are_not_decorated() {
        let doc = parse("alpha beta");
        let mut session = CommentSession::default();
        session.create_thread(&doc, user(), 1, 6, "a");

        let mut transaction = Transaction::new(doc);
        transaction.replace(1, 6, Slice::empty());
        session.apply_transaction(transaction.steps(), transaction.doc());

        assert!(session.decorations(DecorationMode::Highlights, None).is_empty());
    }

    #[test]
    fn click_resolves_to_innermost_thread() {
        let doc = parse("nested anchor ranges here");
        let mut session = CommentSession::default();
        let outer = session.create_thread(&doc, user(), 1, 20, "outer");
        let inner = session.create_thread(&doc, user(), 8, 14, "inner");

        assert_eq!(session.thread_at(10), Some(inner));
        assert_eq!(session.thread_at(3), Some(outer));
        assert_eq!(session.thread_at(24), None);
    }

    #[test]
    fn ai_edit_links_thread_to_change_event() {
        let doc = parse("draft text");
        let mut session = CommentSession::default();
        let id = session.create_thread(&doc, user(), 1, 6, "please fix");
        let message = session
            .add_message(id, Actor::Llm { model: "test-model".into() }, "done")
            .expect("message should be added");

        let event_id = uuid::Uuid::new_v4();
        assert!(session.record_ai_edit(id, message, event_id));
        let thread = session.thread(id).unwrap();
        assert_eq!(thread.ai_edits.len(), 1);
        assert_eq!(thread.ai_edits[0].change_event_id, event_id);
    }
}
