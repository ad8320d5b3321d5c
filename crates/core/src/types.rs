// Core domain types shared across all redline crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transaction::step::ReplaceStep;

/// The identity behind an edit, a comment, or a version commit.
///
/// Each variant carries only the fields relevant to it; consumers dispatch
/// on the `kind` tag, never on field presence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// A human collaborator.
    User { user_id: String, name: String },
    /// An AI assistant, identified by its model name.
    Llm { model: String },
}

impl Actor {
    /// Short display label: the user's name or the model name.
    pub fn label(&self) -> &str {
        match self {
            Actor::User { name, .. } => name,
            Actor::Llm { model } => model,
        }
    }
}

/// Who committed a version snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    User,
    Llm,
}

/// A half-open position range in tree coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selection {
    pub from: usize,
    pub to: usize,
}

/// An audited record of one applied transaction.
///
/// Steps are replayable: applying them in order to a document parsed from
/// the content the event was built against reconstructs the exact result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionChangeEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub actor: Actor,
    /// Selection the transaction replaced, clamped at application time.
    pub selection: Selection,
    /// Comment thread that originated this edit, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<Uuid>,
    /// Free-text request or prompt behind the edit. Omitted when blank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    pub steps: Vec<ReplaceStep>,
}

/// A text-range anchor bound to a comment thread.
///
/// While live, `from < to`. Once a transaction's mapping collapses the
/// range the anchor is frozen: `orphaned` flips, the last-known `text`
/// is kept for display, and the anchor is never remapped again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentAnchor {
    pub from: usize,
    pub to: usize,
    /// Snapshot of the anchored text at creation (or last good remap).
    pub text: String,
    #[serde(default)]
    pub orphaned: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    Open,
    Resolved,
}

/// One message within a comment thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentMessage {
    pub id: Uuid,
    pub author: Actor,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Links a thread message to the change event an AI edit produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiEditRecord {
    pub message_id: Uuid,
    pub change_event_id: Uuid,
    pub applied_at: DateTime<Utc>,
}

/// A comment thread attached to a text range of a section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentThread {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Actor,
    /// `None` only for threads restored from storage without an anchor.
    pub anchor: Option<CommentAnchor>,
    /// Copy of the anchored text when the thread was opened.
    pub excerpt: String,
    pub messages: Vec<CommentMessage>,
    pub status: ThreadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<Actor>,
    #[serde(default)]
    pub ai_edits: Vec<AiEditRecord>,
}

/// Immutable snapshot of a section at an explicit save point.
///
/// Never mutated after creation; superseded versions are retained for
/// audit and history playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionVersion {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub notes: String,
    pub source: VersionSource,
    /// Content the accumulated change events were applied against.
    pub base_content: String,
    pub change_events: Vec<SectionChangeEvent>,
    pub comment_threads: Vec<CommentThread>,
}

/// A structured-document section.
///
/// `content` is the authoritative flat representation; the structured tree
/// is reconstructed on demand and never persisted. For any content this
/// system produced, `render(parse(content)) == content`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Content as of the last committed version: the base the pending
    /// change events apply against.
    #[serde(default)]
    pub base_content: String,
    #[serde(default)]
    pub user_notes: String,
    #[serde(default)]
    pub versions: Vec<SectionVersion>,
    pub last_modified: DateTime<Utc>,
    /// Events applied since the last committed version.
    #[serde(default)]
    pub change_events: Vec<SectionChangeEvent>,
    #[serde(default)]
    pub comment_threads: Vec<CommentThread>,
}

impl Section {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            base_content: content.clone(),
            content,
            user_notes: String::new(),
            versions: Vec::new(),
            last_modified: Utc::now(),
            change_events: Vec::new(),
            comment_threads: Vec::new(),
        }
    }

    /// Record an applied change event and adopt its preview as content.
    pub fn apply_change(&mut self, content: String, event: SectionChangeEvent) {
        self.content = content;
        self.last_modified = event.timestamp;
        self.change_events.push(event);
    }

    /// Snapshot the current state into an immutable version.
    ///
    /// The pending change-event list moves into the snapshot; the section
    /// starts accumulating events against the new base.
    pub fn commit_version(&mut self, source: VersionSource, notes: impl Into<String>) -> Uuid {
        let base_content = std::mem::replace(&mut self.base_content, self.content.clone());

        let version = SectionVersion {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            content: self.content.clone(),
            notes: notes.into(),
            source,
            base_content,
            change_events: std::mem::take(&mut self.change_events),
            comment_threads: self.comment_threads.clone(),
        };
        let id = version.id;
        self.versions.push(version);
        id
    }

    /// Swap content back to a committed version.
    ///
    /// History stays intact: the version list is untouched and no change
    /// event is recorded for the swap itself. The restored content becomes
    /// the new base; change events still pending against the old base no
    /// longer replay and should be committed or discarded first.
    pub fn restore_version(&mut self, version_id: Uuid) -> bool {
        let Some(version) = self.versions.iter().find(|version| version.id == version_id) else {
            return false;
        };
        self.content = version.content.clone();
        self.base_content = self.content.clone();
        self.last_modified = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_serializes_with_kind_tag() {
        let user = Actor::User { user_id: "u-1".into(), name: "Dana".into() };
        let json = serde_json::to_value(&user).expect("actor should serialize");
        assert_eq!(json["kind"], "user");
        assert_eq!(json["user_id"], "u-1");

        let llm = Actor::Llm { model: "claude-sonnet-4-5".into() };
        let json = serde_json::to_value(&llm).expect("actor should serialize");
        assert_eq!(json["kind"], "llm");
        assert_eq!(json["model"], "claude-sonnet-4-5");
    }

    #[test]
    fn commit_version_moves_pending_events_into_snapshot() {
        let mut section = Section::new("Intro", "First draft.");
        section.change_events.push(sample_event());

        let id = section.commit_version(VersionSource::User, "save point");

        assert!(section.change_events.is_empty());
        assert_eq!(section.versions.len(), 1);
        let version = &section.versions[0];
        assert_eq!(version.id, id);
        assert_eq!(version.content, "First draft.");
        assert_eq!(version.change_events.len(), 1);
    }

    #[test]
    fn restore_version_swaps_content_without_touching_history() {
        let mut section = Section::new("Intro", "First draft.");
        let first = section.commit_version(VersionSource::User, "");
        section.content = "Second draft.".into();
        section.commit_version(VersionSource::Llm, "");

        assert!(section.restore_version(first));
        assert_eq!(section.content, "First draft.");
        assert_eq!(section.versions.len(), 2);

        assert!(!section.restore_version(Uuid::new_v4()));
    }

    fn sample_event() -> SectionChangeEvent {
        SectionChangeEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor: Actor::Llm { model: "test-model".into() },
            selection: Selection { from: 0, to: 0 },
            thread_id: None,
            request: None,
            steps: Vec::new(),
        }
    }
}
