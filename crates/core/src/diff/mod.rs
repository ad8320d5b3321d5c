// Word-level diff with human-readable grouping.
//
// Tokens are words carrying their trailing whitespace, so spacing travels
// with the preceding word and rendering stays stable. Alignment is a
// longest-common-subsequence over word tokens; the full DP table is
// acceptable because section text is bounded (a few thousand words).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Equal,
    Delete,
    Insert,
}

/// One contiguous block of diff output.
///
/// Concatenating `Equal` + `Delete` values in order reconstructs the old
/// text; `Equal` + `Insert` reconstructs the new text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffBlock {
    pub kind: DiffKind,
    pub value: String,
}

impl DiffBlock {
    fn new(kind: DiffKind, value: String) -> Self {
        Self { kind, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordEdit<'a> {
    Equal(&'a str),
    Delete(&'a str),
    Insert(&'a str),
}

/// Compute a grouped word-level diff from `before` to `after`.
///
/// Each maximal run of changed words collapses into at most one delete
/// block immediately followed by at most one insert block; equal runs
/// merge likewise. Identical inputs always produce identical output.
pub fn diff(before: &str, after: &str) -> Vec<DiffBlock> {
    if before == after {
        if before.is_empty() {
            return Vec::new();
        }
        return vec![DiffBlock::new(DiffKind::Equal, before.to_string())];
    }

    let old_words = word_tokens(before);
    let new_words = word_tokens(after);
    let edits = align_words(&old_words, &new_words);
    group_edits(&edits)
}

/// Split text into word tokens: a maximal non-whitespace run plus any
/// immediately trailing whitespace. Leading whitespace forms its own
/// token. Concatenating tokens reproduces the input exactly.
fn word_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let after_word = &rest[word_end..];
        let ws_len = after_word.len()
            - after_word.trim_start_matches(char::is_whitespace).len();
        let token_end = word_end + ws_len;
        tokens.push(&rest[..token_end]);
        rest = &rest[token_end..];
    }

    tokens
}

fn align_words<'a>(old_words: &[&'a str], new_words: &[&'a str]) -> Vec<WordEdit<'a>> {
    let old_len = old_words.len();
    let new_len = new_words.len();

    if old_len == 0 {
        return new_words.iter().map(|word| WordEdit::Insert(word)).collect();
    }
    if new_len == 0 {
        return old_words.iter().map(|word| WordEdit::Delete(word)).collect();
    }

    // LCS length table, (old_len + 1) x (new_len + 1).
    let mut table = vec![vec![0u32; new_len + 1]; old_len + 1];
    for i in 1..=old_len {
        for j in 1..=new_len {
            table[i][j] = if old_words[i - 1] == new_words[j - 1] {
                table[i - 1][j - 1] + 1
            } else {
                table[i - 1][j].max(table[i][j - 1])
            };
        }
    }

    // Backtrack from (old_len, new_len). On a tie between the insert and
    // delete directions, take the insert step: the walk emits in reverse,
    // so deletions end up flushed before insertions within a replacement
    // window once the result is reversed.
    let mut edits = Vec::with_capacity(old_len + new_len);
    let mut i = old_len;
    let mut j = new_len;
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old_words[i - 1] == new_words[j - 1] {
            edits.push(WordEdit::Equal(old_words[i - 1]));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table[i][j - 1] >= table[i - 1][j]) {
            edits.push(WordEdit::Insert(new_words[j - 1]));
            j -= 1;
        } else {
            edits.push(WordEdit::Delete(old_words[i - 1]));
            i -= 1;
        }
    }
    edits.reverse();
    edits
}

/// Merge the raw token edits into grouped blocks: each maximal non-equal
/// run becomes one delete block then one insert block (either may be
/// absent), and adjacent equal tokens merge into one block.
fn group_edits(edits: &[WordEdit<'_>]) -> Vec<DiffBlock> {
    let mut blocks: Vec<DiffBlock> = Vec::new();
    let mut deleted = String::new();
    let mut inserted = String::new();

    let mut flush =
        |blocks: &mut Vec<DiffBlock>, deleted: &mut String, inserted: &mut String| {
            if !deleted.is_empty() {
                blocks.push(DiffBlock::new(DiffKind::Delete, std::mem::take(deleted)));
            }
            if !inserted.is_empty() {
                blocks.push(DiffBlock::new(DiffKind::Insert, std::mem::take(inserted)));
            }
        };

    for edit in edits {
        match edit {
            WordEdit::Equal(word) => {
                flush(&mut blocks, &mut deleted, &mut inserted);
                match blocks.last_mut() {
                    Some(DiffBlock { kind: DiffKind::Equal, value }) => value.push_str(word),
                    _ => blocks.push(DiffBlock::new(DiffKind::Equal, (*word).to_string())),
                }
            }
            WordEdit::Delete(word) => deleted.push_str(word),
            WordEdit::Insert(word) => inserted.push_str(word),
        }
    }
    flush(&mut blocks, &mut deleted, &mut inserted);

    blocks
}
