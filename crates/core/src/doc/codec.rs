// Bidirectional transform between flat stored text and the document tree.
//
// Flat format: UTF-8 text, paragraphs separated by `\n`, inline citation
// markers `[[ref:<id>]]`. `parse` is total; `render(parse(s)) == s` for
// any string this system produced.

use crate::citation::{self, tokenize_line, LineToken};

use super::{DocTree, Inline, Paragraph};

/// Parse flat stored text into a document tree. Never fails: malformed
/// markers stay plain text, empty lines become empty paragraphs.
pub fn parse(text: &str) -> DocTree {
    DocTree { paragraphs: text.split('\n').map(parse_line).collect() }
}

/// Render a document tree back to flat stored text.
pub fn render(doc: &DocTree) -> String {
    doc.paragraphs.iter().map(render_paragraph).collect::<Vec<_>>().join("\n")
}

fn parse_line(line: &str) -> Paragraph {
    let mut paragraph = Paragraph::default();
    for token in tokenize_line(line) {
        match token {
            LineToken::Text(text) => paragraph.push_inline(Inline::Text { text }),
            LineToken::Citation { ids, .. } => paragraph.push_inline(Inline::Citation { ids }),
        }
    }
    paragraph
}

/// Render one paragraph's inline content.
///
/// Citation nodes get a separating space when the preceding character is
/// not whitespace, so markers never glue onto a word.
pub fn render_paragraph(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    for inline in &paragraph.inlines {
        match inline {
            Inline::Text { text } => out.push_str(text),
            Inline::Citation { ids } => {
                if out.chars().next_back().is_some_and(|ch| !ch.is_whitespace()) {
                    out.push(' ');
                }
                out.push_str(&citation::render_markers(ids));
            }
        }
    }
    out
}
