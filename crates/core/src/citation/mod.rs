// Inline citation marker parsing (`[[ref:<id>]]` syntax).
//
// Adjacent markers separated only by whitespace, commas, or semicolons
// coalesce into a single cluster, e.g. `[[ref:a]], [[ref:b]]`.

pub mod bibliography;

/// Rendered in place of a citation node that lost its ids, so the node
/// stays visible instead of silently disappearing.
pub const UNKNOWN_REF_MARKER: &str = "[[ref:unknown]]";

const MARKER_OPEN: &str = "[[ref:";
const MARKER_CLOSE: &str = "]]";

/// One span of a tokenized line. Tokens partition the line: concatenating
/// the `Text` values and `Citation` raw spans reproduces the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineToken {
    /// Verbatim substring with no citation markers in it.
    Text(String),
    /// One cluster of adjacent markers, ids in left-to-right order
    /// (duplicates permitted), plus the raw source span.
    Citation { ids: Vec<String>, raw: String },
}

/// Tokenize a single line of stored text.
///
/// Never fails: bracket sequences that do not match the marker grammar are
/// left as plain text.
pub fn tokenize_line(line: &str) -> Vec<LineToken> {
    let mut tokens = Vec::new();
    let bytes = line.as_bytes();
    let mut text_start = 0usize;
    let mut index = 0usize;

    while index + 1 < bytes.len() {
        if bytes[index] == b'[' && bytes[index + 1] == b'[' {
            if let Some((first_id, first_end)) = parse_marker_at(line, index) {
                if text_start < index {
                    tokens.push(LineToken::Text(line[text_start..index].to_string()));
                }

                let cluster_start = index;
                let mut ids = vec![first_id];
                let mut cluster_end = first_end;

                // Absorb adjacent markers across separator runs. Separators
                // not followed by another marker stay with the trailing text.
                loop {
                    let after_separators = skip_separators(line, cluster_end);
                    match parse_marker_at(line, after_separators) {
                        Some((id, end)) => {
                            ids.push(id);
                            cluster_end = end;
                        }
                        None => break,
                    }
                }

                tokens.push(LineToken::Citation {
                    ids,
                    raw: line[cluster_start..cluster_end].to_string(),
                });
                text_start = cluster_end;
                index = cluster_end;
                continue;
            }
        }

        index += 1;
    }

    if text_start < line.len() {
        tokens.push(LineToken::Text(line[text_start..].to_string()));
    }

    tokens
}

/// Format a single citation marker for an id.
pub fn format_marker(id: &str) -> String {
    format!("{MARKER_OPEN}{id}{MARKER_CLOSE}")
}

/// Render a citation node's ids as space-joined markers.
///
/// An empty id list renders the unknown-reference sentinel rather than an
/// empty string.
pub fn render_markers(ids: &[String]) -> String {
    if ids.is_empty() {
        return UNKNOWN_REF_MARKER.to_string();
    }
    ids.iter().map(|id| format_marker(id)).collect::<Vec<_>>().join(" ")
}

/// True if `id` matches the marker id grammar (`[A-Za-z0-9-]+`).
pub fn is_valid_ref_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'-')
}

/// Parse one `[[ref:<id>]]` marker starting exactly at `start`.
/// Returns the id and the offset just past the closing `]]`.
fn parse_marker_at(line: &str, start: usize) -> Option<(String, usize)> {
    let rest = line.get(start..)?;
    let after_open = rest.strip_prefix(MARKER_OPEN)?;

    let id_len = after_open
        .bytes()
        .take_while(|byte| byte.is_ascii_alphanumeric() || *byte == b'-')
        .count();
    if id_len == 0 {
        return None;
    }
    if !after_open[id_len..].starts_with(MARKER_CLOSE) {
        return None;
    }

    let id = after_open[..id_len].to_string();
    Some((id, start + MARKER_OPEN.len() + id_len + MARKER_CLOSE.len()))
}

fn skip_separators(line: &str, mut index: usize) -> usize {
    let bytes = line.as_bytes();
    while index < bytes.len() && matches!(bytes[index], b' ' | b'\t' | b',' | b';') {
        index += 1;
    }
    index
}
