// Bibliography numbering: derived, never cached.
//
// Ranks are 1-based, assigned in first-appearance order across the full
// ordered section list, and recomputed from scratch each time.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{tokenize_line, LineToken};

/// Scan ordered section contents and return unique citation ids in
/// first-appearance order. Later repeats do not move an id's position.
pub fn bibliography_order<'a, I>(section_contents: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order = Vec::new();
    let mut seen = HashSet::new();

    for content in section_contents {
        for line in content.split('\n') {
            for token in tokenize_line(line) {
                if let LineToken::Citation { ids, .. } = token {
                    for id in ids {
                        if seen.insert(id.clone()) {
                            order.push(id);
                        }
                    }
                }
            }
        }
    }

    order
}

/// Replace every citation cluster in `text` with its bracketed rank list.
///
/// Ids missing from `order` drop out of their cluster; a cluster where no
/// id resolves is left verbatim as a visible signal that resolution failed.
pub fn compile_citations(text: &str, order: &[String]) -> String {
    let rank_of: HashMap<&str, usize> =
        order.iter().enumerate().map(|(index, id)| (id.as_str(), index + 1)).collect();

    text.split('\n')
        .map(|line| compile_line(line, &rank_of))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format sorted 1-based ranks as a bracketed range list, e.g.
/// `[1, 2, 3, 5]` → `"[1-3, 5]"`. Consecutive ranks collapse to
/// `start-end`; isolated ranks stand alone.
pub fn format_ranks(ranks: &[usize]) -> String {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut spans: Vec<String> = Vec::new();
    let mut index = 0;
    while index < sorted.len() {
        let start = sorted[index];
        let mut end = start;
        while index + 1 < sorted.len() && sorted[index + 1] == end + 1 {
            index += 1;
            end = sorted[index];
        }
        if start == end {
            spans.push(start.to_string());
        } else {
            spans.push(format!("{start}-{end}"));
        }
        index += 1;
    }

    format!("[{}]", spans.join(", "))
}

fn compile_line(line: &str, rank_of: &HashMap<&str, usize>) -> String {
    tokenize_line(line)
        .into_iter()
        .map(|token| match token {
            LineToken::Text(value) => value,
            LineToken::Citation { ids, raw } => {
                let ranks: Vec<usize> =
                    ids.iter().filter_map(|id| rank_of.get(id.as_str()).copied()).collect();
                if ranks.is_empty() {
                    debug!(cluster = %raw, "citation cluster did not resolve, leaving verbatim");
                    raw
                } else {
                    format_ranks(&ranks)
                }
            }
        })
        .collect()
}
