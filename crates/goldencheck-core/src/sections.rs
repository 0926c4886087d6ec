//! Markdown structure of a graded response.
//!
//! Responses are split on level-2 headings (`## Name`). A section's body runs
//! from its heading to the next heading, or to the end of the text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Name of the section whose entries are counted against `max_assumptions`.
pub const ASSUMPTIONS_SECTION: &str = "가정";

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*##\s+(.+?)\s*$").expect("section regex"));
static TABLE_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|?\s*:?-{3,}").expect("table separator regex"));
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*]|[0-9]+\.)\s+").expect("list item regex"));

/// A level-2 section of a response, borrowed from the response text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    /// Heading text without the `##` marker.
    pub name: &'a str,
    /// Trimmed text between this heading and the next.
    pub body: &'a str,
}

/// Split `text` into its level-2 sections, in document order.
pub fn parse_sections(text: &str) -> Vec<Section<'_>> {
    let headings: Vec<_> = SECTION_RE.captures_iter(text).collect();
    headings
        .iter()
        .enumerate()
        .map(|(i, caps)| {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let name = caps.get(1).map_or("", |m| m.as_str()).trim();
            let end = headings
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |m| m.start());
            Section {
                name,
                body: text[whole.end..end].trim(),
            }
        })
        .collect()
}

/// Body of the named section. When a heading repeats, the last one wins.
pub fn section_body<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    parse_sections(text)
        .into_iter()
        .rev()
        .find(|s| s.name == name)
        .map(|s| s.body)
}

/// Canonical form of a required section name: first `##` removed, trimmed.
pub fn canonical_section(name: &str) -> String {
    name.replacen("##", "", 1).trim().to_string()
}

/// Required section names (canonicalized) that have no matching heading.
pub fn find_missing_sections(text: &str, required: &[String]) -> Vec<String> {
    let present: HashSet<&str> = parse_sections(text).iter().map(|s| s.name).collect();
    required
        .iter()
        .map(|r| canonical_section(r))
        .filter(|wanted| !present.contains(wanted.as_str()))
        .collect()
}

/// Ways an assumptions section may be laid out, from most to least structured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssumptionLayout {
    /// A markdown table: header row, separator row, then data rows.
    Table,
    /// Bulleted (`-`, `*`) or numbered (`1.`) list items.
    List,
    /// Any non-blank line.
    Lines,
}

impl AssumptionLayout {
    /// Detection order. The first layout that counts a non-zero number of
    /// entries decides the result.
    pub const DETECTION_ORDER: [AssumptionLayout; 3] = [
        AssumptionLayout::Table,
        AssumptionLayout::List,
        AssumptionLayout::Lines,
    ];

    /// Count entries in `lines` under this layout.
    pub fn count(self, lines: &[&str]) -> usize {
        match self {
            AssumptionLayout::Table => count_table_rows(lines),
            AssumptionLayout::List => lines.iter().filter(|l| LIST_ITEM_RE.is_match(l)).count(),
            AssumptionLayout::Lines => lines.iter().filter(|l| !l.trim().is_empty()).count(),
        }
    }
}

fn count_table_rows(lines: &[&str]) -> usize {
    let rows: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| !l.trim().is_empty())
        .collect();
    if rows.len() < 3
        || !rows[0].trim_start().starts_with('|')
        || !TABLE_SEPARATOR_RE.is_match(rows[1])
    {
        return 0;
    }
    rows[2..]
        .iter()
        .filter(|l| l.trim_start().starts_with('|'))
        .count()
}

/// Layout and entry count of the assumptions section, or `None` when the
/// section is absent or empty.
pub fn detect_assumptions(text: &str) -> Option<(AssumptionLayout, usize)> {
    let body = section_body(text, ASSUMPTIONS_SECTION)?;
    if body.is_empty() {
        return None;
    }
    let lines: Vec<&str> = body.lines().map(str::trim_end).collect();
    AssumptionLayout::DETECTION_ORDER
        .iter()
        .map(|layout| (*layout, layout.count(&lines)))
        .find(|(_, n)| *n > 0)
}

/// Number of entries in the assumptions section (0 when absent).
pub fn count_assumptions(text: &str) -> usize {
    detect_assumptions(text).map_or(0, |(_, n)| n)
}
