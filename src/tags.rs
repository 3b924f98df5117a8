//! Tag vocabulary (the closed set of "interesting" tags) and tag-cell parsing.

use crate::config::normalize_tag_list;
use crate::util::normalize_tag;
use regex::Regex;
use std::sync::OnceLock;

/// Index of a tag inside a [`TagVocabulary`].
pub type TagId = usize;

/// Closed, sorted set of tag names. Tag ids are positions in the sorted list,
/// so every per-tag vector iterates tags in name order regardless of how the
/// caller listed them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagVocabulary {
    names: Vec<String>,
}

impl TagVocabulary {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { names: normalize_tag_list(tags) }
    }

    pub fn len(&self) -> usize { self.names.len() }
    pub fn is_empty(&self) -> bool { self.names.is_empty() }
    pub fn names(&self) -> &[String] { &self.names }

    pub fn name(&self, id: TagId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<TagId> {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).ok()
    }

    /// Keep only the labels inside the vocabulary; result is sorted and deduped.
    pub fn filter<I, S>(&self, labels: I) -> Vec<TagId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids: Vec<TagId> = labels
            .into_iter()
            .filter_map(|l| self.id_of(&normalize_tag(l.as_ref())))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Render tag ids back to the bracketed cell format, e.g. `[process, technology]`.
    pub fn format_cell(&self, ids: &[TagId]) -> String {
        let names: Vec<&str> = ids.iter().filter_map(|&id| self.name(id)).collect();
        format!("[{}]", names.join(", "))
    }
}

fn list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\[(.*)\]\s*$").expect("static regex"))
}

fn sep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*,\s*").expect("static regex"))
}

/// Parse a bracketed tag list such as `[process, 'technology']`.
/// Returns `None` when the cell is not a bracketed list; an empty or blank cell
/// is a valid empty list.
pub fn parse_tag_cell(cell: &str) -> Option<Vec<String>> {
    if cell.trim().is_empty() {
        return Some(Vec::new());
    }
    let caps = list_re().captures(cell)?;
    let body = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    Some(
        sep_re()
            .split(body)
            .map(normalize_tag)
            .filter(|t| !t.is_empty())
            .collect(),
    )
}
