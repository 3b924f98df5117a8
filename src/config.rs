use crate::util::normalize_tag;
use std::time::Duration;

/// Tags the study cares about when no explicit list is given.
pub const DEFAULT_TAGS: [&str; 5] = [
    "existence-behavioral",
    "existence-structural",
    "process",
    "property",
    "technology",
];

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct SampleOptions {
    pub interesting_tags: Vec<String>, // normalized, sorted, deduped
    pub sample_size: usize,
    pub delimiter: u8,
    pub has_headers: bool,             // the study's exports carry no header row
    pub subject_column: usize,
    pub tags_column: usize,
    pub id_column: Option<usize>,      // None => use the row index as item id
    pub reply_prefix: String,          // stripped once from subjects before grouping
    pub reply_prefix_ignore_case: bool,

    // search safety net; None => exhaustive
    pub max_leaves: Option<u64>,
    pub deadline: Option<Duration>,

    pub progress: bool,
    pub pretty_json: bool,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            interesting_tags: normalize_tag_list(DEFAULT_TAGS),
            sample_size: 120,
            delimiter: b',',
            has_headers: false,
            subject_column: 3,
            tags_column: 6,
            id_column: None,
            reply_prefix: "Re: ".to_string(),
            reply_prefix_ignore_case: false,

            max_leaves: None,
            deadline: None,

            progress: true,
            pretty_json: true,
        }
    }
}

impl SampleOptions {
    pub fn with_interesting_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.interesting_tags = normalize_tag_list(tags);
        self
    }
    pub fn with_sample_size(mut self, n: usize) -> Self {
        self.sample_size = n;
        self
    }
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
    pub fn with_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }
    pub fn with_subject_column(mut self, col: usize) -> Self {
        self.subject_column = col;
        self
    }
    pub fn with_tags_column(mut self, col: usize) -> Self {
        self.tags_column = col;
        self
    }
    pub fn with_id_column(mut self, col: Option<usize>) -> Self {
        self.id_column = col;
        self
    }
    pub fn with_reply_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reply_prefix = prefix.into();
        self
    }
    pub fn with_reply_prefix_ignore_case(mut self, yes: bool) -> Self {
        self.reply_prefix_ignore_case = yes;
        self
    }
    pub fn with_max_leaves(mut self, n: Option<u64>) -> Self {
        self.max_leaves = n.map(|n| n.max(1));
        self
    }
    pub fn with_deadline(mut self, d: Option<Duration>) -> Self {
        self.deadline = d;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_pretty_json(mut self, yes: bool) -> Self {
        self.pretty_json = yes;
        self
    }
}

/// Trim, drop empties, then sort + dedup so tag order never depends on caller order.
pub fn normalize_tag_list<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut v: Vec<String> = tags
        .into_iter()
        .map(|t| normalize_tag(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect();
    v.sort();
    v.dedup();
    v
}
