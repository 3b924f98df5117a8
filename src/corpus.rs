//! Corpus loader: CSV rows -> tagged items -> threads grouped by normalized subject.

use crate::config::SampleOptions;
use crate::tags::{parse_tag_cell, TagId, TagVocabulary};
use crate::util::normalize_subject;
use ahash::AHashMap;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One coded email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub row_index: usize, // 0-based data row in the source file
    pub subject: String,
    pub tags: Vec<TagId>, // sorted, deduped, restricted to the vocabulary
}

impl Item {
    pub fn new(id: impl Into<String>, row_index: usize, subject: impl Into<String>, tags: Vec<TagId>) -> Self {
        Self { id: id.into(), row_index, subject: subject.into(), tags }
    }
}

/// Items sharing a normalized subject. Selected or rejected as a whole.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thread {
    pub subject: String,
    pub items: Vec<Item>,
    counts: Vec<u32>,
}

impl Thread {
    /// `tag_count` is the vocabulary size; tag ids outside it are ignored.
    pub fn new(subject: impl Into<String>, items: Vec<Item>, tag_count: usize) -> Self {
        let mut counts = vec![0u32; tag_count];
        for item in &items {
            for &t in &item.tags {
                if let Some(c) = counts.get_mut(t) { *c += 1; }
            }
        }
        Self { subject: subject.into(), items, counts }
    }

    /// Number of items; this is what counts toward the sample size.
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Per-tag item counts, indexed by [`TagId`].
    pub fn tag_counts(&self) -> &[u32] { &self.counts }
}

/// Row accounting from a load, handy for logs and summaries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct LoadStats {
    pub rows: usize,
    pub tagged: usize,
    pub untagged: usize,
    pub malformed: usize,
}

/// Immutable corpus: the tagged items (source order) and their threads (first-seen order).
#[derive(Clone, Debug)]
pub struct Corpus {
    pub vocab: TagVocabulary,
    pub items: Vec<Item>,
    pub threads: Vec<Thread>,
    pub stats: LoadStats,
}

impl Corpus {
    /// Build from already-tagged items. Items without any interesting tag are dropped.
    pub fn from_items(vocab: TagVocabulary, items: Vec<Item>, reply_prefix: &str, ignore_case: bool) -> Self {
        let rows = items.len();
        let items: Vec<Item> = items.into_iter().filter(|i| !i.tags.is_empty()).collect();
        let stats = LoadStats { rows, tagged: items.len(), untagged: rows - items.len(), malformed: 0 };
        let threads = group_threads(&items, vocab.len(), reply_prefix, ignore_case);
        Self { vocab, items, threads, stats }
    }

    pub fn from_csv_path(path: &Path, opts: &SampleOptions) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        Self::from_reader(BufReader::new(f), opts).with_context(|| format!("load corpus {}", path.display()))
    }

    pub fn from_reader<R: Read>(rdr: R, opts: &SampleOptions) -> Result<Self> {
        let vocab = TagVocabulary::new(&opts.interesting_tags);
        let mut csv_rdr = csv::ReaderBuilder::new()
            .has_headers(opts.has_headers)
            .delimiter(opts.delimiter)
            .flexible(true)
            .from_reader(rdr);

        let mut stats = LoadStats::default();
        let mut items = Vec::new();

        for (row_index, rec) in csv_rdr.records().enumerate() {
            let rec = rec.with_context(|| format!("read csv row {}", row_index))?;
            stats.rows += 1;

            let tags = match rec.get(opts.tags_column).map(parse_tag_cell) {
                Some(Some(labels)) => vocab.filter(&labels),
                Some(None) => {
                    tracing::debug!(row = row_index, "malformed tag cell; treating as untagged");
                    stats.malformed += 1;
                    Vec::new()
                }
                None => {
                    tracing::debug!(row = row_index, cols = rec.len(), "row has no tags column; treating as untagged");
                    stats.malformed += 1;
                    Vec::new()
                }
            };
            if tags.is_empty() {
                stats.untagged += 1;
                continue;
            }

            let subject = rec.get(opts.subject_column).unwrap_or("").to_string();
            let id = match opts.id_column {
                Some(col) => rec.get(col).unwrap_or("").trim().to_string(),
                None => row_index.to_string(),
            };
            items.push(Item { id, row_index, subject, tags });
            stats.tagged += 1;
        }

        let threads = group_threads(&items, vocab.len(), &opts.reply_prefix, opts.reply_prefix_ignore_case);
        tracing::info!(
            rows = stats.rows,
            tagged = stats.tagged,
            untagged = stats.untagged,
            malformed = stats.malformed,
            threads = threads.len(),
            "corpus loaded"
        );
        Ok(Self { vocab, items, threads, stats })
    }

    /// Total number of items across all threads.
    pub fn item_count(&self) -> usize {
        self.threads.iter().map(Thread::len).sum()
    }
}

/// Group items by normalized subject, keeping threads in order of first appearance
/// and items in source order within a thread.
pub fn group_threads(items: &[Item], tag_count: usize, reply_prefix: &str, ignore_case: bool) -> Vec<Thread> {
    let mut index: AHashMap<&str, usize> = AHashMap::new();
    let mut groups: Vec<(&str, Vec<Item>)> = Vec::new();
    for item in items {
        let key = normalize_subject(&item.subject, reply_prefix, ignore_case);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(item.clone());
    }
    groups
        .into_iter()
        .map(|(subject, items)| Thread::new(subject, items, tag_count))
        .collect()
}
