//! Per-tag distributions: corpus proportions, scaled targets, running counts.

use crate::corpus::{Corpus, Item};
use crate::tags::{TagId, TagVocabulary};
use anyhow::{bail, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-tag values indexed by [`TagId`].
#[derive(Clone, Debug, PartialEq)]
pub struct Distribution {
    values: Vec<f64>,
}

impl Distribution {
    pub fn zeros(tag_count: usize) -> Self {
        Self { values: vec![0.0; tag_count] }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Build from `(tag name, value)` pairs in any order. Tags not mentioned are 0.
    /// Names outside the vocabulary are rejected.
    pub fn from_named<I, S>(vocab: &TagVocabulary, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut d = Self::zeros(vocab.len());
        for (name, v) in pairs {
            match vocab.id_of(name.as_ref()) {
                Some(id) => d.values[id] = v,
                None => bail!("tag {:?} is not in the interesting-tag vocabulary", name.as_ref()),
            }
        }
        Ok(d)
    }

    /// Multiply every entry by `sample_size`: proportions -> target counts.
    pub fn scaled(&self, sample_size: usize) -> Self {
        let k = sample_size as f64;
        Self { values: self.values.iter().map(|v| v * k).collect() }
    }

    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
    pub fn values(&self) -> &[f64] { &self.values }

    pub fn get(&self, id: TagId) -> f64 {
        self.values.get(id).copied().unwrap_or(0.0)
    }

    /// Name-keyed view for reports.
    pub fn to_named(&self, vocab: &TagVocabulary) -> BTreeMap<String, f64> {
        vocab
            .names()
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), self.get(id)))
            .collect()
    }
}

/// Σ_tag |counts[tag] − target[tag]|, summed in tag-id order.
/// Tags only present in `target` contribute their full target value.
pub fn absolute_difference(counts: &[u32], target: &Distribution) -> f64 {
    let n = counts.len().max(target.len());
    let mut diff = 0.0;
    for id in 0..n {
        let c = counts.get(id).copied().unwrap_or(0) as f64;
        diff += (c - target.get(id)).abs();
    }
    diff
}

/// Per-tag tag counts over `items`.
pub fn tag_counts<'a, I>(items: I, tag_count: usize) -> Vec<u32>
where
    I: IntoIterator<Item = &'a Item>,
{
    let mut counts = vec![0u32; tag_count];
    for item in items {
        for &t in &item.tags {
            if let Some(c) = counts.get_mut(t) { *c += 1; }
        }
    }
    counts
}

/// Share of tagged items bearing each tag. Untagged items are ignored entirely;
/// with no tagged items every proportion is 0.
pub fn proportions(items: &[Item], vocab: &TagVocabulary) -> Distribution {
    let tagged: Vec<&Item> = items.iter().filter(|i| !i.tags.is_empty()).collect();
    if tagged.is_empty() {
        return Distribution::zeros(vocab.len());
    }
    let total = tagged.len() as f64;
    let counts = tag_counts(tagged, vocab.len());
    Distribution { values: counts.into_iter().map(|c| c as f64 / total).collect() }
}

/// Row for proportion reports.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TagShare {
    pub tag: String,
    pub count: u32,
    pub proportion: f64,
}

pub fn proportion_table(items: &[Item], vocab: &TagVocabulary) -> Vec<TagShare> {
    let counts = tag_counts(items, vocab.len());
    let props = proportions(items, vocab);
    vocab
        .names()
        .iter()
        .enumerate()
        .map(|(id, name)| TagShare { tag: name.clone(), count: counts[id], proportion: props.get(id) })
        .collect()
}

/// What a co-occurrence "sighting" is grouped by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceGroup {
    Email,
    Thread,
}

/// Per-group tag counts: one vector per email or per thread, indexed by tag id.
pub fn tag_occurrence(corpus: &Corpus, by: OccurrenceGroup) -> Vec<Vec<u32>> {
    let n = corpus.vocab.len();
    match by {
        OccurrenceGroup::Email => corpus.items.iter().map(|i| tag_counts(std::iter::once(i), n)).collect(),
        OccurrenceGroup::Thread => corpus.threads.iter().map(|t| t.tag_counts().to_vec()).collect(),
    }
}

/// Square tag × tag matrix, rows and columns in vocabulary order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoOccurrence {
    pub by: OccurrenceGroup,
    pub tags: Vec<String>,
    pub matrix: Vec<Vec<u32>>,
}

impl CoOccurrence {
    pub fn get(&self, a: TagId, b: TagId) -> u32 {
        self.matrix.get(a).and_then(|row| row.get(b)).copied().unwrap_or(0)
    }
}

/// For every group, each tag present adds the group's full count vector to its
/// row; the diagonal then loses one per group so a tag does not co-occur with
/// its own single sighting.
pub fn cooccurrence(groups: &[Vec<u32>], vocab: &TagVocabulary, by: OccurrenceGroup) -> CoOccurrence {
    let n = vocab.len();
    let mut matrix = vec![vec![0u32; n]; n];
    for g in groups {
        for a in (0..n).filter(|&a| g.get(a).copied().unwrap_or(0) > 0) {
            for (b, cell) in matrix[a].iter_mut().enumerate() {
                *cell += g.get(b).copied().unwrap_or(0);
            }
            matrix[a][a] -= 1;
        }
    }
    CoOccurrence { by, tags: vocab.names().to_vec(), matrix }
}
