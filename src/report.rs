//! Reporters: flatten the chosen threads back out to CSV, copy the original
//! source rows of a selection, summarize threads, export tag co-occurrence,
//! and write a JSON summary.

use crate::corpus::{Corpus, LoadStats, Thread};
use crate::distribution::{CoOccurrence, Distribution};
use crate::search::{Sample, SearchOutcome, SearchStats};
use crate::tags::TagVocabulary;
use crate::util::write_atomic;
use ahash::AHashSet;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One row per selected item: `thread,subject,item_id,tags`.
pub fn write_selection_csv(out: &Path, threads: &[Thread], sample: &Sample, vocab: &TagVocabulary) -> Result<()> {
    write_atomic(out, |w| {
        let mut wtr = csv::Writer::from_writer(w);
        wtr.write_record(["thread", "subject", "item_id", "tags"])?;
        for &ti in &sample.threads {
            let Some(thread) = threads.get(ti) else { continue };
            let ti_s = ti.to_string();
            for item in &thread.items {
                wtr.write_record([ti_s.as_str(), thread.subject.as_str(), item.id.as_str(), vocab.format_cell(&item.tags).as_str()])?;
            }
        }
        wtr.flush()?;
        Ok(())
    })
    .with_context(|| format!("write selection {}", out.display()))
}

/// Copy the source CSV rows of every selected item to `out`, in source order,
/// byte-for-byte field content. Returns the number of rows written.
pub fn copy_selected_rows(
    source: &Path,
    out: &Path,
    threads: &[Thread],
    sample: &Sample,
    has_headers: bool,
    delimiter: u8,
) -> Result<usize> {
    let wanted: AHashSet<usize> = sample
        .selected(threads)
        .flat_map(|t| t.items.iter().map(|i| i.row_index))
        .collect();

    let f = File::open(source).with_context(|| format!("open {}", source.display()))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(BufReader::new(f));

    let mut written = 0usize;
    write_atomic(out, |w| {
        let mut wtr = csv::WriterBuilder::new().delimiter(delimiter).flexible(true).from_writer(w);
        if has_headers {
            wtr.write_record(rdr.headers()?)?;
        }
        for (row_index, rec) in rdr.records().enumerate() {
            let rec = rec?;
            if wanted.contains(&row_index) {
                wtr.write_record(&rec)?;
                written += 1;
            }
        }
        wtr.flush()?;
        Ok(())
    })
    .with_context(|| format!("copy selected rows {} -> {}", source.display(), out.display()))?;

    if written != wanted.len() {
        tracing::warn!(expected = wanted.len(), written, "source rows changed since the corpus was loaded");
    }
    Ok(written)
}

/// One row per thread: `subject,item_count,item_ids,<tag>...` with per-tag counts.
pub fn write_thread_summary_csv(out: &Path, corpus: &Corpus) -> Result<()> {
    write_atomic(out, |w| {
        let mut wtr = csv::Writer::from_writer(w);
        let mut header = vec!["subject".to_string(), "item_count".to_string(), "item_ids".to_string()];
        header.extend(corpus.vocab.names().iter().cloned());
        wtr.write_record(&header)?;

        for thread in &corpus.threads {
            let ids: Vec<&str> = thread.items.iter().map(|i| i.id.as_str()).collect();
            let mut row = vec![thread.subject.clone(), thread.len().to_string(), ids.join(" ")];
            row.extend(thread.tag_counts().iter().map(|c| c.to_string()));
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    })
    .with_context(|| format!("write thread summary {}", out.display()))
}

/// Co-occurrence matrix as CSV: `tag,<tag>...` then one row per tag.
pub fn write_cooccurrence_csv(out: &Path, co: &CoOccurrence) -> Result<()> {
    write_atomic(out, |w| {
        let mut wtr = csv::Writer::from_writer(w);
        let mut header = vec!["tag".to_string()];
        header.extend(co.tags.iter().cloned());
        wtr.write_record(&header)?;
        for (tag, row) in co.tags.iter().zip(&co.matrix) {
            let mut rec = vec![tag.clone()];
            rec.extend(row.iter().map(|c| c.to_string()));
            wtr.write_record(&rec)?;
        }
        wtr.flush()?;
        Ok(())
    })
    .with_context(|| format!("write co-occurrence {}", out.display()))
}

#[derive(Debug, Serialize)]
pub struct TagReport {
    pub selected: u32,
    pub target: f64,
    pub deviation: f64,
}

#[derive(Debug, Serialize)]
pub struct SelectedThread {
    pub index: usize,
    pub subject: String,
    pub item_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SampleSummary {
    pub found: bool,
    pub sample_size: usize,
    pub score: Option<f64>,
    pub realized_size: Option<usize>,
    pub tags: BTreeMap<String, TagReport>,
    pub threads: Vec<SelectedThread>,
    pub corpus: LoadStats,
    pub search: SearchStats,
}

impl SampleSummary {
    pub fn build(corpus: &Corpus, target: &Distribution, sample_size: usize, outcome: &SearchOutcome) -> Self {
        let counts: Vec<u32> = match &outcome.best {
            Some(b) => b.counts.clone(),
            None => vec![0; corpus.vocab.len()],
        };
        let tags = corpus
            .vocab
            .names()
            .iter()
            .enumerate()
            .map(|(id, name)| {
                let selected = counts.get(id).copied().unwrap_or(0);
                let t = target.get(id);
                (name.clone(), TagReport { selected, target: t, deviation: (selected as f64 - t).abs() })
            })
            .collect();
        let threads = outcome
            .best
            .as_ref()
            .map(|b| {
                b.threads
                    .iter()
                    .filter_map(|&i| corpus.threads.get(i).map(|t| (i, t)))
                    .map(|(index, t)| SelectedThread {
                        index,
                        subject: t.subject.clone(),
                        item_ids: t.items.iter().map(|i| i.id.clone()).collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            found: outcome.best.is_some(),
            sample_size,
            score: outcome.best.as_ref().map(|b| b.score),
            realized_size: outcome.best.as_ref().map(|b| b.size),
            tags,
            threads,
            corpus: corpus.stats,
            search: outcome.stats.clone(),
        }
    }
}

pub fn write_summary_json(out: &Path, summary: &SampleSummary, pretty: bool) -> Result<()> {
    write_atomic(out, |w| {
        if pretty {
            serde_json::to_writer_pretty(&mut *w, summary)?;
        } else {
            serde_json::to_writer(&mut *w, summary)?;
        }
        Ok(())
    })
    .with_context(|| format!("write summary {}", out.display()))
}
