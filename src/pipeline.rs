use crate::config::SampleOptions;
use crate::corpus::Corpus;
use crate::distribution::{cooccurrence, proportions, tag_occurrence, CoOccurrence, Distribution, OccurrenceGroup};
use crate::report::{copy_selected_rows, write_cooccurrence_csv, write_selection_csv, write_summary_json, write_thread_summary_csv, SampleSummary};
use crate::search::{SearchLimits, SearchOutcome, StratifiedSampleSearch};
use crate::util::init_tracing_once;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Load -> proportions -> search -> report, configured with builder chaining.
#[derive(Clone, Debug, Default)]
pub struct ThreadSampler {
    pub(crate) opts: SampleOptions,
}

/// Where `sample_to_files` writes; any subset may be requested.
#[derive(Clone, Debug, Default)]
pub struct SampleOutputs {
    pub selection_csv: Option<PathBuf>,
    pub source_rows_csv: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
}

impl ThreadSampler {
    pub fn new() -> Self {
        Self { opts: SampleOptions::default() }
    }

    // -------- Builder methods --------
    pub fn interesting_tags<I, S>(mut self, tags: I) -> Self where I: IntoIterator<Item = S>, S: AsRef<str> { self.opts = self.opts.with_interesting_tags(tags); self }
    pub fn sample_size(mut self, n: usize) -> Self { self.opts = self.opts.with_sample_size(n); self }
    pub fn delimiter(mut self, d: u8) -> Self { self.opts = self.opts.with_delimiter(d); self }
    pub fn has_headers(mut self, yes: bool) -> Self { self.opts = self.opts.with_headers(yes); self }
    pub fn subject_column(mut self, col: usize) -> Self { self.opts = self.opts.with_subject_column(col); self }
    pub fn tags_column(mut self, col: usize) -> Self { self.opts = self.opts.with_tags_column(col); self }
    pub fn id_column(mut self, col: Option<usize>) -> Self { self.opts = self.opts.with_id_column(col); self }
    pub fn reply_prefix(mut self, prefix: impl Into<String>) -> Self { self.opts = self.opts.with_reply_prefix(prefix); self }
    pub fn reply_prefix_ignore_case(mut self, yes: bool) -> Self { self.opts = self.opts.with_reply_prefix_ignore_case(yes); self }
    pub fn max_leaves(mut self, n: Option<u64>) -> Self { self.opts = self.opts.with_max_leaves(n); self }
    pub fn deadline(mut self, d: Option<Duration>) -> Self { self.opts = self.opts.with_deadline(d); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn pretty_json(mut self, yes: bool) -> Self { self.opts = self.opts.with_pretty_json(yes); self }

    pub fn options(&self) -> &SampleOptions { &self.opts }

    pub fn load(&self, csv_path: &Path) -> Result<Corpus> {
        init_tracing_once();
        if self.opts.interesting_tags.is_empty() {
            return Err(anyhow!("at least one interesting tag is required"));
        }
        Corpus::from_csv_path(csv_path, &self.opts)
    }

    /// Corpus-wide proportions scaled by the configured sample size.
    pub fn target(&self, corpus: &Corpus) -> Distribution {
        proportions(&corpus.items, &corpus.vocab).scaled(self.opts.sample_size)
    }

    pub fn limits(&self) -> SearchLimits {
        SearchLimits { max_leaves: self.opts.max_leaves, deadline: self.opts.deadline }
    }

    pub fn run(&self, corpus: &Corpus, target: &Distribution) -> SearchOutcome {
        tracing::info!(
            threads = corpus.threads.len(),
            items = corpus.item_count(),
            sample_size = self.opts.sample_size,
            "searching for stratified sample"
        );
        StratifiedSampleSearch::new(&corpus.threads, target, self.opts.sample_size)
            .limits(self.limits())
            .progress(self.opts.progress)
            .search()
    }

    /// Full pipeline over one CSV export. Reports are written only for the
    /// outputs requested; the JSON summary is written even when nothing qualifies.
    pub fn sample_to_files(&self, csv_path: &Path, outputs: &SampleOutputs) -> Result<(Corpus, SearchOutcome)> {
        let corpus = self.load(csv_path)?;
        let target = self.target(&corpus);
        let outcome = self.run(&corpus, &target);

        if let Some(best) = &outcome.best {
            if let Some(p) = &outputs.selection_csv {
                write_selection_csv(p, &corpus.threads, best, &corpus.vocab)?;
            }
            if let Some(p) = &outputs.source_rows_csv {
                let n = copy_selected_rows(csv_path, p, &corpus.threads, best, self.opts.has_headers, self.opts.delimiter)?;
                tracing::info!(rows = n, path = %p.display(), "wrote selected source rows");
            }
        }
        if let Some(p) = &outputs.summary_json {
            let summary = SampleSummary::build(&corpus, &target, self.opts.sample_size, &outcome);
            write_summary_json(p, &summary, self.opts.pretty_json)?;
        }
        Ok((corpus, outcome))
    }

    pub fn thread_summary_to_csv(&self, csv_path: &Path, out: &Path) -> Result<Corpus> {
        let corpus = self.load(csv_path)?;
        write_thread_summary_csv(out, &corpus)?;
        tracing::info!(threads = corpus.threads.len(), path = %out.display(), "wrote thread summary");
        Ok(corpus)
    }

    /// Tag co-occurrence over the loaded corpus, grouped by email or thread;
    /// also written as CSV when `out` is given.
    pub fn cooccurrence(&self, csv_path: &Path, by: OccurrenceGroup, out: Option<&Path>) -> Result<CoOccurrence> {
        let corpus = self.load(csv_path)?;
        let co = cooccurrence(&tag_occurrence(&corpus, by), &corpus.vocab, by);
        if let Some(p) = out {
            write_cooccurrence_csv(p, &co)?;
            tracing::info!(tags = co.tags.len(), by = ?by, path = %p.display(), "wrote co-occurrence matrix");
        }
        Ok(co)
    }
}
