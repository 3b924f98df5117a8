//! Stratified sample search: exhaustive backtracking over ordered thread subsets,
//! scoring every subset whose item count first exceeds the sample size by its
//! total absolute deviation from the target per-tag counts.
//!
//! Traversal (kept exactly, including its quirks):
//! - every thread index `i` is used as an anchor, and the subsets explored from
//!   it are the strictly increasing index subsets of `threads[i + 1..]`;
//!   `threads[0]` is therefore never part of a selection, and later anchors
//!   revisit subsets earlier anchors already scored;
//! - a subset is scored (and not extended) as soon as `size > sample_size`;
//!   a subset whose size equals `sample_size` keeps growing;
//! - a new best must be strictly lower than the previous one, so the first
//!   subset reached in traversal order wins ties.

use crate::corpus::Thread;
use crate::distribution::{absolute_difference, Distribution};
use crate::progress::make_count_progress;
use indicatif::ProgressBar;
use serde::Serialize;
use std::time::{Duration, Instant};

/// How often (in visited nodes) the deadline is polled.
const DEADLINE_POLL_EVERY: u64 = 1024;

/// Optional caps on an otherwise exhaustive search. Unset means no cap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_leaves: Option<u64>,
    pub deadline: Option<Duration>,
}

/// A scored selection of whole threads.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample {
    pub score: f64,
    /// Indices into the searched thread slice, in the order they were chosen.
    pub threads: Vec<usize>,
    /// Total items across the chosen threads.
    pub size: usize,
    /// Per-tag item counts of the selection, indexed by tag id.
    pub counts: Vec<u32>,
}

impl Sample {
    pub fn selected<'a>(&'a self, all: &'a [Thread]) -> impl Iterator<Item = &'a Thread> + 'a {
        self.threads.iter().filter_map(move |&i| all.get(i))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchStats {
    /// Subsets scored (leaves of the search tree).
    pub leaves: u64,
    /// Nodes visited, leaves included.
    pub nodes: u64,
    /// Every accepted best score, in acceptance order (strictly decreasing).
    pub improvements: Vec<f64>,
    /// False when a limit stopped the search early.
    pub complete: bool,
    pub elapsed_ms: u128,
}

/// Result of a search. `best == None` means no subset exceeded the sample size
/// (including the empty-input case); it is never reported as a numeric score.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub best: Option<Sample>,
    pub stats: SearchStats,
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool { self.best.is_some() }
}

/// Recompute the score of an explicit selection.
pub fn score_selection(threads: &[Thread], selection: &[usize], target: &Distribution) -> f64 {
    let mut counts = vec![0u32; target.len()];
    for t in selection.iter().filter_map(|&i| threads.get(i)) {
        add_counts(&mut counts, t.tag_counts());
    }
    absolute_difference(&counts, target)
}

fn add_counts(acc: &mut Vec<u32>, delta: &[u32]) {
    if acc.len() < delta.len() {
        acc.resize(delta.len(), 0);
    }
    for (a, d) in acc.iter_mut().zip(delta) {
        *a += d;
    }
}

fn sub_counts(acc: &mut [u32], delta: &[u32]) {
    for (a, d) in acc.iter_mut().zip(delta) {
        *a -= d;
    }
}

/// The running state shared by every branch: mutated on the way down, restored on the way up.
struct Accumulator {
    size: usize,
    counts: Vec<u32>,
    chosen: Vec<usize>,
}

impl Accumulator {
    fn add(&mut self, idx: usize, thread: &Thread) {
        self.size += thread.len();
        add_counts(&mut self.counts, thread.tag_counts());
        self.chosen.push(idx);
    }

    fn undo(&mut self, thread: &Thread) {
        self.size -= thread.len();
        sub_counts(&mut self.counts, thread.tag_counts());
        self.chosen.pop();
    }
}

pub struct StratifiedSampleSearch<'a> {
    threads: &'a [Thread],
    target: &'a Distribution,
    sample_size: usize,
    limits: SearchLimits,
    progress: bool,
}

impl<'a> StratifiedSampleSearch<'a> {
    pub fn new(threads: &'a [Thread], target: &'a Distribution, sample_size: usize) -> Self {
        Self { threads, target, sample_size, limits: SearchLimits::default(), progress: false }
    }

    pub fn limits(mut self, limits: SearchLimits) -> Self { self.limits = limits; self }
    pub fn progress(mut self, yes: bool) -> Self { self.progress = yes; self }

    pub fn search(&self) -> SearchOutcome {
        let started = Instant::now();
        let n = self.threads.len();
        let tag_count = self
            .threads
            .iter()
            .map(|t| t.tag_counts().len())
            .max()
            .unwrap_or(0)
            .max(self.target.len());

        let mut run = Run {
            search: self,
            acc: Accumulator { size: 0, counts: vec![0; tag_count], chosen: Vec::new() },
            best: None,
            stats: SearchStats::default(),
            started,
            stopped: false,
            pb: if self.progress && n > 0 { Some(make_count_progress(n as u64, "Sampling threads")) } else { None },
        };

        for anchor in 0..n {
            run.step(anchor);
            if let Some(pb) = &run.pb { pb.inc(1); }
            if run.stopped { break; }
        }

        let Run { best, mut stats, stopped, pb, .. } = run;
        stats.complete = !stopped;
        stats.elapsed_ms = started.elapsed().as_millis();

        if let Some(pb) = pb {
            pb.finish_with_message(match &best {
                Some(b) => format!("Sampling done: best score {:.3}", b.score),
                None => "Sampling done: no qualifying sample".to_string(),
            });
        }
        if stopped {
            tracing::warn!(leaves = stats.leaves, nodes = stats.nodes, "search stopped early by limit; best sample is best-effort");
        }
        match &best {
            Some(b) => tracing::info!(score = b.score, threads = b.threads.len(), size = b.size, leaves = stats.leaves, "search finished"),
            None => tracing::info!(threads = n, sample_size = self.sample_size, "search finished without a qualifying sample"),
        }

        SearchOutcome { best, stats }
    }
}

struct Run<'s, 'a> {
    search: &'s StratifiedSampleSearch<'a>,
    acc: Accumulator,
    best: Option<Sample>,
    stats: SearchStats,
    started: Instant,
    stopped: bool,
    pb: Option<ProgressBar>,
}

impl Run<'_, '_> {
    fn step(&mut self, current: usize) {
        self.stats.nodes += 1;
        if self.check_deadline() {
            return;
        }

        if self.acc.size > self.search.sample_size {
            self.score_leaf();
            return;
        }

        let threads = self.search.threads;
        for i in current + 1..threads.len() {
            let t = &threads[i];
            self.acc.add(i, t);
            self.step(i);
            self.acc.undo(t);
            if self.stopped {
                return;
            }
        }
    }

    fn score_leaf(&mut self) {
        self.stats.leaves += 1;
        let difference = absolute_difference(&self.acc.counts, self.search.target);
        let improved = match &self.best {
            Some(b) => difference < b.score,
            None => true,
        };
        if improved {
            tracing::debug!(score = difference, size = self.acc.size, chosen = ?self.acc.chosen, "found better sample");
            self.stats.improvements.push(difference);
            self.best = Some(Sample {
                score: difference,
                threads: self.acc.chosen.clone(),
                size: self.acc.size,
                counts: self.acc.counts.clone(),
            });
            if let Some(pb) = &self.pb {
                pb.set_message(format!("Sampling threads (best {:.3})", difference));
            }
        }
        if let Some(max) = self.search.limits.max_leaves {
            if self.stats.leaves >= max {
                self.stopped = true;
            }
        }
    }

    fn check_deadline(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if let Some(d) = self.search.limits.deadline {
            if self.stats.nodes % DEADLINE_POLL_EVERY == 0 && self.started.elapsed() >= d {
                self.stopped = true;
            }
        }
        self.stopped
    }
}
