mod config;
mod util;
mod progress;

mod tags;
mod corpus;
mod distribution;
mod search;
mod report;
mod pipeline;
mod issues;

pub use crate::config::{SampleOptions, DEFAULT_TAGS};
pub use crate::pipeline::{SampleOutputs, ThreadSampler};

pub use crate::tags::{parse_tag_cell, TagId, TagVocabulary};
pub use crate::corpus::{group_threads, Corpus, Item, LoadStats, Thread};
pub use crate::distribution::{
    absolute_difference, cooccurrence, proportion_table, proportions, tag_counts, tag_occurrence, CoOccurrence, Distribution,
    OccurrenceGroup, TagShare,
};

// core search
pub use crate::search::{score_selection, Sample, SearchLimits, SearchOutcome, SearchStats, StratifiedSampleSearch};

// reporters
pub use crate::report::{
    copy_selected_rows, write_cooccurrence_csv, write_selection_csv, write_summary_json, write_thread_summary_csv, SampleSummary,
};

// issue-key finder
pub use crate::issues::{find_issues_in, find_issues_in_file, load_issue_keys, write_issue_matches_json, IssueHit, IssueMatches, MessageContext};

pub use crate::util::{ascii_delimiter, init_tracing_once, normalize_subject};
