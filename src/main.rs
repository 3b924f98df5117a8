//! threadsample CLI: proportions, thread summaries, tag co-occurrence,
//! stratified thread samples and issue-key lookup.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use threadsample::{
    ascii_delimiter, find_issues_in_file, init_tracing_once, load_issue_keys, proportion_table, write_issue_matches_json,
    OccurrenceGroup, SampleOutputs, ThreadSampler, DEFAULT_TAGS,
};

#[derive(Parser)]
#[command(name = "threadsample", version, about = "Stratified thread sampling over coded mailing-list exports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Coded email export (CSV).
    input: PathBuf,

    /// Interesting tags (comma-separated). Defaults to the design-decision categories.
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Input has a header row.
    #[arg(long)]
    headers: bool,

    /// Field delimiter: one ASCII character, or `\t` for tab.
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,

    /// 0-based column holding the email subject.
    #[arg(long, default_value = "3")]
    subject_column: usize,

    /// 0-based column holding the bracketed tag list.
    #[arg(long, default_value = "6")]
    tags_column: usize,

    /// 0-based column holding the email id (default: row index).
    #[arg(long)]
    id_column: Option<usize>,
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    ascii_delimiter(s).map_err(|e| e.to_string())
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupBy {
    Email,
    Thread,
}

impl From<GroupBy> for OccurrenceGroup {
    fn from(g: GroupBy) -> Self {
        match g {
            GroupBy::Email => OccurrenceGroup::Email,
            GroupBy::Thread => OccurrenceGroup::Thread,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print per-tag counts and proportions as JSON.
    Proportions {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Write one row per thread with per-tag counts.
    Threads {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long)]
        out: PathBuf,

        /// Match the `Re: ` reply prefix exactly instead of case-insensitively.
        #[arg(long)]
        case_sensitive_replies: bool,
    },

    /// Count how often each pair of tags appears in the same email or thread.
    Cooccurrence {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long, value_enum, default_value = "thread")]
        by: GroupBy,

        /// Write the matrix as CSV instead of printing JSON.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Search for the thread subset that best matches the corpus tag proportions.
    Sample {
        #[command(flatten)]
        input: InputArgs,

        /// Desired number of emails in the sample.
        #[arg(long, default_value = "120")]
        size: usize,

        /// Flattened selection (thread, subject, item_id, tags).
        #[arg(long)]
        out_csv: Option<PathBuf>,

        /// Original source rows of the selected emails.
        #[arg(long)]
        out_rows: Option<PathBuf>,

        /// JSON summary of the search.
        #[arg(long)]
        out_json: Option<PathBuf>,

        /// Stop after scoring this many subsets.
        #[arg(long)]
        max_leaves: Option<u64>,

        /// Stop after this many seconds.
        #[arg(long)]
        deadline_secs: Option<u64>,

        #[arg(long)]
        no_progress: bool,
    },

    /// Find mentions of tracker issue keys in a plain-text mail dump.
    FindIssues {
        /// Issue keys, one per line (or a CSV export with --key-column).
        #[arg(long)]
        keys: PathBuf,

        /// Header of the CSV column holding the keys, e.g. "Issue key".
        #[arg(long)]
        key_column: Option<String>,

        /// Text dump to search.
        #[arg(long)]
        text: PathBuf,

        /// JSON report of every hit.
        #[arg(long)]
        out: PathBuf,
    },
}

fn sampler_for(input: &InputArgs) -> ThreadSampler {
    let tags: Vec<String> = if input.tags.is_empty() {
        DEFAULT_TAGS.iter().map(|s| s.to_string()).collect()
    } else {
        input.tags.clone()
    };
    ThreadSampler::new()
        .interesting_tags(tags)
        .has_headers(input.headers)
        .delimiter(input.delimiter)
        .subject_column(input.subject_column)
        .tags_column(input.tags_column)
        .id_column(input.id_column)
}

fn main() -> Result<ExitCode> {
    init_tracing_once();
    let cli = Cli::parse();

    match cli.command {
        Commands::Proportions { input } => {
            let sampler = sampler_for(&input);
            let corpus = sampler.load(&input.input)?;
            let table = proportion_table(&corpus.items, &corpus.vocab);
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        Commands::Threads { input, out, case_sensitive_replies } => {
            let corpus = sampler_for(&input)
                .reply_prefix_ignore_case(!case_sensitive_replies)
                .thread_summary_to_csv(&input.input, &out)?;
            println!("Wrote {} threads to {}", corpus.threads.len(), out.display());
        }
        Commands::Cooccurrence { input, by, out } => {
            let co = sampler_for(&input).cooccurrence(&input.input, by.into(), out.as_deref())?;
            match &out {
                Some(p) => println!("Wrote {}x{} co-occurrence matrix to {}", co.tags.len(), co.tags.len(), p.display()),
                None => println!("{}", serde_json::to_string_pretty(&co)?),
            }
        }
        Commands::FindIssues { keys, key_column, text, out } => {
            let keys = load_issue_keys(&keys, key_column.as_deref())?;
            let matches = find_issues_in_file(&keys, &text)?;
            write_issue_matches_json(&out, &matches, true)?;
            println!(
                "Found {} mentions of {} / {} keys in {} lines; wrote {}",
                matches.found,
                matches.hits.len(),
                keys.len(),
                matches.lines,
                out.display()
            );
        }
        Commands::Sample { input, size, out_csv, out_rows, out_json, max_leaves, deadline_secs, no_progress } => {
            let sampler = sampler_for(&input)
                .sample_size(size)
                .max_leaves(max_leaves)
                .deadline(deadline_secs.map(Duration::from_secs))
                .progress(!no_progress);
            let outputs = SampleOutputs { selection_csv: out_csv, source_rows_csv: out_rows, summary_json: out_json };
            let (corpus, outcome) = sampler.sample_to_files(&input.input, &outputs)?;

            match &outcome.best {
                Some(best) => {
                    println!(
                        "Best score {:.3}: {} threads, {} emails{}",
                        best.score,
                        best.threads.len(),
                        best.size,
                        if outcome.stats.complete { "" } else { " (search stopped early)" }
                    );
                    for t in best.selected(&corpus.threads) {
                        println!("  {} ({} emails)", t.subject, t.len());
                    }
                }
                None if outcome.stats.complete => {
                    eprintln!("No qualifying sample: no thread subset exceeds {} emails", size);
                    return Ok(ExitCode::FAILURE);
                }
                None => {
                    eprintln!(
                        "No qualifying sample: search stopped after {} nodes before any subset exceeding {} emails was scored",
                        outcome.stats.nodes, size
                    );
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
