#[path = "common/mod.rs"]
mod common;

use common::*;
use threadsample::{
    ascii_delimiter, parse_tag_cell, proportion_table, proportions, Corpus, OccurrenceGroup, SampleOptions, ThreadSampler,
};

/// Loading the basic export groups "Re: " replies with their root subject,
/// keeps threads in first-seen order, and drops rows without interesting tags.
#[test]
fn load_groups_threads_in_first_seen_order() {
    let csv = make_export_basic();
    let corpus = ThreadSampler::new()
        .interesting_tags(TAGS)
        .progress(false)
        .load(&csv)
        .unwrap();

    let subjects: Vec<&str> = corpus.threads.iter().map(|t| t.subject.as_str()).collect();
    assert_eq!(subjects, vec!["Build fails", "Release vote", "Docs"]);

    let ids: Vec<Vec<&str>> = corpus
        .threads
        .iter()
        .map(|t| t.items.iter().map(|i| i.id.as_str()).collect())
        .collect();
    assert_eq!(ids, vec![vec!["0", "2"], vec!["1", "4", "5"], vec!["7"]]);

    assert_eq!(corpus.threads[0].tag_counts(), &[2, 1]);
    assert_eq!(corpus.threads[1].tag_counts(), &[2, 1]);
    assert_eq!(corpus.threads[2].tag_counts(), &[0, 1]);

    assert_eq!(corpus.stats.rows, 8);
    assert_eq!(corpus.stats.tagged, 6);
    assert_eq!(corpus.stats.untagged, 2);
    assert_eq!(corpus.stats.malformed, 1);
    assert_eq!(corpus.item_count(), 6);
}

#[test]
fn proportions_are_shares_of_tagged_items() {
    let csv = make_export_basic();
    let sampler = ThreadSampler::new().interesting_tags(TAGS).sample_size(12).progress(false);
    let corpus = sampler.load(&csv).unwrap();

    let p = proportions(&corpus.items, &corpus.vocab);
    assert!((p.get(0) - 4.0 / 6.0).abs() < 1e-12);
    assert!((p.get(1) - 3.0 / 6.0).abs() < 1e-12);

    let target = sampler.target(&corpus);
    assert!((target.get(0) - 8.0).abs() < 1e-9);
    assert!((target.get(1) - 6.0).abs() < 1e-9);

    let table = proportion_table(&corpus.items, &corpus.vocab);
    assert_eq!(table[0].tag, "A");
    assert_eq!(table[0].count, 4);
    assert_eq!(table[1].tag, "B");
    assert_eq!(table[1].count, 3);
}

#[test]
fn id_column_and_headers_are_configurable() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("with_header.csv");
    write_lines(&csv, &[
        "email_id;subject;tags",
        "<a@x>;Schema change;[A]",
        "<b@x>;Re: Schema change;[B]",
        "<c@x>;Unrelated;[]",
    ]);

    let opts = SampleOptions::default()
        .with_interesting_tags(TAGS)
        .with_headers(true)
        .with_delimiter(b';')
        .with_subject_column(1)
        .with_tags_column(2)
        .with_id_column(Some(0));
    let corpus = Corpus::from_csv_path(&csv, &opts).unwrap();

    assert_eq!(corpus.threads.len(), 1);
    let ids: Vec<&str> = corpus.threads[0].items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["<a@x>", "<b@x>"]);
    assert_eq!(corpus.stats.untagged, 1);
    assert_eq!(corpus.stats.malformed, 0);
}

#[test]
fn tag_cells_parse_leniently() {
    assert_eq!(parse_tag_cell("[process, technology]").unwrap(), vec!["process", "technology"]);
    assert_eq!(parse_tag_cell("['process', \"property\"]").unwrap(), vec!["process", "property"]);
    assert_eq!(parse_tag_cell(" [a,b] ").unwrap(), vec!["a", "b"]);
    assert!(parse_tag_cell("[]").unwrap().is_empty());
    assert!(parse_tag_cell("").unwrap().is_empty());
    assert!(parse_tag_cell("process").is_none());
}

#[test]
fn empty_tag_list_is_an_error_at_load() {
    let csv = make_export_basic();
    let err = ThreadSampler::new()
        .interesting_tags(Vec::<String>::new())
        .load(&csv)
        .unwrap_err();
    assert!(err.to_string().contains("interesting tag"));
}

fn mixed_case_replies() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("replies.csv");
    write_lines(&csv, &[
        "d1,m0,t1,Schema change,alice,2014-01-01,[A]",
        "d1,m1,t1,RE: Schema change,bob,2014-01-02,[B]",
        "d1,m2,t1,re: Schema change,carol,2014-01-03,[A]",
    ]);
    (dir, csv)
}

#[test]
fn reply_prefix_case_folding_is_opt_in() {
    let (_dir, csv) = mixed_case_replies();

    let exact = ThreadSampler::new().interesting_tags(TAGS).load(&csv).unwrap();
    let subjects: Vec<&str> = exact.threads.iter().map(|t| t.subject.as_str()).collect();
    assert_eq!(subjects, vec!["Schema change", "RE: Schema change", "re: Schema change"]);

    let folded = ThreadSampler::new()
        .interesting_tags(TAGS)
        .reply_prefix_ignore_case(true)
        .load(&csv)
        .unwrap();
    assert_eq!(folded.threads.len(), 1);
    assert_eq!(folded.threads[0].subject, "Schema change");
    assert_eq!(folded.threads[0].tag_counts(), &[2, 1]);
}

#[test]
fn delimiters_must_be_single_ascii_characters() {
    assert_eq!(ascii_delimiter(",").unwrap(), b',');
    assert_eq!(ascii_delimiter(";").unwrap(), b';');
    assert_eq!(ascii_delimiter("\\t").unwrap(), b'\t');
    assert!(ascii_delimiter("§").is_err());
    assert!(ascii_delimiter("é").is_err());
    assert!(ascii_delimiter("").is_err());
    assert!(ascii_delimiter(",;").is_err());
}

/// Basic export emails: [A], [A], [B, A], [A], [B], [B].
#[test]
fn cooccurrence_by_email() {
    let csv = make_export_basic();
    let co = ThreadSampler::new()
        .interesting_tags(TAGS)
        .cooccurrence(&csv, OccurrenceGroup::Email, None)
        .unwrap();

    assert_eq!(co.tags, vec!["A", "B"]);
    assert_eq!(co.matrix, vec![vec![0, 1], vec![1, 0]]);
}

/// Threads: "Build fails" A2 B1, "Release vote" A2 B1, "Docs" B1.
/// Rows sum the counts of every thread carrying the tag, minus one per thread on the diagonal.
#[test]
fn cooccurrence_by_thread_writes_csv() {
    let csv = make_export_basic();
    let out = csv.with_file_name("cooccurrence.csv");
    let co = ThreadSampler::new()
        .interesting_tags(TAGS)
        .cooccurrence(&csv, OccurrenceGroup::Thread, Some(&out))
        .unwrap();

    assert_eq!(co.get(0, 0), 2);
    assert_eq!(co.get(0, 1), 2);
    assert_eq!(co.get(1, 0), 4);
    assert_eq!(co.get(1, 1), 0);
    assert_eq!(read_lines(&out), vec!["tag,A,B", "A,2,2", "B,4,0"]);
}
