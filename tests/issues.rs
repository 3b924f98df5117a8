#[path = "common/mod.rs"]
mod common;

use common::*;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Cursor};
use threadsample::{find_issues_in, find_issues_in_file, load_issue_keys, write_issue_matches_json};

const DUMP: &str = "\
Message id: <1@x>
Subject: Re: HDFS-12 follow up
Date: 2014-01-01
Sent from: alice
Tags: process, technology
  We hit HDFS-12 again, see also HDFS-120.

Message id: <2@x>
Subject: unrelated
nothing here
";

fn keys(ks: &[&str]) -> Vec<String> {
    ks.iter().map(|k| k.to_string()).collect()
}

#[test]
fn hits_carry_the_enclosing_message_headers() {
    let m = find_issues_in(&keys(&["HDFS-12", "YARN-7"]), Cursor::new(DUMP)).unwrap();

    assert_eq!(m.lines, 10);
    // the subject line and the body line; "HDFS-120" also contains the key but counts once per line
    assert_eq!(m.found, 2);
    assert!(!m.hits.contains_key("YARN-7"));

    let hits = &m.hits["HDFS-12"];
    assert_eq!(hits[0].line_index, 1);
    assert_eq!(hits[0].message.id.as_deref(), Some("<1@x>"));
    assert_eq!(hits[0].message.subject.as_deref(), Some("Re: HDFS-12 follow up"));
    assert_eq!(hits[0].message.date, None);

    let body = &hits[1];
    assert_eq!(body.line_index, 5);
    assert_eq!(body.line, "We hit HDFS-12 again, see also HDFS-120.");
    assert_eq!(body.offset, 7);
    assert_eq!(body.message.subject.as_deref(), Some("Re: HDFS-12 follow up"));
    assert_eq!(body.message.date.as_deref(), Some("2014-01-01"));
    assert_eq!(body.message.sent_from.as_deref(), Some("alice"));
    assert_eq!(body.message.tags, Some(keys(&["process", "technology"])));
}

#[test]
fn new_message_id_resets_headers() {
    let m = find_issues_in(&keys(&["nothing"]), Cursor::new(DUMP)).unwrap();
    let hit = &m.hits["nothing"][0];
    assert_eq!(hit.message.id.as_deref(), Some("<2@x>"));
    assert_eq!(hit.message.subject.as_deref(), Some("unrelated"));
    assert_eq!(hit.message.date, None);
    assert_eq!(hit.message.tags, None);
}

#[test]
fn offsets_count_characters() {
    let m = find_issues_in(&keys(&["KAFKA-1"]), Cursor::new("Größe: KAFKA-1\n")).unwrap();
    assert_eq!(m.hits["KAFKA-1"][0].offset, 7);
}

#[test]
fn keys_load_from_plain_list_or_csv_column() {
    let dir = tempfile::tempdir().unwrap();

    let plain = dir.path().join("keys.txt");
    write_lines(&plain, &["HDFS-1", "  HDFS-2 ", "", "HDFS-1"]);
    assert_eq!(load_issue_keys(&plain, None).unwrap(), keys(&["HDFS-1", "HDFS-2"]));

    let csv = dir.path().join("issues.csv");
    write_lines(&csv, &["Summary,Issue key", "\"Fix, now\",YARN-3", "Other,YARN-4", "Dup,YARN-3"]);
    assert_eq!(load_issue_keys(&csv, Some("issue key")).unwrap(), keys(&["YARN-3", "YARN-4"]));

    assert!(load_issue_keys(&csv, Some("missing")).is_err());
}

#[test]
fn matches_written_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let text = dir.path().join("dump.txt");
    std::fs::write(&text, DUMP).unwrap();
    let out = dir.path().join("out/issues.json");

    let m = find_issues_in_file(&keys(&["HDFS-120"]), &text).unwrap();
    write_issue_matches_json(&out, &m, true).unwrap();

    let v: Value = serde_json::from_reader(BufReader::new(File::open(&out).unwrap())).unwrap();
    assert_eq!(v["found"], 1);
    let hit = &v["hits"]["HDFS-120"][0];
    assert_eq!(hit["id"], "<1@x>");
    assert_eq!(hit["line_index"], 5);
    assert!(hit.get("date").is_some());
}
