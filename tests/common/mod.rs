#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use threadsample::{Item, TagVocabulary, Thread};

pub const TAGS: [&str; 2] = ["A", "B"];

/// Write raw CSV lines to `path` (creating parent dirs).
pub fn write_lines(path: &Path, lines: &[&str]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    for l in lines {
        writeln!(&mut f, "{}", l).unwrap();
    }
}

/// Read a text file line-by-line into strings (skips empty lines).
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines().map(|l| l.unwrap()).filter(|s| !s.is_empty()).collect()
}

/// Build a tiny export in the study's headerless 7-column layout
/// (`doc,email_id,thread,subject,from,date,tags`):
/// - "Build fails" thread: rows 0 ([A]), 2 ("Re: " reply, [B, A])
/// - "Release vote" thread: rows 1 ([A]), 4 ([A]), 5 ([B])
/// - row 3 carries only an uninteresting tag and is dropped
/// - row 6 has a malformed tag cell and is dropped
/// - "Docs" thread: row 7 ([B])
///
/// Tagged emails: 6; A on 4 of them, B on 3 of them.
pub fn make_export_basic() -> PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.into_path();
    let csv = base.join("export.csv");
    write_lines(&csv, &[
        r#"d1,m0,t1,Build fails,alice,2014-01-01,"[A]""#,
        r#"d1,m1,t2,Release vote,bob,2014-01-02,"[A]""#,
        r#"d1,m2,t1,Re: Build fails,carol,2014-01-03,"[B, A]""#,
        r#"d1,m3,t3,Off topic,dave,2014-01-04,"[Other]""#,
        r#"d1,m4,t2,Re: Release vote,erin,2014-01-05,"[A, Other]""#,
        r#"d1,m5,t2,Release vote,frank,2014-01-06,"['B']""#,
        r#"d1,m6,t4,Broken row,gina,2014-01-07,not a list"#,
        r#"d1,m7,t5,Docs,hank,2014-01-08,"[B]""#,
    ]);
    csv
}

pub fn vocab() -> TagVocabulary {
    TagVocabulary::new(TAGS)
}

/// Build a thread from per-item tag names; item ids are `<subject>-<n>`.
pub fn thread(vocab: &TagVocabulary, subject: &str, items: &[&[&str]]) -> Thread {
    let items = items
        .iter()
        .enumerate()
        .map(|(n, tags)| Item::new(format!("{}-{}", subject, n), n, subject, vocab.filter(tags.iter())))
        .collect();
    Thread::new(subject, items, vocab.len())
}
