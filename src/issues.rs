//! Issue-key finder: literal substring search for tracker keys (e.g. `HDFS-1234`)
//! over a plain-text mail dump, with the surrounding message headers attached.

use crate::util::write_atomic;
use ahash::AHashSet;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const MESSAGE_ID: &str = "Message id: ";
const SUBJECT: &str = "Subject: ";
const DATE: &str = "Date: ";
const SENT_FROM: &str = "Sent from: ";
const TAGS: &str = "Tags: ";

/// Header fields seen since the last `Message id:` line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MessageContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl MessageContext {
    /// Update from one trimmed line; a new message id starts a fresh context.
    fn observe(&mut self, line: &str) {
        if let Some(v) = line.strip_prefix(MESSAGE_ID) {
            *self = Self { id: Some(v.to_string()), ..Self::default() };
        } else if let Some(v) = line.strip_prefix(SUBJECT) {
            self.subject = Some(v.to_string());
        } else if let Some(v) = line.strip_prefix(DATE) {
            self.date = Some(v.to_string());
        } else if let Some(v) = line.strip_prefix(SENT_FROM) {
            self.sent_from = Some(v.to_string());
        } else if let Some(v) = line.strip_prefix(TAGS) {
            self.tags = Some(v.split(',').map(|t| t.trim().to_string()).collect());
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IssueHit {
    #[serde(flatten)]
    pub message: MessageContext,
    pub line: String,
    /// 0-based line number in the text file.
    pub line_index: usize,
    /// Character (not byte) offset of the first occurrence within the trimmed line.
    pub offset: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IssueMatches {
    pub found: usize,
    pub lines: usize,
    pub hits: BTreeMap<String, Vec<IssueHit>>,
}

/// Load issue keys either from a plain list (one per line) or, when `column` is
/// given, from that header column of a CSV export. Blank and repeated keys are skipped.
pub fn load_issue_keys(path: &Path, column: Option<&str>) -> Result<Vec<String>> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let raw: Vec<String> = match column {
        None => BufReader::new(f).lines().collect::<std::io::Result<_>>()?,
        Some(col) => {
            let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(BufReader::new(f));
            let idx = rdr
                .headers()?
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(col.trim()))
                .with_context(|| format!("column {:?} not found in {}", col, path.display()))?;
            let mut keys = Vec::new();
            for rec in rdr.records() {
                let rec = rec?;
                keys.push(rec.get(idx).unwrap_or("").to_string());
            }
            keys
        }
    };

    let mut seen = AHashSet::new();
    let keys: Vec<String> = raw
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && seen.insert(k.clone()))
        .collect();
    tracing::info!(keys = keys.len(), path = %path.display(), "loaded issue keys");
    Ok(keys)
}

/// Scan `reader` line by line; every key found in a (trimmed) line records one hit.
pub fn find_issues_in<R: BufRead>(keys: &[String], reader: R) -> Result<IssueMatches> {
    let mut out = IssueMatches::default();
    let mut ctx = MessageContext::default();

    for (line_index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read line {}", line_index))?;
        out.lines += 1;
        let the_line = line.trim();
        ctx.observe(the_line);

        for key in keys {
            let Some(byte_off) = the_line.find(key.as_str()) else { continue };
            out.hits.entry(key.clone()).or_default().push(IssueHit {
                message: ctx.clone(),
                line: the_line.to_string(),
                line_index,
                offset: the_line[..byte_off].chars().count(),
            });
            out.found += 1;
        }
    }
    tracing::info!(lines = out.lines, found = out.found, keys_hit = out.hits.len(), "issue scan finished");
    Ok(out)
}

pub fn find_issues_in_file(keys: &[String], path: &Path) -> Result<IssueMatches> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    find_issues_in(keys, BufReader::new(f)).with_context(|| format!("scan {}", path.display()))
}

pub fn write_issue_matches_json(out: &Path, matches: &IssueMatches, pretty: bool) -> Result<()> {
    write_atomic(out, |w| {
        if pretty {
            serde_json::to_writer_pretty(&mut *w, matches)?;
        } else {
            serde_json::to_writer(&mut *w, matches)?;
        }
        Ok(())
    })
    .with_context(|| format!("write issue matches {}", out.display()))
}
