use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

/// Trim whitespace and one layer of surrounding quotes (`'x'` or `"x"`).
/// Tag matching is otherwise exact (case-sensitive).
#[inline]
pub fn normalize_tag(s: &str) -> String {
    let s = s.trim();
    let unquoted = s
        .strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .or_else(|| s.strip_prefix('"').and_then(|r| r.strip_suffix('"')))
        .unwrap_or(s);
    unquoted.trim().to_string()
}

/// Strip one leading reply prefix (e.g. `"Re: "`) so replies group with their root.
/// With `ignore_case`, `RE: ` and `re: ` match too (ASCII case folding only).
#[inline]
pub fn normalize_subject<'a>(subject: &'a str, reply_prefix: &str, ignore_case: bool) -> &'a str {
    if reply_prefix.is_empty() {
        return subject;
    }
    if !ignore_case {
        return subject.strip_prefix(reply_prefix).unwrap_or(subject);
    }
    match subject.get(..reply_prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(reply_prefix) => &subject[reply_prefix.len()..],
        _ => subject,
    }
}

/// Parse a CSV field delimiter: exactly one ASCII character, or `\t` for tab.
/// The csv reader takes a single byte, so anything wider is rejected.
pub fn ascii_delimiter(s: &str) -> Result<u8> {
    if s == "\\t" {
        return Ok(b'\t');
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        (Some(c), None) => bail!("delimiter {:?} is not a single-byte ASCII character", c),
        _ => bail!("delimiter must be exactly one character, got {:?}", s),
    }
}

fn tmp_sibling(dest: &Path) -> PathBuf {
    let name = dest.file_name().and_then(|s| s.to_str()).unwrap_or("out");
    dest.with_file_name(format!(".{}.tmp", name))
}

/// Write through a buffered temp file next to `dest`, then rename over `dest`.
/// Readers never observe a half-written report.
pub fn write_atomic<F>(dest: &Path, f: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
        }
    }
    let tmp = tmp_sibling(dest);
    let file = File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    let mut w = BufWriter::new(file);
    if let Err(e) = f(&mut w) {
        drop(w);
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    w.flush().with_context(|| format!("flush {}", tmp.display()))?;
    drop(w);
    fs::rename(&tmp, dest).with_context(|| format!("rename {} -> {}", tmp.display(), dest.display()))
}
