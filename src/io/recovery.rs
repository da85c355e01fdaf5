use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

/// Size past which the oldest entries are trimmed (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Separator line between entries
const ENTRY_RULE: &str = "---\n";

/// Self-documenting header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- priority recovery log: data pri could not save normally.
     If a task or goal went missing, check here.
     Each entry holds the full document that failed to write.
     Safe to delete once you have what you need. -->

---
";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// A snapshot save failed
    Write,
    /// A stored document could not be parsed
    Parse,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Write => write!(f, "write"),
            RecoveryCategory::Parse => write!(f, "parse"),
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

pub fn recovery_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".recovery.log")
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry formatting
// ---------------------------------------------------------------------------

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.fields.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Markdown block for the log: header, `key: value` lines, fenced body.
    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} [{}] {}\n\n",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        );
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.body.is_empty() {
            out.push_str("\n```json\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
        out.push('\n');
        out.push_str(ENTRY_RULE);
        out
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append a recovery entry to the log. Failures are logged and swallowed.
pub fn log_recovery(data_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = log_recovery_inner(data_dir, &entry) {
        tracing::warn!(error = %e, "could not write to recovery log");
    }
}

fn log_recovery_inner(data_dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let path = recovery_log_path(data_dir);

    if let Ok(meta) = std::fs::metadata(&path)
        && meta.len() > MAX_LOG_SIZE
    {
        try_inline_trim(&path);
    }

    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())?;
    Ok(())
}

/// Drop the oldest half of the entries. Skipped if another process holds the
/// file lock.
fn try_inline_trim(path: &Path) {
    let file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(f) => f,
        Err(_) => return,
    };

    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if ret != 0 {
            return;
        }
    }

    let mut content = String::new();
    if io::BufReader::new(&file).read_to_string(&mut content).is_err() {
        return;
    }
    let trimmed = drop_oldest_half(&content);
    if trimmed.len() < content.len()
        && let Ok(mut f) = File::create(path)
    {
        let _ = f.write_all(trimmed.as_bytes());
    }
}

/// Keep the header and the newer half of the `## ` entries.
fn drop_oldest_half(content: &str) -> String {
    let starts: Vec<usize> = content
        .match_indices("\n## ")
        .map(|(i, _)| i + 1)
        .collect();
    if starts.len() < 2 {
        return content.to_string();
    }
    let header = &content[..starts[0]];
    let keep_from = starts[starts.len() / 2];
    format!("{}{}", header, &content[keep_from..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(desc: &str, body: &str) -> RecoveryEntry {
        RecoveryEntry::new(RecoveryCategory::Write, desc)
            .field("File", "priority.json")
            .body(body)
    }

    #[test]
    fn entry_formatting() {
        let md = entry("snapshot save failed", "{\"goals\":[]}").to_markdown();
        assert!(md.starts_with("## "));
        assert!(md.contains("[write] snapshot save failed\n"));
        assert!(md.contains("File: priority.json\n"));
        assert!(md.contains("```json\n{\"goals\":[]}\n```\n"));
        assert!(md.ends_with("---\n"));
    }

    #[test]
    fn empty_body_has_no_fence() {
        let md = RecoveryEntry::new(RecoveryCategory::Parse, "bad file").to_markdown();
        assert!(!md.contains("```"));
    }

    #[test]
    fn header_written_once() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), entry("first", "a"));
        log_recovery(tmp.path(), entry("second", "b"));
        let content = std::fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(content.starts_with("<!-- priority recovery log"));
        assert_eq!(content.matches("<!--").count(), 1);
        assert!(content.find("first").unwrap() < content.find("second").unwrap());
    }

    #[test]
    fn trimming_keeps_header_and_newest() {
        let mut content = FILE_HEADER.to_string();
        for i in 0..4 {
            content.push_str(&entry(&format!("entry {}", i), "x").to_markdown());
        }
        let trimmed = drop_oldest_half(&content);
        assert!(trimmed.starts_with("<!-- priority recovery log"));
        assert!(!trimmed.contains("entry 0"));
        assert!(!trimmed.contains("entry 1"));
        assert!(trimmed.contains("entry 2"));
        assert!(trimmed.contains("entry 3"));
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.json");
        atomic_write(&path, b"one").unwrap();
        atomic_write(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
    }
}
