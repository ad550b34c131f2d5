//! Filesystem persistence: the default `Persistence`
//! collaborator, plus the frontmatter strip/reattach and CRLF-normalize
//! free functions `load_document`/`save_document` call before bytes ever
//! reach the gap buffer.
//!
//! Grounded in `dawn_file.c`'s `load_file_for_editing`/`save_session`:
//! frontmatter is a `---\n...\n---` block at byte 0 carrying `title:`,
//! `author:`, `date:` keys; stripped on load, rebuilt (with a fresh date)
//! on save.

use std::path::{Path, PathBuf};

use crate::error::PersistError;
use crate::sink::Persistence;

/// Filesystem-backed `Persistence`. Holds no state; every call goes
/// straight to `std::fs`.
#[derive(Default)]
pub struct FsPersistence;

impl Persistence for FsPersistence {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, PersistError> {
        std::fs::read(path).map_err(|source| PersistError::Read { path: path.to_path_buf(), source })
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
        std::fs::write(path, bytes).map_err(|source| PersistError::Write { path: path.to_path_buf(), source })
    }

    fn list_dir(&self, path: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(path)? {
            out.push(entry?.path());
        }
        Ok(out)
    }

    fn mkdir_p(&self, path: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn get_mtime(&self, path: &Path) -> std::io::Result<u64> {
        let meta = std::fs::metadata(path)?;
        let modified = meta.modified()?;
        let secs = modified
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
        Ok(secs)
    }
}

/// Parsed frontmatter: the title line, if present, plus the byte offset
/// where body text starts.
pub struct Frontmatter {
    pub title: Option<String>,
    pub body_start: usize,
}

/// Strips a leading `---\n... \n---` YAML block from `content`, reading
/// out `title:` if present. Returns `body_start == 0` (and `title: None`)
/// when `content` doesn't open with a frontmatter fence.
pub fn strip_frontmatter(content: &str) -> Frontmatter {
    if !content.starts_with("---\n") {
        return Frontmatter { title: None, body_start: 0 };
    }
    let Some(rel_end) = content[4..].find("\n---") else {
        return Frontmatter { title: None, body_start: 0 };
    };
    let fm_end = 4 + rel_end; // index of the '\n' preceding the closing "---"
    let fm_block = &content[..fm_end];

    let title = fm_block.lines().find_map(|line| {
            line.strip_prefix("title:").map(|rest| rest.trim().to_string())
    });

    let mut body_start = fm_end + 4; // past "\n---"
    if content[body_start..].starts_with('\n') {
        body_start += 1;
    }
    if content[body_start..].starts_with('\n') {
        body_start += 1;
    }
    Frontmatter { title, body_start: body_start.min(content.len()) }
}

/// Rebuilds a frontmatter block for `save_document`, mirroring the format
/// `save_session` writes. `date` is supplied by the caller's `TimeSource`
/// rather than read from the system clock here, so tests stay deterministic.
pub fn build_frontmatter(title: &str, author: &str, date: &str) -> String {
    format!("---\ntitle: {title}\nauthor: {author}\ndate: {date}\n---\n\n")
}

/// Normalizes `\r\n` and bare `\r` to `\n`. Called once on load,
/// before the text reaches the gap buffer.
pub fn normalize_line_endings(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_frontmatter_passes_through() {
        let fm = strip_frontmatter("# hi\n");
        assert!(fm.title.is_none());
        assert_eq!(fm.body_start, 0);
    }

    #[test]
    fn strips_frontmatter_and_reads_title() {
        let doc = "---\ntitle: My Doc\nauthor: a\ndate: 2026-01-01\n---\n\n# Body\n";
        let fm = strip_frontmatter(doc);
        assert_eq!(fm.title.as_deref(), Some("My Doc"));
        assert_eq!(&doc[fm.body_start..], "# Body\n");
    }

    #[test]
    fn frontmatter_without_blank_line_still_strips() {
        let doc = "---\ntitle: X\n---\nBody";
        let fm = strip_frontmatter(doc);
        assert_eq!(&doc[fm.body_start..], "Body");
    }

    #[test]
    fn build_frontmatter_round_trips_title() {
        let fm = build_frontmatter("My Doc", "me", "2026-07-26");
        let stripped = strip_frontmatter(&fm);
        assert_eq!(stripped.title.as_deref(), Some("My Doc"));
    }

    #[test]
    fn normalizes_crlf_to_lf() {
        assert_eq!(normalize_line_endings("a\r\nb\r\nc"), "a\nb\nc");
    }

    #[test]
    fn normalizes_bare_cr_to_lf() {
        assert_eq!(normalize_line_endings("a\rb"), "a\nb");
    }

    #[test]
    fn no_cr_is_unchanged() {
        assert_eq!(normalize_line_endings("a\nb\n"), "a\nb\n");
    }
}
