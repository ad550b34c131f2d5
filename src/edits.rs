//! Smart structural edits: auto-continuation on Enter, paired-
//! delimiter smart backspace, auto-newline after completed block
//! constructs, auto footnote definition, and delete-element.
//!
//! These sit above the recognizers: each is a predicate over the buffer
//! plus cursor that performs one specific mutation when its pattern
//! matches. None of them own an undo snapshot — callers (the engine) save
//! one before invoking an edit, per("snapshots are taken before a
//! mutating edit").

use crate::gap::GapBuffer;
use crate::md;
use crate::recognizers as rec;

fn line_start_of(gb: &GapBuffer, pos: usize) -> usize {
    let mut i = pos;
    while i > 0 && gb.at(i - 1) != Some(b'\n') {
        i -= 1;
    }
    i
}

fn line_end_of(gb: &GapBuffer, mut pos: usize) -> usize {
    let len = gb.len();
    while pos < len && gb.at(pos) != Some(b'\n') {
        pos += 1;
    }
    pos
}

/// Auto-continuation on Enter. Call with the cursor
/// position the newline is being inserted at; mutates the buffer and
/// returns the new cursor position.
pub fn auto_continue_on_enter(gb: &mut GapBuffer, cursor: usize) -> usize {
    let ls = line_start_of(gb, cursor);
    let le = line_end_of(gb, ls);

    if let Some((_, _, content_start)) = rec::check_task(gb, ls) {
        return continue_or_end(gb, ls, le, content_start, cursor);
    }
    if let Some((ordered, _indent, content_start)) = rec::check_list(gb, ls) {
        if content_start >= le {
            return end_empty_item(gb, ls, le);
        }
        let marker = gb.substr(ls, content_start);
        let prefix = if ordered { next_ordinal(&marker) } else { marker };
        gb.insert(cursor, b'\n');
        gb.insert_str(cursor + 1, prefix.as_bytes());
        return cursor + 1 + prefix.len();
    }
    if let Some((_level, content_start)) = rec::check_blockquote(gb, ls) {
        return continue_or_end(gb, ls, le, content_start, cursor);
    }

    gb.insert(cursor, b'\n');
    cursor + 1
}

fn continue_or_end(gb: &mut GapBuffer, ls: usize, le: usize, content_start: usize, cursor: usize) -> usize {
    if content_start >= le {
        return end_empty_item(gb, ls, le);
    }
    let prefix = gb.substr(ls, content_start);
    gb.insert(cursor, b'\n');
    gb.insert_str(cursor + 1, prefix.as_bytes());
    cursor + 1 + prefix.len()
}

/// Pressing Enter on an empty list item / task / blockquote line ends it:
/// the marker is removed, leaving a blank line.
fn end_empty_item(gb: &mut GapBuffer, ls: usize, le: usize) -> usize {
    gb.delete(ls, le - ls);
    gb.insert(ls, b'\n');
    ls + 1
}

/// Parses a list marker like `" 12. "` or `"3) "` and returns the same
/// indent and separator with the number incremented.
fn next_ordinal(marker: &str) -> String {
    let indent_len = marker.len() - marker.trim_start().len();
    let indent = &marker[..indent_len];
    let rest = marker[indent_len..].trim_end();
    let sep = rest.chars().last().unwrap_or('.');
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let n: u64 = digits.parse().unwrap_or(0);
    format!("{indent}{}{sep} ", n + 1)
}

/// Smart backspace: if the byte left of `cursor` closes a
/// composite construct, deletes the whole span; otherwise deletes one
/// grapheme. Returns the new cursor position.
pub fn smart_backspace(gb: &mut GapBuffer, cursor: usize) -> usize {
    if cursor == 0 {
        return 0;
    }

    for artifact in ["(tm)", "(c)", "(r)"] {
        if artifact.len() <= cursor && gb.substr(cursor - artifact.len(), cursor) == artifact {
            let start = cursor - artifact.len();
            gb.delete(start, artifact.len());
            return start;
        }
    }

    let scan_from = cursor.saturating_sub(md::SMART_EDIT_SCAN_BACK);

    match gb.at(cursor - 1) {
        Some(b')') => {
            let mut p = cursor - 1;
            loop {
                if let Some((_, _, total)) = rec::check_link(gb, p) {
                    if p + total == cursor {
                        gb.delete(p, total);
                        return p;
                    }
                }
                if let Some(m) = rec::check_image(gb, p) {
                    if p + m.total == cursor {
                        gb.delete(p, m.total);
                        return p;
                    }
                }
                if p == scan_from {
                    break;
                }
                p -= 1;
            }
        }
        Some(b']') => {
            let mut p = cursor - 1;
            loop {
                if let Some((_, total)) = rec::check_footnote_ref(gb, p) {
                    if p + total == cursor {
                        gb.delete(p, total);
                        return p;
                    }
                }
                if p == scan_from {
                    break;
                }
                p -= 1;
            }
        }
        Some(b'$') => {
            let mut p = cursor - 1;
            loop {
                if let Some((_, total)) = rec::check_inline_math(gb, p) {
                    if p + total == cursor {
                        gb.delete(p, total);
                        return p;
                    }
                }
                if p == scan_from {
                    break;
                }
                p -= 1;
            }
        }
        _ => {}
    }

    for spec in md::DELIMITERS {
        if spec.len > cursor {
            continue;
        }
        let start = cursor - spec.len;
        if gb.substr(start, cursor) != spec.text {
            continue;
        }
        let ls = line_start_of(gb, start);
        let mut p = start;
        while p > ls {
            p -= 1;
            if p + spec.len <= start && gb.substr(p, p + spec.len) == spec.text {
                gb.delete(p, cursor - p);
                return p;
            }
        }
    }

    let prev = gb.utf8_prev(cursor);
    gb.delete(prev, cursor - prev);
    prev
}

fn count_fence_lines_before(gb: &GapBuffer, fence: &str, before: usize) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < before {
        if rec::is_line_start(gb, i) {
            let le = line_end_of(gb, i);
            if gb.substr(i, le) == fence {
                count += 1;
            }
        }
        i += 1;
    }
    count
}

/// Auto-newline after a just-completed block construct.
/// `just_typed` is the character that was inserted immediately before
/// `cursor`. Returns the new cursor if a newline was inserted.
pub fn auto_newline_after(gb: &mut GapBuffer, cursor: usize, just_typed: char) -> Option<usize> {
    match just_typed {
        ')' => {
            let scan_from = cursor.saturating_sub(md::SMART_EDIT_SCAN_BACK);
            let mut p = cursor.saturating_sub(1);
            loop {
                if let Some((_, _, total)) = rec::check_link(gb, p) {
                    if p + total == cursor {
                        gb.insert(cursor, b'\n');
                        return Some(cursor + 1);
                    }
                }
                if let Some(m) = rec::check_image(gb, p) {
                    if p + m.total == cursor {
                        gb.insert(cursor, b'\n');
                        return Some(cursor + 1);
                    }
                }
                if p == scan_from {
                    break;
                }
                p -= 1;
            }
            None
        }
        '`' => {
            let ls = line_start_of(gb, cursor);
            if cursor >= ls + 3 && gb.substr(cursor - 3, cursor) == "```" && line_end_of(gb, ls) == cursor {
                if count_fence_lines_before(gb, "```", cursor - 3) % 2 == 1 {
                    gb.insert(cursor, b'\n');
                    return Some(cursor + 1);
                }
            }
            None
        }
        '$' => {
            let ls = line_start_of(gb, cursor);
            if cursor >= ls + 2 && gb.substr(cursor - 2, cursor) == "$$" && line_end_of(gb, ls) == cursor {
                if count_fence_lines_before(gb, "$$", cursor - 2) % 2 == 1 {
                    gb.insert(cursor, b'\n');
                    return Some(cursor + 1);
                }
            }
            None
        }
        '-' => {
            let ls = line_start_of(gb, cursor);
            if let Some(rule_len) = rec::check_hr(gb, ls) {
                if ls + rule_len == cursor {
                    gb.insert(cursor, b'\n');
                    return Some(cursor + 1);
                }
            }
            None
        }
        _ => None,
    }
}

fn footnote_def_exists(gb: &GapBuffer, id: &str) -> bool {
    let len = gb.len();
    let mut i = 0;
    while i < len {
        if rec::is_line_start(gb, i) {
            if let Some((id_range, _, _)) = rec::check_footnote_def(gb, i) {
                if gb.substr(id_range.0, id_range.1) == id {
                    return true;
                }
            }
        }
        i += 1;
    }
    false
}

fn any_footnote_def_exists(gb: &GapBuffer) -> bool {
    let len = gb.len();
    let mut i = 0;
    while i < len {
        if rec::is_line_start(gb, i) && rec::check_footnote_def(gb, i).is_some() {
            return true;
        }
        i += 1;
    }
    false
}

/// Auto footnote definition. Call right
/// after inserting the closing `]` of a footnote ref at `cursor`. If no
/// definition for that id exists yet, appends one at EOF (prefixed by a
/// `---` separator iff this is the document's first footnote definition).
pub fn auto_footnote_definition(gb: &mut GapBuffer, cursor: usize) -> Option<usize> {
    let scan_from = cursor.saturating_sub(md::SMART_EDIT_SCAN_BACK);
    let mut p = cursor.saturating_sub(1);
    loop {
        if let Some((id, total)) = rec::check_footnote_ref(gb, p) {
            if p + total == cursor {
                let id_text = gb.substr(id.0, id.1);
                if footnote_def_exists(gb, &id_text) {
                    return None;
                }
                let has_any_def = any_footnote_def_exists(gb);
                let len = gb.len();
                let mut insertion = String::new();
                if len > 0 && gb.at(len - 1) != Some(b'\n') {
                    insertion.push('\n');
                }
                if !has_any_def {
                    insertion.push_str("---\n");
                }
                insertion.push_str(&format!("[^{id_text}]: "));
                gb.insert_str(len, insertion.as_bytes());
                return Some(cursor);
            }
        }
        if p == scan_from {
            break;
        }
        p -= 1;
    }
    None
}

/// Deletes the element under the cursor (image, link, footnote ref, or
/// inline math) if any; otherwise deletes the grapheme right after the
/// cursor.
pub fn delete_element(gb: &mut GapBuffer, cursor: usize) -> usize {
    let scan_from = cursor.saturating_sub(md::SMART_EDIT_SCAN_BACK);
    let mut p = cursor;
    loop {
        if let Some(m) = rec::check_image(gb, p) {
            if cursor < p + m.total {
                gb.delete(p, m.total);
                return p;
            }
        }
        if let Some((_, _, total)) = rec::check_link(gb, p) {
            if cursor < p + total {
                gb.delete(p, total);
                return p;
            }
        }
        if let Some((_, total)) = rec::check_footnote_ref(gb, p) {
            if cursor < p + total {
                gb.delete(p, total);
                return p;
            }
        }
        if let Some((_, total)) = rec::check_inline_math(gb, p) {
            if cursor < p + total {
                gb.delete(p, total);
                return p;
            }
        }
        if p == scan_from {
            break;
        }
        p -= 1;
    }
    if cursor < gb.len() {
        let (_, clen) = gb.utf8_at(cursor);
        gb.delete(cursor, clen.max(1));
    }
    cursor
}

#[cfg(test)]
#[path = "edits_tests.rs"]
mod tests;
