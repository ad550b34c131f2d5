//! Markdown recognizers: pure, position-indexed predicates over a
//! `GapBuffer`. Each recognizer either rejects a position or returns the
//! measured extent and sub-ranges of the construct it matched. None of them
//! mutate the buffer or carry state between calls — every recognizer's
//! output is a function of the buffer bytes in its scanning window alone
//!.
//!
//! All markdown structural markers are ASCII, so recognizers scan byte by
//! byte via `GapBuffer::at`; only run *content* (link text, code, math) is
//! ever decoded as UTF-8, and only by callers that need to measure it.

use crate::gap::GapBuffer;
use crate::md::{self, Style};

/// A half-open byte range.
pub type Range = (usize, usize);

/// True iff `pos` is the start of a line: either the document start or the
/// byte before it is `\n`.
pub fn is_line_start(gb: &GapBuffer, pos: usize) -> bool {
    pos == 0 || gb.at(pos.wrapping_sub(1)) == Some(b'\n')
}

/// Byte offset of the end of the line starting at or containing `pos`
/// (position of the `\n`, or `len()` if the line runs to EOF).
fn line_end(gb: &GapBuffer, mut pos: usize) -> usize {
    let len = gb.len();
    while pos < len && gb.at(pos) != Some(b'\n') {
        pos += 1;
    }
    pos
}

fn byte(gb: &GapBuffer, pos: usize) -> Option<u8> {
    gb.at(pos)
}

fn starts_with(gb: &GapBuffer, pos: usize, needle: &str) -> bool {
    let bytes = needle.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if gb.at(pos + i) != Some(b) {
            return false;
        }
    }
    true
}

// ── Headers ──────────────────────────────────────────────────────────────

/// `check_header`: line-start, 1..6 `#`, then a space. Returns the level.
pub fn check_header(gb: &GapBuffer, pos: usize) -> Option<u8> {
    check_header_content(gb, pos).map(|(level, _)| level)
}

/// `check_header_content`: returns `(level, content_start)`.
pub fn check_header_content(gb: &GapBuffer, pos: usize) -> Option<(u8, usize)> {
    if !is_line_start(gb, pos) {
        return None;
    }
    let mut i = pos;
    let mut count = 0u8;
    while count < 6 && byte(gb, i) == Some(b'#') {
        count += 1;
        i += 1;
    }
    if count == 0 || byte(gb, i) != Some(b' ') {
        return None;
    }
    Some((count, i + 1))
}

/// `check_heading_id`: `{#id}` with an ASCII id, anywhere inline (used at
/// end of a header line). Returns `(id_range, total_len)`.
pub fn check_heading_id(gb: &GapBuffer, pos: usize) -> Option<(Range, usize)> {
    if byte(gb, pos) != Some(b'{') || byte(gb, pos + 1) != Some(b'#') {
        return None;
    }
    let id_start = pos + 2;
    let mut i = id_start;
    while let Some(b) = byte(gb, i) {
        if b == b'}' {
            if i == id_start {
                return None;
            }
            return Some(((id_start, i), i + 1 - pos));
        }
        if !(b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':' || b == b'.') {
            return None;
        }
        i += 1;
    }
    None
}

// ── Horizontal rule ──────────────────────────────────────────────────────

/// `check_hr`: a line of >= 3 of the same rule char (`-`, `*`, `_`),
/// optionally interspersed with spaces. Returns the rule's byte length
/// (not including the trailing newline).
pub fn check_hr(gb: &GapBuffer, pos: usize) -> Option<usize> {
    if !is_line_start(gb, pos) {
        return None;
    }
    let end = line_end(gb, pos);
    let mut rule_char = None;
    let mut count = 0;
    let mut i = pos;
    while i < end {
        match byte(gb, i) {
            Some(b' ') | Some(b'\t') => {}
            Some(c) if c == b'-' || c == b'*' || c == b'_' => {
                match rule_char {
                    None => rule_char = Some(c),
                    Some(rc) if rc == c => {}
                    Some(_) => return None,
                }
                count += 1;
            }
            _ => return None,
        }
        i += 1;
    }
    if count >= 3 {
        Some(end - pos)
    } else {
        None
    }
}

// ── Blockquote ───────────────────────────────────────────────────────────

/// `check_blockquote`: line-start, one or more `>` (each optionally
/// followed by a single space), nesting level = count of `>`.
pub fn check_blockquote(gb: &GapBuffer, pos: usize) -> Option<(u32, usize)> {
    if !is_line_start(gb, pos) {
        return None;
    }
    if byte(gb, pos) != Some(b'>') {
        return None;
    }
    let mut level = 0u32;
    let mut i = pos;
    loop {
        if byte(gb, i) != Some(b'>') {
            break;
        }
        level += 1;
        i += 1;
        if byte(gb, i) == Some(b' ') {
            i += 1;
        }
        // A further nested '>' may follow immediately or after the space.
        if byte(gb, i) != Some(b'>') {
            break;
        }
    }
    Some((level, i))
}

// ── Lists ────────────────────────────────────────────────────────────────

/// `check_list`: line-start, optional leading spaces, then a bullet
/// (`-`,`*`,`+`) or `N.`/`N)`, then a space. Returns `(ordered, indent,
/// content_start)`.
pub fn check_list(gb: &GapBuffer, pos: usize) -> Option<(bool, usize, usize)> {
    if !is_line_start(gb, pos) {
        return None;
    }
    let mut i = pos;
    let mut indent = 0usize;
    while byte(gb, i) == Some(b' ') {
        i += 1;
        indent += 1;
    }
    match byte(gb, i) {
        Some(b'-') | Some(b'*') | Some(b'+') => {
            if byte(gb, i + 1) == Some(b' ') {
                return Some((false, indent, i + 2));
            }
            None
        }
        Some(c) if c.is_ascii_digit() => {
            let mut j = i;
            while byte(gb, j).is_some_and(|b| b.is_ascii_digit()) {
                j += 1;
            }
            match byte(gb, j) {
                Some(b'.') | Some(b')') => {
                    if byte(gb, j + 1) == Some(b' ') {
                        Some((true, indent, j + 2))
                    } else {
                        None
                    }
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// `check_task`: a list item whose content starts with `[ ]`, `[x]`, `[X]`.
/// Returns `(state, indent, content_start)`; state 1 = unchecked, 2 = checked.
pub fn check_task(gb: &GapBuffer, pos: usize) -> Option<(u8, usize, usize)> {
    let (_, indent, content_start) = check_list(gb, pos)?;
    if byte(gb, content_start) != Some(b'[') || byte(gb, content_start + 2) != Some(b']') {
        return None;
    }
    let state = match byte(gb, content_start + 1) {
        Some(b' ') => 1,
        Some(b'x') | Some(b'X') => 2,
        _ => return None,
    };
    let after = content_start + 3;
    let after = if byte(gb, after) == Some(b' ') { after + 1 } else { after };
    Some((state, indent, after))
}

// ── Footnotes ────────────────────────────────────────────────────────────

/// `check_footnote_def`: line-start `[^id]:`. Returns `(id_range,
/// content_start, total_len)`.
pub fn check_footnote_def(gb: &GapBuffer, pos: usize) -> Option<(Range, usize, usize)> {
    if !is_line_start(gb, pos) {
        return None;
    }
    if byte(gb, pos) != Some(b'[') || byte(gb, pos + 1) != Some(b'^') {
        return None;
    }
    let id_start = pos + 2;
    let mut i = id_start;
    while let Some(b) = byte(gb, i) {
        if b == b']' {
            break;
        }
        if b == b'\n' || b == b' ' {
            return None;
        }
        i += 1;
    }
    if i == id_start || byte(gb, i) != Some(b']') {
        return None;
    }
    let id_end = i;
    if byte(gb, i + 1) != Some(b':') {
        return None;
    }
    let mut content_start = i + 2;
    if byte(gb, content_start) == Some(b' ') {
        content_start += 1;
    }
    let end = line_end(gb, pos);
    Some(((id_start, id_end), content_start, end - pos))
}

/// `check_footnote_ref`: inline `[^id]`. Returns `(id_range, total)`.
pub fn check_footnote_ref(gb: &GapBuffer, pos: usize) -> Option<(Range, usize)> {
    if byte(gb, pos) != Some(b'[') || byte(gb, pos + 1) != Some(b'^') {
        return None;
    }
    let id_start = pos + 2;
    let mut i = id_start;
    while let Some(b) = byte(gb, i) {
        if b == b']' {
            if i == id_start {
                return None;
            }
            return Some(((id_start, i), i + 1 - pos));
        }
        if b == b'\n' || b == b' ' || b == b'[' {
            return None;
        }
        i += 1;
    }
    None
}

// ── Links and images ─────────────────────────────────────────────────────

/// Finds the matching `]` for balanced `[` text starting right after `[`,
/// not crossing a newline. Returns the index of the `]`.
fn find_balanced_bracket_close(gb: &GapBuffer, text_start: usize) -> Option<usize> {
    let mut depth = 1i32;
    let mut i = text_start;
    loop {
        match byte(gb, i) {
            None => return None,
            Some(b'\n') => return None,
            Some(b'[') => {
                depth += 1;
                i += 1;
            }
            Some(b']') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
}

/// `check_link`: `[text](url)`, text balanced with no newline. Returns
/// `(text_range, url_range, total)`.
pub fn check_link(gb: &GapBuffer, pos: usize) -> Option<(Range, Range, usize)> {
    if byte(gb, pos) != Some(b'[') {
        return None;
    }
    let text_start = pos + 1;
    let text_end = find_balanced_bracket_close(gb, text_start)?;
    if byte(gb, text_end + 1) != Some(b'(') {
        return None;
    }
    let url_start = text_end + 2;
    let mut i = url_start;
    loop {
        match byte(gb, i) {
            None | Some(b'\n') => return None,
            Some(b')') => break,
            _ => i += 1,
        }
    }
    let url_end = i;
    Some(((text_start, text_end), (url_start, url_end), i + 1 - pos))
}

/// `check_image`: `![alt](path){ k=v k=v }?`. Returns alt range, path
/// range, parsed width/height (negative = percent, `None` = unspecified),
/// and total length.
pub struct ImageMatch {
    pub alt: Range,
    pub path: Range,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub total: usize,
}

pub fn check_image(gb: &GapBuffer, pos: usize) -> Option<ImageMatch> {
    if byte(gb, pos) != Some(b'!') {
        return None;
    }
    let (alt, path, link_total) = check_link(gb, pos + 1)?;
    let mut end = pos + 1 + link_total;
    let mut width = None;
    let mut height = None;
    if byte(gb, end) == Some(b'{') {
        let brace_start = end + 1;
        let mut i = brace_start;
        loop {
            match byte(gb, i) {
                None | Some(b'\n') => return None,
                Some(b'}') => break,
                _ => i += 1,
            }
        }
        let attrs = gb.substr(brace_start, i);
        for token in attrs.split_whitespace() {
            if let Some(v) = token.strip_prefix("width=") {
                width = parse_dimension(v);
            } else if let Some(v) = token.strip_prefix("height=") {
                height = parse_dimension(v);
            }
        }
        end = i + 1;
    }
    Some(ImageMatch { alt, path, width, height, total: end - pos })
}

/// Parses a `width=`/`height=` value: `N` pixels, `N%` as negative percent.
fn parse_dimension(v: &str) -> Option<i32> {
    if let Some(pct) = v.strip_suffix('%') {
        pct.parse::<i32>().ok().map(|n| -n)
    } else {
        v.parse::<i32>().ok()
    }
}

// ── Inline / block math ──────────────────────────────────────────────────

/// `check_inline_math`: `$... $` on a single line, unescaped `$`.
/// Returns `(content_range, total)`.
pub fn check_inline_math(gb: &GapBuffer, pos: usize) -> Option<(Range, usize)> {
    if byte(gb, pos) != Some(b'$') {
        return None;
    }
    if byte(gb, pos + 1) == Some(b'$') {
        return None; // that's block math's opener, not inline
    }
    let content_start = pos + 1;
    if byte(gb, content_start) == Some(b' ') || byte(gb, content_start) == Some(b'\n') {
        return None;
    }
    let mut i = content_start;
    loop {
        match byte(gb, i) {
            None | Some(b'\n') => return None,
            Some(b'$') => {
                if byte(gb, i - 1) == Some(b'\\') {
                    i += 1;
                    continue;
                }
                if i == content_start {
                    return None;
                }
                return Some(((content_start, i), i + 1 - pos));
            }
            _ => i += 1,
        }
    }
}

/// `check_block_math_full`: `$$` alone on its own line, through to the
/// next line that is `$$` alone, or EOF. Returns `(content_range, total)`.
pub fn check_block_math_full(gb: &GapBuffer, pos: usize) -> Option<(Range, usize)> {
    if !is_line_start(gb, pos) || !starts_with(gb, pos, "$$") {
        return None;
    }
    let open_end = pos + 2;
    if byte(gb, open_end) != Some(b'\n') && byte(gb, open_end).is_some() {
        return None;
    }
    let content_start = if byte(gb, open_end) == Some(b'\n') { open_end + 1 } else { open_end };
    let len = gb.len();
    let mut i = content_start;
    loop {
        if i >= len {
            return Some(((content_start, len), len - pos));
        }
        if is_line_start(gb, i) && starts_with(gb, i, "$$") {
            let close_line_end = line_end(gb, i);
            if close_line_end == i + 2 {
                let content_end = if i > content_start { i - 1 } else { i };
                let total_end = if close_line_end < len { close_line_end + 1 } else { close_line_end };
                return Some(((content_start, content_end), total_end - pos));
            }
        }
        i = line_end(gb, i);
        if i < len {
            i += 1;
        } else {
            return Some(((content_start, len), len - pos));
        }
    }
}

// ── Fenced code ───────────────────────────────────────────────────────────

/// `check_code_block`: ```` ```lang\n...\n``` ````, opening fence at
/// line-start and column 0. Terminates at the first matching ```` ``` ````
/// line at column 0, or EOF. Returns `(lang_range, content_range, total)`.
pub fn check_code_block(gb: &GapBuffer, pos: usize) -> Option<(Range, Range, usize)> {
    if !is_line_start(gb, pos) || !starts_with(gb, pos, "```") {
        return None;
    }
    let lang_start = pos + 3;
    let fence_line_end = line_end(gb, pos);
    let lang_end = fence_line_end;
    let len = gb.len();
    let content_start = if fence_line_end < len { fence_line_end + 1 } else { fence_line_end };
    let mut i = content_start;
    loop {
        if i >= len {
            return Some(((lang_start, lang_end), (content_start, len), len - pos));
        }
        if starts_with(gb, i, "```") {
            let content_end = if i > content_start { i - 1 } else { i };
            let close_line_end = line_end(gb, i);
            let total_end = if close_line_end < len { close_line_end + 1 } else { close_line_end };
            return Some(((lang_start, lang_end), (content_start, content_end), total_end - pos));
        }
        i = line_end(gb, i);
        if i < len {
            i += 1;
        } else {
            return Some(((lang_start, lang_end), (content_start, len), len - pos));
        }
    }
}

// ── Autolinks ──────────────────────────────────────────────────────────────

/// `check_autolink`: `<https://...>` or `<user@host>`. Returns `(url_range,
/// total, is_email)`.
pub fn check_autolink(gb: &GapBuffer, pos: usize) -> Option<(Range, usize, bool)> {
    if byte(gb, pos) != Some(b'<') {
        return None;
    }
    let start = pos + 1;
    let mut i = start;
    loop {
        match byte(gb, i) {
            None | Some(b'\n') | Some(b' ') => return None,
            Some(b'>') => break,
            _ => i += 1,
        }
    }
    if i == start {
        return None;
    }
    let content = gb.substr(start, i);
    let is_email = content.contains('@') && !content.contains("://");
    let is_url = content.starts_with("http://") || content.starts_with("https://") || is_email;
    if !is_url {
        return None;
    }
    Some(((start, i), i + 1 - pos, is_email))
}

// ── Emoji ────────────────────────────────────────────────────────────────

/// `check_emoji`: `:name:` with `name` in the static shortcode table.
/// Returns `(glyph, name_range, total)`.
pub fn check_emoji(gb: &GapBuffer, pos: usize) -> Option<(&'static str, Range, usize)> {
    if byte(gb, pos) != Some(b':') {
        return None;
    }
    let name_start = pos + 1;
    let mut i = name_start;
    while let Some(b) = byte(gb, i) {
        if b == b':' {
            break;
        }
        if !(b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'+') {
            return None;
        }
        i += 1;
    }
    if i == name_start || byte(gb, i) != Some(b':') {
        return None;
    }
    let name = gb.substr(name_start, i);
    let glyph = md::resolve_emoji(&name)?;
    Some((glyph, (name_start, i), i + 1 - pos))
}

// ── HTML entities ──────────────────────────────────────────────────────────

/// `check_entity`: `&name;`, `&#nn;`, `&#xhh;`. Returns `(utf8_bytes, total)`.
pub fn check_entity(gb: &GapBuffer, pos: usize) -> Option<(String, usize)> {
    if byte(gb, pos) != Some(b'&') {
        return None;
    }
    let mut i = pos + 1;
    if byte(gb, i) == Some(b'#') {
        i += 1;
        let hex = byte(gb, i) == Some(b'x') || byte(gb, i) == Some(b'X');
        if hex {
            i += 1;
        }
        let digits_start = i;
        while let Some(b) = byte(gb, i) {
            let ok = if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() };
            if !ok {
                break;
            }
            i += 1;
        }
        if i == digits_start || byte(gb, i) != Some(b';') {
            return None;
        }
        let digits = gb.substr(digits_start, i);
        let radix = if hex { 16 } else { 10 };
        let cp = u32::from_str_radix(&digits, radix).ok()?;
        let ch = char::from_u32(cp)?;
        return Some((ch.to_string(), i + 1 - pos));
    }
    let name_start = i;
    while let Some(b) = byte(gb, i) {
        if b == b';' {
            break;
        }
        if !b.is_ascii_alphanumeric() {
            return None;
        }
        i += 1;
    }
    if i == name_start || byte(gb, i) != Some(b';') {
        return None;
    }
    let name = gb.substr(name_start, i);
    let resolved = md::resolve_named_entity(&name)?;
    Some((resolved.to_string(), i + 1 - pos))
}

// ── Inline style delimiters ──────────────────────────────────────────────

/// `check_delim`: is `pos` at an inline style delimiter? Returns
/// `(style, dlen)` for the longest matching delimiter.
pub fn check_delim(gb: &GapBuffer, pos: usize) -> Option<(Style, usize)> {
    for spec in md::DELIMITERS {
        if starts_with(gb, pos, spec.text) {
            return Some((spec.style, spec.len));
        }
    }
    None
}

/// Scans forward on the current line (not crossing a newline) for a byte
/// sequence matching `text` starting at or after `from`. Used by the
/// inline-style parser to confirm a closing delimiter exists before
/// opening a style.
pub fn find_closing_on_line(gb: &GapBuffer, from: usize, text: &str) -> bool {
    let end = line_end(gb, from);
    let mut i = from;
    while i < end {
        if starts_with(gb, i, text) {
            return true;
        }
        i += 1;
    }
    false
}

// ── Backslash escape ───────────────────────────────────────────────────────

/// `\x` where `x` is CommonMark-escapable punctuation, or a hard line break
/// via `\` followed by newline. Returns `(escaped_char, total)`.
pub fn check_escape(gb: &GapBuffer, pos: usize) -> Option<(char, usize)> {
    if byte(gb, pos) != Some(b'\\') {
        return None;
    }
    let (c, clen) = gb.utf8_at(pos + 1);
    if clen == 0 {
        return None;
    }
    if c == '\n' || md::is_escapable_punct(c) {
        Some((c, 1 + clen))
    } else {
        None
    }
}

// ── Tables ───────────────────────────────────────────────────────────────

/// Alignment of a pipe-table column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Default,
    Left,
    Right,
    Center,
}

/// Splits a single table row's source line into cell byte ranges (between
/// unescaped `|` separators, edges trimmed of the outer pipes if present).
pub fn parse_table_row(gb: &GapBuffer, pos: usize, len: usize) -> Vec<Range> {
    let end = pos + len;
    let mut start = pos;
    let mut e = end;
    if byte(gb, start) == Some(b'|') {
        start += 1;
    }
    if e > start && byte(gb, e - 1) == Some(b'|') {
        e -= 1;
    }
    let mut cells = Vec::new();
    let mut cell_start = start;
    let mut i = start;
    while i < e {
        if byte(gb, i) == Some(b'|') && byte(gb, i.wrapping_sub(1)) != Some(b'\\') {
            cells.push((cell_start, i));
            cell_start = i + 1;
        }
        i += 1;
    }
    cells.push((cell_start, e));
    cells
}

/// `check_table_header`: a line that looks like a pipe-table header row
/// (contains at least one unescaped, unquoted `|`), immediately followed
/// by a delimiter row.
pub fn check_table_header(gb: &GapBuffer, pos: usize) -> bool {
    is_line_start(gb, pos) && line_end(gb, pos) > pos && line_has_pipe(gb, pos)
}

fn line_has_pipe(gb: &GapBuffer, pos: usize) -> bool {
    let end = line_end(gb, pos);
    (pos..end).any(|i| byte(gb, i) == Some(b'|'))
}

/// `check_table_delimiter`: a line of cells each matching `:?-+:?` (with
/// optional surrounding pipes/spaces). Returns column alignments if so.
pub fn check_table_delimiter(gb: &GapBuffer, pos: usize) -> Option<Vec<Align>> {
    if !is_line_start(gb, pos) {
        return None;
    }
    let end = line_end(gb, pos);
    if end == pos {
        return None;
    }
    let cells = parse_table_row(gb, pos, end - pos);
    let mut aligns = Vec::with_capacity(cells.len());
    for (s, e) in cells {
        let text = gb.substr(s, e);
        let t = text.trim();
        if t.is_empty() || !t.chars().all(|c| c == '-' || c == ':') || !t.contains('-') {
            return None;
        }
        let left = t.starts_with(':');
        let right = t.ends_with(':');
        aligns.push(match (left, right) {
                (true, true) => Align::Center,
                (true, false) => Align::Left,
                (false, true) => Align::Right,
                (false, false) => Align::Default,
        });
    }
    Some(aligns)
}

/// `check_table`: a header row immediately followed by a valid delimiter
/// row. Returns the column alignments (column count = `aligns.len()`) and
/// the byte position just past the delimiter row's newline (where data
/// rows, if any, begin).
pub fn check_table(gb: &GapBuffer, pos: usize) -> Option<(Vec<Align>, usize)> {
    if !check_table_header(gb, pos) {
        return None;
    }
    let header_end = line_end(gb, pos);
    let len = gb.len();
    if header_end >= len {
        return None;
    }
    let delim_start = header_end + 1;
    let aligns = check_table_delimiter(gb, delim_start)?;
    let delim_end = line_end(gb, delim_start);
    let after = if delim_end < len { delim_end + 1 } else { delim_end };
    Some((aligns, after))
}

#[cfg(test)]
#[path = "recognizers_tests.rs"]
mod tests;
