//! Block model and cache: partitions the document into
//! a tiled sequence of typed blocks, pre-parses paragraph-like blocks into
//! inline runs, and sizes each block's virtual-row footprint.
//!
//! The cache here is sink-independent: `Image`/`Math` rows and a header's
//! exact wrap are refined by the renderer once it has access to the
//! external display/image/TeX sinks. What's computed here is a
//! reasonable standalone estimate that keeps the tiling and monotonicity
//! invariants true without any collaborator.

use crate::gap::GapBuffer;
use crate::md::{self, Style, MAX_STYLE_DEPTH};
use crate::recognizers::{self as rec, Align};
use crate::wrap;

pub type Range = (usize, usize);

/// The kind of construct a paragraph inline run carries, per's
/// variant list.
#[derive(Clone, Debug, PartialEq)]
pub enum InlineRunKind {
    Plain,
    Link { url: Range, text: Range },
    FootnoteRef { id: Range },
    InlineMath { content: Range },
    Emoji { glyph: &'static str },
    Entity { resolved: String },
    Escape { ch: char },
    HeadingId { id: Range },
    Autolink { url: Range, is_email: bool },
}

/// A contiguous styled span within a paragraph block.
#[derive(Clone, Debug, PartialEq)]
pub struct InlineRun {
    pub range: Range,
    pub style: Style,
    pub kind: InlineRunKind,
}

/// Task-item checkbox state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    None,
    Unchecked,
    Checked,
}

/// The tagged variants a block may be.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockKind {
    Paragraph { runs: Vec<InlineRun> },
    Header { level: u8, content_start: usize, heading_id: Option<Range> },
    Code { lang: Range, content: Range },
    Math { content: Range },
    Table { col_count: usize, row_count: usize, aligns: Vec<Align> },
    Image { alt: Range, path: Range, width: Option<i32>, height: Option<i32> },
    Hr,
    Blockquote { level: u32, content_start: usize },
    ListItem { ordered: bool, indent: usize, task_state: TaskState, content_start: usize },
    FootnoteDef { id: Range, content_start: usize },
}

/// A top-level document block: a tagged variant tiling `[range.0, range.1)`
/// with its cached virtual-row position.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub range: Range,
    pub kind: BlockKind,
    pub vrow_start: usize,
    pub vrow_count: usize,
}

// ── Line helpers (block.rs keeps its own; recognizers.rs's are private) ──

fn line_end(gb: &GapBuffer, mut pos: usize) -> usize {
    let len = gb.len();
    while pos < len && gb.at(pos) != Some(b'\n') {
        pos += 1;
    }
    pos
}

fn line_has_pipe(gb: &GapBuffer, start: usize, end: usize) -> bool {
    (start..end).any(|i| gb.at(i) == Some(b'|'))
}

/// True iff a block-level construct starts at `pos`.
fn is_block_start(gb: &GapBuffer, pos: usize) -> bool {
    if !rec::is_line_start(gb, pos) {
        return false;
    }
    check_image_block(gb, pos).is_some()
    || rec::check_code_block(gb, pos).is_some()
    || rec::check_block_math_full(gb, pos).is_some()
    || rec::check_table(gb, pos).is_some()
    || rec::check_hr(gb, pos).is_some()
    || rec::check_header(gb, pos).is_some()
    || rec::check_footnote_def(gb, pos).is_some()
    || rec::check_blockquote(gb, pos).is_some()
    || rec::check_list(gb, pos).is_some()
}

/// Block-level image precondition: the inline `check_image` match
/// must be alone on its line except for trailing spaces/tabs.
fn check_image_block(gb: &GapBuffer, pos: usize) -> Option<rec::ImageMatch> {
    if !rec::is_line_start(gb, pos) {
        return None;
    }
    let m = rec::check_image(gb, pos)?;
    let len = gb.len();
    let mut i = pos + m.total;
    while i < len && matches!(gb.at(i), Some(b' ') | Some(b'\t')) {
        i += 1;
    }
    if i < len && gb.at(i) != Some(b'\n') {
        return None;
    }
    Some(m)
}

// ── Parsing pass ─────────────────────────────────────────────────

/// Parses the whole buffer into a tiled block sequence.
pub fn parse(gb: &GapBuffer) -> Vec<Block> {
    let len = gb.len();
    let mut blocks = Vec::new();
    let mut pos = 0;
    while pos < len {
        let block = parse_one(gb, pos, len);
        debug_assert!(block.range.1 > pos, "block parse must make progress");
        pos = block.range.1;
        blocks.push(block);
    }
    blocks
}

fn parse_one(gb: &GapBuffer, pos: usize, len: usize) -> Block {
    if let Some(m) = check_image_block(gb, pos) {
        let mut end = pos + m.total;
        while end < len && matches!(gb.at(end), Some(b' ') | Some(b'\t')) {
            end += 1;
        }
        if end < len && gb.at(end) == Some(b'\n') {
            end += 1;
        }
        return Block {
            range: (pos, end),
            kind: BlockKind::Image { alt: m.alt, path: m.path, width: m.width, height: m.height },
            vrow_start: 0,
            vrow_count: 0,
        };
    }

    if let Some((lang, content, total)) = rec::check_code_block(gb, pos) {
        return Block {
            range: (pos, pos + total),
            kind: BlockKind::Code { lang, content },
            vrow_start: 0,
            vrow_count: 0,
        };
    }

    if let Some((content, total)) = rec::check_block_math_full(gb, pos) {
        return Block {
            range: (pos, pos + total),
            kind: BlockKind::Math { content },
            vrow_start: 0,
            vrow_count: 0,
        };
    }

    if let Some((aligns, after)) = rec::check_table(gb, pos) {
        let col_count = aligns.len();
        let mut end = after;
        let mut row_count = 1; // header row
        loop {
            if end >= len || gb.at(end) == Some(b'\n') {
                break;
            }
            let e = line_end(gb, end);
            if !line_has_pipe(gb, end, e) {
                break;
            }
            row_count += 1;
            end = if e < len { e + 1 } else { e };
        }
        return Block {
            range: (pos, end),
            kind: BlockKind::Table { col_count, row_count, aligns },
            vrow_start: 0,
            vrow_count: 0,
        };
    }

    if let Some(rule_len) = rec::check_hr(gb, pos) {
        let eol = pos + rule_len;
        let end = if eol < len { eol + 1 } else { eol };
        return Block { range: (pos, end), kind: BlockKind::Hr, vrow_start: 0, vrow_count: 0 };
    }

    if let Some((level, content_start)) = rec::check_header_content(gb, pos) {
        let eol = line_end(gb, pos);
        let mut heading_id = None;
        let mut i = content_start;
        while i < eol {
            if gb.at(i) == Some(b'{') {
                if let Some((idr, _)) = rec::check_heading_id(gb, i) {
                    heading_id = Some(idr);
                }
            }
            i += 1;
        }
        let end = if eol < len { eol + 1 } else { eol };
        return Block {
            range: (pos, end),
            kind: BlockKind::Header { level, content_start, heading_id },
            vrow_start: 0,
            vrow_count: 0,
        };
    }

    if let Some((id, content_start, total)) = rec::check_footnote_def(gb, pos) {
        let mut end = pos + total;
        end = if end < len { end + 1 } else { end };
        loop {
            if end >= len || gb.at(end) == Some(b'\n') {
                break;
            }
            if rec::check_footnote_def(gb, end).is_some() || is_block_start(gb, end) {
                break;
            }
            let e = line_end(gb, end);
            end = if e < len { e + 1 } else { e };
        }
        return Block {
            range: (pos, end),
            kind: BlockKind::FootnoteDef { id, content_start },
            vrow_start: 0,
            vrow_count: 0,
        };
    }

    if let Some((level, content_start)) = rec::check_blockquote(gb, pos) {
        let mut end = line_end(gb, pos);
        end = if end < len { end + 1 } else { end };
        loop {
            if end >= len {
                break;
            }
            if rec::check_blockquote(gb, end).is_none() {
                break;
            }
            let e = line_end(gb, end);
            end = if e < len { e + 1 } else { e };
        }
        return Block {
            range: (pos, end),
            kind: BlockKind::Blockquote { level, content_start },
            vrow_start: 0,
            vrow_count: 0,
        };
    }

    if let Some((ordered, indent, content_start)) = rec::check_list(gb, pos) {
        let (task_state, content_start) = match rec::check_task(gb, pos) {
            Some((1, _, cs)) => (TaskState::Unchecked, cs),
            Some((_, _, cs)) => (TaskState::Checked, cs),
            None => (TaskState::None, content_start),
        };
        let eol = line_end(gb, pos);
        let end = if eol < len { eol + 1 } else { eol };
        return Block {
            range: (pos, end),
            kind: BlockKind::ListItem { ordered, indent, task_state, content_start },
            vrow_start: 0,
            vrow_count: 0,
        };
    }

    // Paragraph: fallback. Consume until a blank line, a block-start line,
    // or EOF.
    let mut end = pos;
    loop {
        if end >= len {
            break;
        }
        if gb.at(end) == Some(b'\n') && gb.at(end + 1) == Some(b'\n') {
            end += 1;
            break;
        }
        if end > pos && rec::is_line_start(gb, end) && is_block_start(gb, end) {
            break;
        }
        end += 1;
    }
    let runs = parse_inline_runs(gb, pos, end);
    Block { range: (pos, end), kind: BlockKind::Paragraph { runs }, vrow_start: 0, vrow_count: 0 }
}

/// Public entry point for non-Paragraph variants (Blockquote, ListItem,
/// FootnoteDef) that don't cache their own runs: the renderer calls this
/// on their content range directly.
pub fn parse_inline(gb: &GapBuffer, start: usize, end: usize) -> Vec<InlineRun> {
    parse_inline_runs(gb, start, end)
}

/// Inline pre-pass: decomposes a paragraph's byte range into runs
/// using a bounded style stack.
fn parse_inline_runs(gb: &GapBuffer, start: usize, end: usize) -> Vec<InlineRun> {
    let mut runs = Vec::new();
    let mut stack: Vec<Style> = Vec::new();
    let mut current_style = Style::empty();
    let mut text_run_start = start;
    let mut pos = start;

    macro_rules! flush {
        ($to:expr) => {
            if $to > text_run_start {
                runs.push(InlineRun {
                        range: (text_run_start, $to),
                        style: current_style,
                        kind: InlineRunKind::Plain,
                });
            }
        };
    }

    while pos < end {
        if gb.at(pos) == Some(b'\n') {
            flush!(pos);
            pos += 1;
            text_run_start = pos;
            continue;
        }

        if let Some((text_range, url, total)) = rec::check_link(gb, pos) {
            flush!(pos);
            runs.push(InlineRun {
                    range: (pos, pos + total),
                    style: current_style,
                    kind: InlineRunKind::Link { url, text: text_range },
            });
            pos += total;
            text_run_start = pos;
            continue;
        }

        if let Some((id, total)) = rec::check_footnote_ref(gb, pos) {
            flush!(pos);
            runs.push(InlineRun {
                    range: (pos, pos + total),
                    style: current_style,
                    kind: InlineRunKind::FootnoteRef { id },
            });
            pos += total;
            text_run_start = pos;
            continue;
        }

        if let Some((content, total)) = rec::check_inline_math(gb, pos) {
            flush!(pos);
            runs.push(InlineRun {
                    range: (pos, pos + total),
                    style: current_style,
                    kind: InlineRunKind::InlineMath { content },
            });
            pos += total;
            text_run_start = pos;
            continue;
        }

        if let Some((glyph, _name, total)) = rec::check_emoji(gb, pos) {
            flush!(pos);
            runs.push(InlineRun {
                    range: (pos, pos + total),
                    style: current_style,
                    kind: InlineRunKind::Emoji { glyph },
            });
            pos += total;
            text_run_start = pos;
            continue;
        }

        if let Some((url, total, is_email)) = rec::check_autolink(gb, pos) {
            flush!(pos);
            runs.push(InlineRun {
                    range: (pos, pos + total),
                    style: current_style,
                    kind: InlineRunKind::Autolink { url, is_email },
            });
            pos += total;
            text_run_start = pos;
            continue;
        }

        if let Some((id, total)) = rec::check_heading_id(gb, pos) {
            flush!(pos);
            runs.push(InlineRun {
                    range: (pos, pos + total),
                    style: current_style,
                    kind: InlineRunKind::HeadingId { id },
            });
            pos += total;
            text_run_start = pos;
            continue;
        }

        if let Some((resolved, total)) = rec::check_entity(gb, pos) {
            flush!(pos);
            runs.push(InlineRun {
                    range: (pos, pos + total),
                    style: current_style,
                    kind: InlineRunKind::Entity { resolved },
            });
            pos += total;
            text_run_start = pos;
            continue;
        }

        if let Some((ch, total)) = rec::check_escape(gb, pos) {
            flush!(pos);
            runs.push(InlineRun {
                    range: (pos, pos + total),
                    style: current_style,
                    kind: InlineRunKind::Escape { ch },
            });
            pos += total;
            text_run_start = pos;
            continue;
        }

        if let Some((style, dlen)) = rec::check_delim(gb, pos) {
            if let Some(&top) = stack.last() {
                if top == style {
                    flush!(pos);
                    stack.pop();
                    current_style = stack.iter().fold(Style::empty(), |acc, &s| acc | s);
                    pos += dlen;
                    text_run_start = pos;
                    continue;
                }
            }
            let text = gb.substr(pos, pos + dlen);
            if stack.len() < MAX_STYLE_DEPTH && rec::find_closing_on_line(gb, pos + dlen, &text) {
                flush!(pos);
                stack.push(style);
                current_style |= style;
                pos += dlen;
                text_run_start = pos;
                continue;
            }
            // No matching close on the line, or stack full: stays literal,
            // falls through to plain-grapheme advance below.
        }

        let (_, clen) = gb.utf8_at(pos);
        pos += clen.max(1);
    }

    flush!(end);
    runs
}

// ── Virtual-row sizing ───────────────────────────────────────────

fn wrap_line_count(gb: &GapBuffer, start: usize, end: usize, width: usize) -> usize {
    if start == end {
        return 1;
    }
    let mut pos = start;
    let mut count = 0usize;
    while pos < end {
        let (next, _w) = wrap::find_wrap_point(gb, pos, end, width);
        count += 1;
        if next <= pos {
            break;
        }
        pos = next;
    }
    count.max(1)
}

fn count_wrapped_lines_in_range(gb: &GapBuffer, start: usize, end: usize, width: usize) -> usize {
    if start >= end {
        return 1;
    }
    let mut total = 0usize;
    let mut line_start = start;
    let mut i = start;
    while i <= end {
        if i == end || gb.at(i) == Some(b'\n') {
            total += wrap_line_count(gb, line_start, i, width);
            line_start = i + 1;
        }
        i += 1;
    }
    total.max(1)
}

fn header_vrow_count(gb: &GapBuffer, level: u8, content_start: usize, eol: usize, text_width: usize) -> usize {
    let scale = if level == 1 { 2 } else { 1 };
    let available = (text_width / scale).max(1);
    let lines = wrap_line_count(gb, content_start, eol.max(content_start), available).min(2);
    let underline = if level >= 2 { 1 } else { 0 };
    lines.max(1) + underline
}

/// Computes a block's virtual-row footprint, independent of external sinks
///.
pub fn compute_vrow_count(gb: &GapBuffer, kind: &BlockKind, range: Range, text_width: usize) -> usize {
    let width = text_width.max(1);
    match kind {
        BlockKind::Hr => 1,
        BlockKind::Image {.. } => 1,
        BlockKind::Header { level, content_start,.. } => {
            let eol = if range.1 > range.0 && gb.at(range.1 - 1) == Some(b'\n') {
                range.1 - 1
            } else {
                range.1
            };
            header_vrow_count(gb, *level, *content_start, eol, width)
        }
        BlockKind::Code { content,.. } => {
            let mut rows = 1usize;
            for i in content.0..content.1 {
                if gb.at(i) == Some(b'\n') {
                    rows += 1;
                }
            }
            rows
        }
        BlockKind::Math {.. } => 1,
        BlockKind::Table { row_count,.. } => {
            let data_rows = row_count.saturating_sub(1);
            let dividers = data_rows.saturating_sub(1);
            4 + data_rows + dividers
        }
        BlockKind::Blockquote {.. }
        | BlockKind::ListItem {.. }
        | BlockKind::FootnoteDef {.. }
        | BlockKind::Paragraph {.. } => count_wrapped_lines_in_range(gb, range.0, range.1, width),
    }
}

// ── Block cache ────────────────────────────────────────────────────

/// Holds the parsed block sequence plus the layout parameters it was
/// computed for. Invalidated wholesale on any text mutation or when
/// `(wrap_width, text_height)` change; reparsed lazily on demand.
pub struct BlockCache {
    pub blocks: Vec<Block>,
    pub total_vrows: usize,
    pub wrap_width: usize,
    pub text_height: usize,
    pub text_len: usize,
    valid: bool,
}

impl Default for BlockCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockCache {
    pub fn new() -> Self {
        BlockCache { blocks: Vec::new(), total_vrows: 0, wrap_width: 0, text_height: 0, text_len: 0, valid: false }
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Reparses from byte 0 if the cache is invalid or the layout
    /// parameters changed.
    pub fn ensure(&mut self, gb: &GapBuffer, wrap_width: usize, text_height: usize) {
        if self.valid && self.wrap_width == wrap_width && self.text_height == text_height && self.text_len == gb.len() {
            return;
        }
        self.reparse(gb, wrap_width, text_height);
    }

    fn reparse(&mut self, gb: &GapBuffer, wrap_width: usize, text_height: usize) {
        let mut blocks = parse(gb);
        let mut vrow = 0usize;
        for block in &mut blocks {
            let count = compute_vrow_count(gb, &block.kind, block.range, wrap_width);
            block.vrow_start = vrow;
            block.vrow_count = count.max(1);
            vrow += block.vrow_count;
        }
        self.blocks = blocks;
        self.total_vrows = vrow;
        self.wrap_width = wrap_width;
        self.text_height = text_height;
        self.text_len = gb.len();
        self.valid = true;
    }

    /// Binary search by `[start, end)`. End of document resolves to the
    /// last block.
    pub fn block_at_pos(&self, pos: usize) -> Option<&Block> {
        if self.blocks.is_empty() {
            return None;
        }
        match self.blocks.binary_search_by(|b| {
                if pos < b.range.0 {
                    std::cmp::Ordering::Greater
                } else if pos >= b.range.1 {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
        }) {
            Ok(i) => self.blocks.get(i),
            Err(_) => self.blocks.last(),
        }
    }

    /// Binary search by `[vrow_start, vrow_start + vrow_count)`.
    pub fn block_at_vrow(&self, vrow: usize) -> Option<&Block> {
        if self.blocks.is_empty() {
            return None;
        }
        match self.blocks.binary_search_by(|b| {
                if vrow < b.vrow_start {
                    std::cmp::Ordering::Greater
                } else if vrow >= b.vrow_start + b.vrow_count {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
        }) {
            Ok(i) => self.blocks.get(i),
            Err(_) => self.blocks.last(),
        }
    }

    /// Cursor's virtual row within `block`, mirroring how the renderer
    /// would wrap that variant. Approximate for variants whose
    /// exact placement depends on a sink (Image/Math/Header scaling).
    pub fn cursor_vrow_in_block(&self, gb: &GapBuffer, block: &Block, cursor: usize) -> usize {
        let cursor = cursor.clamp(block.range.0, block.range.1);
        match &block.kind {
            BlockKind::Code { content,.. } => {
                let mut rows = 0usize;
                for i in content.0..cursor.min(content.1) {
                    if gb.at(i) == Some(b'\n') {
                        rows += 1;
                    }
                }
                rows
            }
            BlockKind::Blockquote {.. }
            | BlockKind::ListItem {.. }
            | BlockKind::FootnoteDef {.. }
            | BlockKind::Paragraph {.. } => {
                count_wrapped_lines_in_range(gb, block.range.0, cursor, self.wrap_width.max(1)).saturating_sub(1)
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
#[path = "block_tests.rs"]
mod tests;
