//! Cursor-aware renderer: lays out the visible block range, then
//! dispatches each block to a specialized emitter against a
//! [`DisplaySink`], honoring the raw-reveal and selection rules.
//!
//! This module never imports `ratatui` or `crossterm` directly, only the
//! `sink` traits — the same leaf-isolation discipline `highlight.rs` uses
//! for `syntect`.

use crate::block::{Block, BlockCache, BlockKind, InlineRunKind};
use crate::gap::GapBuffer;
use crate::md::Style;
use crate::recognizers::{self as rec, Align};
use crate::sink::{DisplaySink, HighlightSink, ImageSink, MathSink, Rgb};
use crate::wrap;

/// Named theme colors.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub fg: Rgb,
    pub bg: Rgb,
    pub dim: Rgb,
    pub accent: Rgb,
    pub select_bg: Rgb,
    pub border: Rgb,
    pub code_bg: Rgb,
    pub mark_bg: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            fg: Rgb(220, 220, 220),
            bg: Rgb(20, 20, 24),
            dim: Rgb(110, 110, 120),
            accent: Rgb(122, 162, 247),
            select_bg: Rgb(60, 70, 90),
            border: Rgb(80, 80, 90),
            code_bg: Rgb(30, 30, 36),
            mark_bg: Rgb(120, 100, 20),
        }
    }
}

/// The final area the renderer draws text into.
#[derive(Clone, Copy, Debug)]
pub struct Layout {
    pub text_width: usize,
    pub text_height: usize,
    pub left_margin: usize,
    pub top_margin: usize,
}

/// Computes the text area from the raw terminal size, reserving the top/
/// bottom chrome and centering a column of at most 70 cells.
pub fn compute_layout(cols: usize, rows: usize, text_area_cols: usize) -> Layout {
    let top_margin = 2;
    let bottom_margin = 2;
    let text_height = rows.saturating_sub(top_margin + bottom_margin).max(1);
    let margin = if text_area_cols > 80 { (text_area_cols.saturating_sub(70)) / 2 } else { 4 };
    let text_width = text_area_cols.saturating_sub(margin * 2).max(1);
    let left_margin = cols.saturating_sub(text_area_cols) + margin;
    Layout { text_width, text_height, left_margin, top_margin }
}

/// Clamps `scroll_y` so the cursor's virtual row stays within a band of
/// `max(3, height>10?3:1)` rows from the top/bottom.
pub fn clamp_scroll(scroll_y: usize, cursor_vrow: usize, text_height: usize, total_vrows: usize) -> usize {
    let band = if text_height > 10 { 3 } else { 1 }.max(3.min(text_height / 2).max(1));
    let band = band.min(text_height.saturating_sub(1)).max(0);
    let mut scroll = scroll_y;
    if cursor_vrow < scroll + band {
        scroll = cursor_vrow.saturating_sub(band);
    } else if cursor_vrow + band >= scroll + text_height {
        scroll = (cursor_vrow + band + 1).saturating_sub(text_height);
    }
    let max_scroll = total_vrows.saturating_sub(text_height);
    scroll.min(max_scroll)
}

/// Cursor/selection/raw-reveal state the renderer needs but doesn't own.
pub struct RenderState {
    pub cursor: usize,
    pub selection: Option<(usize, usize)>,
    pub raw_reveal: bool,
}

/// Where the cursor landed on screen after the last `render` call
///.
#[derive(Clone, Copy, Debug, Default)]
pub struct CursorPos {
    pub row: u16,
    pub col: u16,
}

struct Cursor3 {
    row: usize,
    col: usize,
}

/// Renders the visible block range to `sink` and returns the final cursor
/// screen position.
#[allow(clippy::too_many_arguments)]
pub fn render(
    gb: &GapBuffer,
    cache: &BlockCache,
    layout: Layout,
    scroll_y: usize,
    state: &RenderState,
    theme: &Theme,
    sink: &mut dyn DisplaySink,
    highlighter: &mut dyn HighlightSink,
    images: &mut dyn ImageSink,
    math: &mut dyn MathSink,
) -> CursorPos {
    sink.sync_begin();
    sink.reset_attrs();

    let mut running_vrow = scroll_y;
    let mut screen_row = layout.top_margin;
    let mut cursor_screen = Cursor3 { row: layout.top_margin, col: layout.left_margin };
    let max_row = layout.top_margin + layout.text_height;

    if let Some(start_block) = cache.block_at_vrow(scroll_y) {
        let start_idx = cache.blocks.iter().position(|b| b.range == start_block.range).unwrap_or(0);
        for block in &cache.blocks[start_idx..] {
            if screen_row >= max_row {
                break;
            }
            running_vrow = block.vrow_start;
            let ctx = EmitCtx {
                gb,
                layout,
                theme,
                state,
                screen_row_base: layout.top_margin,
                scroll_y,
                max_row,
            };
            let emitted_rows = emit_block(&ctx, block, sink, highlighter, images, math, &mut cursor_screen);
            screen_row = (block.vrow_start + emitted_rows).saturating_sub(scroll_y) + layout.top_margin;
            running_vrow += emitted_rows;
        }
    }
    let _ = running_vrow;

    if state.cursor >= gb.len() {
        cursor_screen.col += 1;
    }
    let row = cursor_screen.row.min(u16::MAX as usize) as u16;
    let col = cursor_screen.col.min(u16::MAX as usize) as u16;
    sink.show_cursor_at(row, col);
    sink.sync_end();
    sink.flush();
    CursorPos { row, col }
}

struct EmitCtx<'a> {
    gb: &'a GapBuffer,
    layout: Layout,
    theme: &'a Theme,
    state: &'a RenderState,
    screen_row_base: usize,
    scroll_y: usize,
    max_row: usize,
}

impl<'a> EmitCtx<'a> {
    fn screen_row(&self, vrow: usize) -> usize {
        self.screen_row_base + vrow.saturating_sub(self.scroll_y)
    }

    fn in_selection(&self, byte: usize) -> bool {
        match self.state.selection {
            Some((s, e)) => byte >= s.min(e) && byte < s.max(e),
            None => false,
        }
    }

    fn cursor_in(&self, range: (usize, usize)) -> bool {
        self.state.cursor >= range.0 && self.state.cursor < range.1
    }
}

/// Dispatches one block; returns how many virtual rows it actually took
///.
fn emit_block(
    ctx: &EmitCtx,
    block: &Block,
    sink: &mut dyn DisplaySink,
    highlighter: &mut dyn HighlightSink,
    images: &mut dyn ImageSink,
    math: &mut dyn MathSink,
    cursor_screen: &mut Cursor3,
) -> usize {
    if ctx.screen_row(block.vrow_start) >= ctx.max_row {
        return block.vrow_count;
    }
    match &block.kind {
        BlockKind::Hr => emit_hr(ctx, block, sink, cursor_screen),
        BlockKind::Image { alt, path, width, height } => {
            emit_image(ctx, block, *alt, *path, *width, *height, images, sink)
        }
        BlockKind::Header { level, content_start, heading_id } => {
            emit_header(ctx, block, *level, *content_start, *heading_id, sink, cursor_screen)
        }
        BlockKind::Code { lang, content } => emit_code(ctx, block, *lang, *content, highlighter, sink, cursor_screen),
        BlockKind::Math { content } => emit_math(ctx, block, *content, math, sink),
        BlockKind::Table { col_count, aligns,.. } => emit_table(ctx, block, *col_count, aligns, sink, cursor_screen),
        BlockKind::Paragraph { runs } => emit_prefixed_lines(ctx, block, runs, None, sink, math, cursor_screen),
        BlockKind::Blockquote { level, content_start } => emit_prefixed_lines(
            ctx,
            block,
            &[],
            Some(LinePrefix::Blockquote(*level, *content_start)),
            sink,
            math,
            cursor_screen,
        ),
        BlockKind::ListItem { ordered, indent, task_state, content_start } => emit_prefixed_lines(
            ctx,
            block,
            &[],
            Some(LinePrefix::ListItem(*ordered, *indent, *task_state, *content_start)),
            sink,
            math,
            cursor_screen,
        ),
        BlockKind::FootnoteDef { id, content_start } => emit_prefixed_lines(
            ctx,
            block,
            &[],
            Some(LinePrefix::FootnoteDef(*id, *content_start)),
            sink,
            math,
            cursor_screen,
        ),
    }
}

fn emit_hr(ctx: &EmitCtx, block: &Block, sink: &mut dyn DisplaySink, cursor_screen: &mut Cursor3) -> usize {
    let row = ctx.screen_row(block.vrow_start);
    sink.move_to(row as u16, ctx.layout.left_margin as u16);
    sink.set_fg(ctx.theme.dim);
    sink.set_dim(true);
    if ctx.state.raw_reveal && ctx.cursor_in(block.range) {
        let text = ctx.gb.substr(block.range.0, block.range.1);
        sink.write_str(text.trim_end_matches('\n'));
    } else {
        sink.write_str(&"─".repeat(ctx.layout.text_width));
    }
    sink.set_dim(false);
    sink.reset_attrs();
    if ctx.cursor_in(block.range) {
        cursor_screen.row = row;
        cursor_screen.col = ctx.layout.left_margin;
    }
    1
}

#[allow(clippy::too_many_arguments)]
fn emit_image(
    ctx: &EmitCtx,
    block: &Block,
    _alt: (usize, usize),
    path_range: (usize, usize),
    width: Option<i32>,
    height: Option<i32>,
    images: &mut dyn ImageSink,
    sink: &mut dyn DisplaySink,
) -> usize {
    let row = ctx.screen_row(block.vrow_start);
    let raw_path = ctx.gb.substr(path_range.0, path_range.1);
    let Ok(resolved) = images.image_resolve_path(&raw_path, std::path::Path::new(".")) else {
        sink.move_to(row as u16, ctx.layout.left_margin as u16);
        sink.set_dim(true);
        sink.write_str("[image unavailable]");
        sink.set_dim(false);
        return 1;
    };
    let size = images.image_get_size(&resolved).or_else(|| {
            match (width, height) {
                (Some(w), Some(h)) if w > 0 && h > 0 => Some((w as u32, h as u32)),
                _ => None,
            }
    });
    match size {
        Some((w, h)) => {
            let max_cols = ctx.layout.text_width.min(u16::MAX as usize) as u16;
            let rows = images.image_calc_rows(w, h, max_cols, 1).max(1);
            let bottom = row + rows as usize;
            if bottom > ctx.max_row {
                let visible = (ctx.max_row.saturating_sub(row)) as u16;
                images.image_display_cropped(&resolved, row as u16, ctx.layout.left_margin as u16, max_cols, 0, visible);
                (ctx.max_row - row).max(1)
            } else {
                images.image_display_at(&resolved, row as u16, ctx.layout.left_margin as u16, max_cols, rows);
                rows as usize
            }
        }
        None => {
            sink.move_to(row as u16, ctx.layout.left_margin as u16);
            sink.set_dim(true);
            sink.write_str("[image unavailable]");
            sink.set_dim(false);
            1
        }
    }
}

fn emit_header(
    ctx: &EmitCtx,
    block: &Block,
    level: u8,
    content_start: usize,
    heading_id: Option<(usize, usize)>,
    sink: &mut dyn DisplaySink,
    cursor_screen: &mut Cursor3,
) -> usize {
    let row = ctx.screen_row(block.vrow_start);
    let eol = if block.range.1 > block.range.0 && ctx.gb.at(block.range.1 - 1) == Some(b'\n') {
        block.range.1 - 1
    } else {
        block.range.1
    };
    let text_end = heading_id.map(|(id_start, _)| id_start.saturating_sub(2)).unwrap_or(eol).max(content_start);
    let text = ctx.gb.substr(content_start, text_end).trim_end().to_string();
    let scale = if sink.caps().text_sizing && level == 1 { 2 } else { 1 };

    if ctx.state.raw_reveal && ctx.cursor_in(block.range) {
        sink.move_to(row as u16, ctx.layout.left_margin as u16);
        sink.set_dim(true);
        let raw = ctx.gb.substr(block.range.0, eol);
        sink.write_str(&raw);
        sink.set_dim(false);
        if ctx.cursor_in(block.range) {
            cursor_screen.row = row;
            cursor_screen.col = ctx.layout.left_margin + (ctx.state.cursor - block.range.0);
        }
        return block.vrow_count;
    }

    let available = (ctx.layout.text_width / scale.max(1)).max(1);
    let (line1, line2) = split_header_text(&text, available);

    sink.set_fg(ctx.theme.accent);
    sink.set_bold(true);
    let col1 = ctx.layout.left_margin + ctx.layout.text_width.saturating_sub(line1.chars().count() * scale) / 2;
    sink.move_to(row as u16, col1 as u16);
    sink.write_scaled(&line1, scale as u8);
    let mut rows_used = 1;
    if let Some(l2) = &line2 {
        let col2 = ctx.layout.left_margin + ctx.layout.text_width.saturating_sub(l2.chars().count() * scale) / 2;
        sink.move_to((row + 1) as u16, col2 as u16);
        sink.write_scaled(l2, scale as u8);
        rows_used += 1;
    }
    sink.set_bold(false);

    if level >= 2 {
        let line_width = line2.as_ref().unwrap_or(&line1).chars().count() * scale;
        let underline_width = (line_width / 3).max(4);
        let ucol = ctx.layout.left_margin + ctx.layout.text_width.saturating_sub(underline_width) / 2;
        sink.move_to((row + rows_used) as u16, ucol as u16);
        sink.set_fg(ctx.theme.dim);
        sink.write_str(&"─".repeat(underline_width));
        rows_used += 1;
    }
    sink.reset_attrs();

    if ctx.cursor_in(block.range) {
        cursor_screen.row = row;
        cursor_screen.col = col1;
    }
    rows_used
}

/// Splits header text into 1-2 lines, choosing the break (after a space)
/// that minimizes `|first_line - second_line|` among breaks that fit both
/// lines within `available`.
fn split_header_text(text: &str, available: usize) -> (String, Option<String>) {
    if text.chars().count() <= available {
        return (text.to_string(), None);
    }
    let mut best: Option<(usize, usize)> = None; // (byte offset, score)
    let mut acc_chars = 0usize;
    for (i, ch) in text.char_indices() {
        acc_chars += 1;
        if ch == ' ' {
            let first_len = acc_chars.saturating_sub(1);
            let rest = &text[i + 1..];
            let second_len = rest.chars().count();
            if first_len <= available && second_len <= available {
                let score = first_len.abs_diff(second_len);
                if best.is_none_or(|(_, s)| score < s) {
                    best = Some((i, score));
                }
            }
        }
    }
    match best {
        Some((i, _)) => (text[..i].to_string(), Some(text[i + 1..].to_string())),
        None => {
            let truncated: String = text.chars().take(available).collect();
            (truncated, None)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_code(
    ctx: &EmitCtx,
    block: &Block,
    lang: (usize, usize),
    content: (usize, usize),
    highlighter: &mut dyn HighlightSink,
    sink: &mut dyn DisplaySink,
    cursor_screen: &mut Cursor3,
) -> usize {
    let base_row = ctx.screen_row(block.vrow_start);
    if ctx.state.raw_reveal && ctx.cursor_in(block.range) {
        let raw = ctx.gb.substr(block.range.0, block.range.1);
        let mut row = base_row;
        sink.set_dim(true);
        for (i, line) in raw.split('\n').enumerate() {
            if i > 0 {
                row += 1;
            }
            sink.move_to(row as u16, ctx.layout.left_margin as u16);
            sink.write_str(line);
        }
        sink.set_dim(false);
        cursor_screen.row = base_row;
        cursor_screen.col = ctx.layout.left_margin;
        return block.vrow_count;
    }

    let lang_text = ctx.gb.substr(lang.0, lang.1);
    let code_text = ctx.gb.substr(content.0, content.1);
    let highlighted = highlighter.highlight(&code_text, if lang_text.is_empty() { None } else { Some(&lang_text) });

    sink.set_bg(ctx.theme.code_bg);
    let mut row = base_row;
    if !lang_text.is_empty() {
        sink.move_to(row as u16, (ctx.layout.left_margin + ctx.layout.text_width.saturating_sub(lang_text.len())) as u16);
        sink.set_dim(true);
        sink.write_str(&lang_text);
        sink.set_dim(false);
        row += 1;
    }
    for line in highlighted.split('\n') {
        sink.move_to(row as u16, ctx.layout.left_margin as u16);
        sink.write_str(&line.replace('\t', "    "));
        row += 1;
    }
    sink.reset_attrs();
    row - base_row
}

fn emit_math(
    ctx: &EmitCtx,
    block: &Block,
    content: (usize, usize),
    math: &mut dyn MathSink,
    sink: &mut dyn DisplaySink,
) -> usize {
    let row = ctx.screen_row(block.vrow_start);
    let latex = ctx.gb.substr(content.0, content.1);
    sink.set_fg(ctx.theme.accent);
    match math.tex_render(&latex, true) {
        Some(sketch) => {
            for (r, cells) in sketch.rows.iter().enumerate() {
                sink.move_to((row + r) as u16, ctx.layout.left_margin as u16);
                for cell in cells {
                    sink.write_str(&cell.data);
                }
            }
            sink.reset_attrs();
            sketch.height.max(1)
        }
        None => {
            sink.move_to(row as u16, ctx.layout.left_margin as u16);
            sink.write_str(&latex);
            sink.reset_attrs();
            1
        }
    }
}

fn table_line_end(gb: &GapBuffer, pos: usize) -> usize {
    let len = gb.len();
    let mut p = pos;
    while p < len && gb.at(p) != Some(b'\n') {
        p += 1;
    }
    p
}

fn emit_table(
    ctx: &EmitCtx,
    block: &Block,
    col_count: usize,
    aligns: &[Align],
    sink: &mut dyn DisplaySink,
    cursor_screen: &mut Cursor3,
) -> usize {
    let row0 = ctx.screen_row(block.vrow_start);

    if ctx.state.raw_reveal && ctx.cursor_in(block.range) {
        let raw = ctx.gb.substr(block.range.0, block.range.1);
        let mut row = row0;
        sink.set_dim(true);
        for (i, line) in raw.split('\n').enumerate() {
            if i > 0 {
                row += 1;
            }
            sink.move_to(row as u16, ctx.layout.left_margin as u16);
            sink.write_str(line);
        }
        sink.set_dim(false);
        sink.reset_attrs();
        cursor_screen.row = row0;
        cursor_screen.col = ctx.layout.left_margin;
        return block.vrow_count;
    }

    let width = ctx.layout.text_width;
    let base = width.saturating_sub(col_count * 3 + 1) / col_count.max(1);
    let col_w = base.clamp(8, 30);

    let border = |l: &str, m: &str, r: &str| -> String {
        let seg = "─".repeat(col_w);
        let mut s = String::new();
        s.push_str(l);
        for i in 0..col_count {
            s.push_str(&seg);
            s.push_str(if i + 1 == col_count { r } else { m });
        }
        s
    };

    let mut row = row0;
    sink.set_fg(ctx.theme.border);
    sink.move_to(row as u16, ctx.layout.left_margin as u16);
    sink.write_str(&border("┌", "┬", "┐"));
    row += 1;

    let header_end = table_line_end(ctx.gb, block.range.0);
    let header_cells = rec::parse_table_row(ctx.gb, block.range.0, header_end - block.range.0);
    sink.move_to(row as u16, ctx.layout.left_margin as u16);
    sink.reset_attrs();
    write_table_row(ctx, sink, &header_cells, aligns, col_w);
    row += 1;

    sink.set_fg(ctx.theme.border);
    sink.move_to(row as u16, ctx.layout.left_margin as u16);
    sink.write_str(&border("├", "┼", "┤"));
    row += 1;

    let delim_end = table_line_end(ctx.gb, header_end + 1);
    let mut data_pos = if delim_end < ctx.gb.len() { delim_end + 1 } else { delim_end };
    let mut first_data_row = true;
    while data_pos < block.range.1 {
        let line_end = table_line_end(ctx.gb, data_pos).min(block.range.1);
        if line_end <= data_pos {
            break;
        }
        if !first_data_row {
            sink.set_fg(ctx.theme.border);
            sink.move_to(row as u16, ctx.layout.left_margin as u16);
            sink.write_str(&border("├", "┼", "┤"));
            row += 1;
        }
        first_data_row = false;
        let cells = rec::parse_table_row(ctx.gb, data_pos, line_end - data_pos);
        sink.reset_attrs();
        sink.move_to(row as u16, ctx.layout.left_margin as u16);
        write_table_row(ctx, sink, &cells, aligns, col_w);
        row += 1;
        data_pos = if line_end < block.range.1 { line_end + 1 } else { line_end };
    }

    sink.set_fg(ctx.theme.border);
    sink.move_to(row as u16, ctx.layout.left_margin as u16);
    sink.write_str(&border("└", "┴", "┘"));
    row += 1;
    sink.reset_attrs();

    if ctx.cursor_in(block.range) {
        cursor_screen.row = row0;
        cursor_screen.col = ctx.layout.left_margin;
    }
    row - row0
}

fn write_table_row(ctx: &EmitCtx, sink: &mut dyn DisplaySink, cells: &[(usize, usize)], aligns: &[Align], col_w: usize) {
    sink.write_str("│");
    for (i, &(s, e)) in cells.iter().enumerate() {
        let cell = ctx.gb.substr(s, e);
        let cell = cell.trim();
        let align = aligns.get(i).copied().unwrap_or(Align::Default);
        let truncated: String = cell.chars().take(col_w).collect();
        let pad = col_w.saturating_sub(truncated.chars().count());
        let padded = match align {
            Align::Left | Align::Default => format!("{truncated}{}", " ".repeat(pad)),
            Align::Right => format!("{}{truncated}", " ".repeat(pad)),
            Align::Center => {
                let left = pad / 2;
                let right = pad - left;
                format!("{}{truncated}{}", " ".repeat(left), " ".repeat(right))
            }
        };
        sink.write_str(&padded);
        sink.write_str("│");
    }
}

enum LinePrefix {
    Blockquote(u32, usize),
    ListItem(bool, usize, crate::block::TaskState, usize),
    FootnoteDef((usize, usize), usize),
}

/// Shared emitter for Paragraph/Blockquote/ListItem/FootnoteDef:
/// renders a line prefix (if any) then the wrapped inline content.
#[allow(clippy::too_many_arguments)]
fn emit_prefixed_lines(
    ctx: &EmitCtx,
    block: &Block,
    precomputed_runs: &[crate::block::InlineRun],
    prefix: Option<LinePrefix>,
    sink: &mut dyn DisplaySink,
    math: &mut dyn MathSink,
    cursor_screen: &mut Cursor3,
) -> usize {
    let row0 = ctx.screen_row(block.vrow_start);
    let content_start = match &prefix {
        Some(LinePrefix::Blockquote(_, cs)) => *cs,
        Some(LinePrefix::ListItem(_, _, _, cs)) => *cs,
        Some(LinePrefix::FootnoteDef(_, cs)) => *cs,
        None => block.range.0,
    };

    let prefix_text = match &prefix {
        Some(LinePrefix::Blockquote(level, _)) => "┃ ".repeat(*level as usize),
        Some(LinePrefix::ListItem(ordered, _indent, task, _)) => match task {
            crate::block::TaskState::Unchecked => "☐ ".to_string(),
            crate::block::TaskState::Checked => "☑ ".to_string(),
            crate::block::TaskState::None => {
                if *ordered {
                    "1. ".to_string()
                } else {
                    "• ".to_string()
                }
            }
        },
        Some(LinePrefix::FootnoteDef(id, _)) => format!("[{}] ", ctx.gb.substr(id.0, id.1)),
        None => String::new(),
    };

    let prefix_range = (block.range.0, content_start);
    if ctx.cursor_in(prefix_range) && ctx.state.raw_reveal {
        sink.move_to(row0 as u16, ctx.layout.left_margin as u16);
        sink.set_dim(true);
        sink.write_str(&ctx.gb.substr(prefix_range.0, prefix_range.1));
        sink.set_dim(false);
    } else if !prefix_text.is_empty() {
        sink.move_to(row0 as u16, ctx.layout.left_margin as u16);
        sink.set_fg(ctx.theme.accent);
        sink.write_str(&prefix_text);
        sink.reset_attrs();
    }
    let indent = prefix_text.chars().count();

    let runs: Vec<crate::block::InlineRun> = if precomputed_runs.is_empty() {
        match &block.kind {
            BlockKind::Paragraph { runs } => runs.clone(),
            _ => crate::block::parse_inline(ctx.gb, content_start, block.range.1),
        }
    } else {
        precomputed_runs.to_vec()
    };

    let width = ctx.layout.text_width.saturating_sub(indent).max(1);
    let base_col = ctx.layout.left_margin + indent;
    let mut row = row0;
    let mut col = base_col;

    for run in &runs {
        if run.range.1 <= run.range.0 {
            continue;
        }
        let reveal = ctx.state.raw_reveal
        && ctx.cursor_in(run.range)
        && !matches!(run.kind, InlineRunKind::Plain);
        apply_style(sink, ctx.theme, run.style, reveal);

        if reveal || matches!(run.kind, InlineRunKind::Plain) {
            emit_gb_run_wrapped(ctx, sink, run, width, base_col, &mut row, &mut col, cursor_screen);
        } else {
            let pretty = pretty_run_text(ctx, math, &run.kind);
            emit_str_run_wrapped(ctx, sink, run, &pretty, width, base_col, &mut row, &mut col, cursor_screen);
        }
        sink.reset_attrs();
    }
    if ctx.cursor_in((block.range.1.saturating_sub(1), block.range.1)) || ctx.state.cursor == block.range.1 {
        cursor_screen.row = row;
        cursor_screen.col = col;
    }
    (row - row0) + 1
}

/// Resolves a non-`Plain` run's content-aware display text: link label
/// instead of `[text](url)`, resolved emoji glyph, rendered entity/escape
/// character, a compact footnote marker, attempted TeX output for inline
/// math (falling back to the literal formula when the sink can't render
/// it), and the bare URL for an autolink. `HeadingId` carries no visible
/// text of its own.
fn pretty_run_text(ctx: &EmitCtx, math: &mut dyn MathSink, kind: &InlineRunKind) -> String {
    match kind {
        InlineRunKind::Plain => String::new(),
        InlineRunKind::Link { text, .. } => ctx.gb.substr(text.0, text.1),
        InlineRunKind::FootnoteRef { id } => format!("[{}]", ctx.gb.substr(id.0, id.1)),
        InlineRunKind::InlineMath { content } => {
            let latex = ctx.gb.substr(content.0, content.1);
            match math.tex_render(&latex, false) {
                Some(sketch) => sketch
                .rows
                .first()
                .map(|cells| cells.iter().map(|c| c.data.as_str()).collect::<String>())
                .unwrap_or(latex),
                None => latex,
            }
        }
        InlineRunKind::Emoji { glyph } => glyph.to_string(),
        InlineRunKind::Entity { resolved } => resolved.clone(),
        InlineRunKind::Escape { ch } => ch.to_string(),
        InlineRunKind::HeadingId {.. } => String::new(),
        InlineRunKind::Autolink { url,.. } => ctx.gb.substr(url.0, url.1),
    }
}

/// Emits a run's raw buffer bytes (`[run.range.0, run.range.1)`), wrapping
/// through `wrap::find_wrap_point` so break points agree with
/// `block::compute_vrow_count`'s sizing pass. Tracks the cursor's exact
/// screen position grapheme-by-grapheme since the drawn text matches the
/// buffer byte for byte.
#[allow(clippy::too_many_arguments)]
fn emit_gb_run_wrapped(
    ctx: &EmitCtx,
    sink: &mut dyn DisplaySink,
    run: &crate::block::InlineRun,
    width: usize,
    base_col: usize,
    row: &mut usize,
    col: &mut usize,
    cursor_screen: &mut Cursor3,
) {
    let (start, end) = run.range;
    let mut pos = start;
    while pos < end {
        if ctx.gb.at(pos) == Some(b'\n') {
            *row += 1;
            *col = base_col;
            pos += 1;
            continue;
        }
        let remaining = width.saturating_sub(col.saturating_sub(base_col));
        if remaining == 0 {
            *row += 1;
            *col = base_col;
            continue;
        }
        let (seg_end, _w) = wrap::find_wrap_point(ctx.gb, pos, end, remaining);
        if seg_end <= pos {
            *row += 1;
            *col = base_col;
            continue;
        }
        let mut p = pos;
        while p < seg_end {
            let (gw, gnext) = wrap::grapheme_width_next(ctx.gb, p, seg_end);
            if gnext <= p {
                break;
            }
            if ctx.in_selection(p) {
                sink.set_bg(ctx.theme.select_bg);
            }
            sink.move_to(*row as u16, *col as u16);
            sink.write_str(&ctx.gb.substr(p, gnext));
            if ctx.state.cursor == p || (ctx.state.cursor > p && ctx.state.cursor < gnext) {
                cursor_screen.row = *row;
                cursor_screen.col = *col;
            }
            *col += gw;
            p = gnext;
        }
        pos = seg_end;
        if pos < end {
            *row += 1;
            *col = base_col;
        }
    }
}

/// Emits a run's pretty-substituted text (owned, not backed by the
/// buffer), wrapping through `wrap::find_wrap_point_str`. The cursor can
/// only be placed at the run's start here, since a substituted glyph or
/// resolved string has no byte-for-byte correspondence to buffer offsets.
#[allow(clippy::too_many_arguments)]
fn emit_str_run_wrapped(
    ctx: &EmitCtx,
    sink: &mut dyn DisplaySink,
    run: &crate::block::InlineRun,
    text: &str,
    width: usize,
    base_col: usize,
    row: &mut usize,
    col: &mut usize,
    cursor_screen: &mut Cursor3,
) {
    if ctx.cursor_in(run.range) {
        cursor_screen.row = *row;
        cursor_screen.col = *col;
    }
    if text.is_empty() {
        return;
    }
    if ctx.in_selection(run.range.0) {
        sink.set_bg(ctx.theme.select_bg);
    }
    let mut pos = 0usize;
    while pos < text.len() {
        let remaining = width.saturating_sub(col.saturating_sub(base_col));
        if remaining == 0 {
            *row += 1;
            *col = base_col;
            continue;
        }
        let (seg_end, seg_w) = wrap::find_wrap_point_str(&text[pos..], remaining);
        if seg_end == 0 {
            *row += 1;
            *col = base_col;
            continue;
        }
        sink.move_to(*row as u16, *col as u16);
        sink.write_str(&text[pos..pos + seg_end]);
        *col += seg_w;
        pos += seg_end;
        if pos < text.len() {
            *row += 1;
            *col = base_col;
        }
    }
}

fn apply_style(sink: &mut dyn DisplaySink, theme: &Theme, style: Style, reveal: bool) {
    sink.reset_attrs();
    if reveal {
        sink.set_dim(true);
        return;
    }
    if style.contains(Style::BOLD) {
        sink.set_bold(true);
    }
    if style.contains(Style::ITALIC) {
        sink.set_italic(true);
    }
    if style.contains(Style::STRIKE) {
        sink.set_strikethrough(true);
    }
    if style.contains(Style::CODE) {
        sink.set_bg(theme.code_bg);
    }
    if style.contains(Style::MARK) {
        sink.set_bg(theme.mark_bg);
    }
    sink.set_fg(theme.fg);
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
