//! The `Engine`: owns the gap buffer, cursor/selection, block cache, undo
//! ring, and mode stack, and exposes the host-facing surface
//! (`Engine::new`, `frame`, `request_quit`, `load_document`, etc.).
//!
//! Collaborators (display sink, highlighter, image/math sinks, input,
//! clock, persistence) are never owned by the engine — `frame()` takes
//! them by reference each call, the way `render()` already does. This
//! keeps the engine itself free of `ratatui`/`crossterm`/`syntect`, same
//! isolation discipline as `render.rs` and `highlight.rs`.

use std::path::{Path, PathBuf};

use crate::block::BlockCache;
use crate::config::{Config, ThemeName};
use crate::edits;
use crate::gap::GapBuffer;
use crate::overlays::{SearchOverlay, TocOverlay};
use crate::persist;
use crate::render::{self, CursorPos, Layout, RenderState, Theme};
use crate::sink::{
    DisplaySink, HighlightSink, ImageSink, InputSource, KeyCode, KeyEvent, KeyMods, MathSink, Persistence, TimeSource,
};
use crate::undo::UndoStack;

/// Mode stack entries.
/// Only `Writing`/`Toc`/`Search`/`Help`/`Finished` carry engine-level
/// behavior here; the rest are present as structural stack slots for
/// screens layered on top of the core writing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Welcome,
    Writing,
    Timer,
    History,
    Help,
    TitleEdit,
    ImageEdit,
    Toc,
    Search,
    Finished,
}

pub struct Engine {
    pub gb: GapBuffer,
    pub cursor: usize,
    pub selecting: bool,
    pub sel_anchor: usize,
    pub scroll_y: usize,
    pub raw_reveal: bool,

    pub cache: BlockCache,
    pub undo: UndoStack,

    pub mode: Mode,
    pub prev_mode: Mode,
    pub toc: TocOverlay,
    pub search: SearchOverlay,

    pub theme: Theme,
    pub config: Config,

    pub path: Option<PathBuf>,
    pub title: Option<String>,
    pub dirty: bool,
    pub last_save_secs: f64,

    pub cols: u16,
    pub rows: u16,
    pub layout: Layout,

    quit: bool,
}

fn theme_for(name: ThemeName) -> Theme {
    match name {
        ThemeName::Dark => Theme::default(),
        ThemeName::Light => Theme {
            fg: crate::sink::Rgb(30, 30, 34),
            bg: crate::sink::Rgb(250, 250, 248),
            dim: crate::sink::Rgb(140, 140, 148),
            accent: crate::sink::Rgb(40, 90, 200),
            select_bg: crate::sink::Rgb(200, 215, 235),
            border: crate::sink::Rgb(180, 180, 186),
            code_bg: crate::sink::Rgb(235, 235, 230),
            mark_bg: crate::sink::Rgb(255, 240, 150),
        },
    }
}

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

/// Column (in chars) of `pos` within its line — used to keep up/down
/// cursor movement visually aligned.
fn column_of(gb: &GapBuffer, pos: usize) -> usize {
    let ls = line_start_of(gb, pos);
    gb.substr(ls, pos).chars().count()
}

/// Advances from a line's start by `col` chars, clamped to the line end.
fn advance_to_column(gb: &GapBuffer, line_start: usize, col: usize) -> usize {
    let le = line_end_of(gb, line_start);
    let mut p = line_start;
    for _ in 0..col {
        if p >= le {
            break;
        }
        let (_, clen) = gb.utf8_at(p);
        p += clen.max(1);
    }
    p.min(le)
}

impl Engine {
    /// `engine_init(theme)`.
    pub fn new(theme: ThemeName) -> Self {
        Engine {
            gb: GapBuffer::new(),
            cursor: 0,
            selecting: false,
            sel_anchor: 0,
            scroll_y: 0,
            raw_reveal: false,
            cache: BlockCache::new(),
            undo: UndoStack::new(),
            mode: Mode::Welcome,
            prev_mode: Mode::Welcome,
            toc: TocOverlay::default(),
            search: SearchOverlay::default(),
            theme: theme_for(theme),
            config: Config::default(),
            path: None,
            title: None,
            dirty: false,
            last_save_secs: 0.0,
            cols: 80,
            rows: 24,
            layout: render::compute_layout(80, 24, 80),
            quit: false,
        }
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn new_document(&mut self) {
        self.gb = GapBuffer::new();
        self.cursor = 0;
        self.sel_anchor = 0;
        self.selecting = false;
        self.path = None;
        self.title = None;
        self.dirty = false;
        self.cache.invalidate();
        self.undo = UndoStack::new();
        self.mode = Mode::Writing;
        self.prev_mode = Mode::Writing;
    }

    fn load_bytes(&mut self, raw: &str) {
        let normalized = persist::normalize_line_endings(raw);
        let fm = persist::strip_frontmatter(&normalized);
        self.title = fm.title;
        self.gb = GapBuffer::from_str(&normalized[fm.body_start..]);
        self.cursor = 0;
        self.sel_anchor = 0;
        self.selecting = false;
        self.cache.invalidate();
        self.undo = UndoStack::new();
        self.dirty = false;
    }

    /// `load_document(path)`: sets `self.path` so `save_document`
    /// later writes back to the same file.
    pub fn load_document(&mut self, persist: &dyn Persistence, path: &Path) -> std::io::Result<()> {
        let bytes = persist.read_file(path)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        self.load_bytes(&text);
        self.path = Some(path.to_path_buf());
        self.mode = Mode::Writing;
        self.prev_mode = Mode::Writing;
        Ok(())
    }

    /// `preview_document(path)`: loads content for display without
    /// binding `save_document` to it — saving a preview targets a new path.
    pub fn preview_document(&mut self, persist: &dyn Persistence, path: &Path) -> std::io::Result<()> {
        let bytes = persist.read_file(path)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        self.load_bytes(&text);
        self.path = None;
        self.mode = Mode::Writing;
        self.prev_mode = Mode::Writing;
        Ok(())
    }

    /// Writes the document back out, reattaching frontmatter. Returns
    /// `Ok(())` without writing when no path is known yet.
    pub fn save_document(&mut self, persist: &dyn Persistence, time: &dyn TimeSource) -> std::io::Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        let title = self.title.clone().unwrap_or_else(|| "Untitled".to_string());
        let date = time.local_timestamp();
        let frontmatter = persist::build_frontmatter(&title, "mdink", &date);
        let mut content = frontmatter.into_bytes();
        content.extend_from_slice(self.gb.to_bytes().as_slice());
        persist.write_file(&path, &content)?;
        self.dirty = false;
        self.last_save_secs = time.monotonic_secs();
        Ok(())
    }

    /// `update_size()`: re-derives the layout; the block cache
    /// re-parses lazily next frame once `cache.ensure` sees the new width.
    pub fn update_size(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.layout = render::compute_layout(cols as usize, rows as usize, (cols as usize).min(90));
    }

    pub fn push_mode(&mut self, mode: Mode) {
        self.prev_mode = self.mode;
        self.mode = mode;
    }

    pub fn pop_mode(&mut self) {
        std::mem::swap(&mut self.mode, &mut self.prev_mode);
    }

    fn snapshot(&mut self) {
        self.undo.save_snapshot(&self.gb.to_bytes(), self.cursor);
    }

    fn mutated(&mut self) {
        self.cache.invalidate();
        self.dirty = true;
    }

    fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.snapshot();
        self.gb.insert_str(self.cursor, text.as_bytes());
        self.cursor += text.len();
        self.mutated();
        if let Some(ch) = text.chars().last() {
            if let Some(new_cursor) = edits::auto_newline_after(&mut self.gb, self.cursor, ch) {
                self.cursor = new_cursor;
            } else if ch == ']' {
                if let Some(new_cursor) = edits::auto_footnote_definition(&mut self.gb, self.cursor) {
                    self.cursor = new_cursor;
                }
            }
        }
    }

    fn enter(&mut self) {
        self.snapshot();
        self.cursor = edits::auto_continue_on_enter(&mut self.gb, self.cursor);
        self.mutated();
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.snapshot();
        self.cursor = edits::smart_backspace(&mut self.gb, self.cursor);
        self.mutated();
    }

    fn delete_forward(&mut self) {
        if self.cursor >= self.gb.len() {
            return;
        }
        self.snapshot();
        edits::delete_element(&mut self.gb, self.cursor);
        self.mutated();
    }

    fn undo_step(&mut self) {
        if let Some((bytes, cursor)) = self.undo.undo() {
            let bytes = bytes.to_vec();
            self.gb.replace_all(&String::from_utf8_lossy(&bytes));
            self.cursor = cursor.min(self.gb.len());
            self.mutated();
        }
    }

    fn redo_step(&mut self) {
        if let Some((bytes, cursor)) = self.undo.redo() {
            let bytes = bytes.to_vec();
            self.gb.replace_all(&String::from_utf8_lossy(&bytes));
            self.cursor = cursor.min(self.gb.len());
            self.mutated();
        }
    }

    fn move_cursor(&mut self, code: KeyCode, extend_selection: bool) {
        let before = self.cursor;
        match code {
            KeyCode::Left => self.cursor = self.gb.utf8_prev(self.cursor),
            KeyCode::Right => {
                if self.cursor < self.gb.len() {
                    self.cursor = self.gb.utf8_next(self.cursor);
                }
            }
            KeyCode::Home => self.cursor = line_start_of(&self.gb, self.cursor),
            KeyCode::End => self.cursor = line_end_of(&self.gb, self.cursor),
            KeyCode::Up => {
                let col = column_of(&self.gb, self.cursor);
                let ls = line_start_of(&self.gb, self.cursor);
                if ls > 0 {
                    let prev_line_start = line_start_of(&self.gb, ls - 1);
                    self.cursor = advance_to_column(&self.gb, prev_line_start, col);
                }
            }
            KeyCode::Down => {
                let col = column_of(&self.gb, self.cursor);
                let le = line_end_of(&self.gb, self.cursor);
                if le < self.gb.len() {
                    let next_line_start = le + 1;
                    self.cursor = advance_to_column(&self.gb, next_line_start, col);
                }
            }
            KeyCode::PageUp => {
                for _ in 0..self.layout.text_height {
                    let ls = line_start_of(&self.gb, self.cursor);
                    if ls == 0 {
                        break;
                    }
                    self.cursor = line_start_of(&self.gb, ls - 1);
                }
            }
            KeyCode::PageDown => {
                for _ in 0..self.layout.text_height {
                    let le = line_end_of(&self.gb, self.cursor);
                    if le >= self.gb.len() {
                        break;
                    }
                    self.cursor = le + 1;
                }
            }
            _ => {}
        }
        if extend_selection {
            if !self.selecting {
                self.selecting = true;
                self.sel_anchor = before;
            }
        } else {
            self.selecting = false;
        }
    }

    fn selection_range(&self) -> Option<(usize, usize)> {
        if self.selecting && self.sel_anchor != self.cursor {
            Some((self.sel_anchor.min(self.cursor), self.sel_anchor.max(self.cursor)))
        } else {
            None
        }
    }

    fn delete_selection(&mut self) {
        if let Some((s, e)) = self.selection_range() {
            self.snapshot();
            self.gb.delete(s, e - s);
            self.cursor = s;
            self.selecting = false;
            self.mutated();
        }
    }

    fn handle_writing_key(&mut self, key: KeyEvent) {
        let ctrl = key.mods.ctrl;
        match key.code {
            KeyCode::Char('s') if ctrl => { /* handled by caller (needs collaborators) */ }
            KeyCode::Char('z') if ctrl => self.undo_step(),
            KeyCode::Char('y') if ctrl => self.redo_step(),
            KeyCode::Char('f') if ctrl => {
                self.search.open();
                self.push_mode(Mode::Search);
            }
            KeyCode::Char('t') if ctrl => {
                self.cache.ensure(&self.gb, self.layout.text_width, self.layout.text_height);
                self.toc.open(&self.gb, &self.cache);
                self.push_mode(Mode::Toc);
            }
            KeyCode::Char('r') if ctrl => self.raw_reveal = !self.raw_reveal,
            KeyCode::Char(c) => {
                if self.selection_range().is_some() {
                    self.delete_selection();
                }
                let mut buf = [0u8; 4];
                self.insert_text(c.encode_utf8(&mut buf));
            }
            KeyCode::Tab => self.insert_text("    "),
            KeyCode::Enter => {
                if self.selection_range().is_some() {
                    self.delete_selection();
                }
                self.enter();
            }
            KeyCode::Backspace => {
                if self.selection_range().is_some() {
                    self.delete_selection();
                } else {
                    self.backspace();
                }
            }
            KeyCode::Delete => {
                if self.selection_range().is_some() {
                    self.delete_selection();
                } else {
                    self.delete_forward();
                }
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Home | KeyCode::End => {
                self.move_cursor(key.code, key.mods.shift);
            }
            KeyCode::PageUp | KeyCode::PageDown => self.move_cursor(key.code, false),
            KeyCode::Esc => self.selecting = false,
            _ => {}
        }
    }

    fn handle_toc_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.pop_mode(),
            KeyCode::Up => self.toc.move_up(),
            KeyCode::Down => self.toc.move_down(),
            KeyCode::Enter => {
                if let Some(pos) = self.toc.accept() {
                    self.cursor = pos;
                    self.selecting = false;
                }
                self.pop_mode();
            }
            KeyCode::Backspace => {
                let mut q = self.toc.query.clone();
                q.pop();
                self.toc.set_query(&self.gb, &self.cache, &q);
            }
            KeyCode::Char(c) => {
                let mut q = self.toc.query.clone();
                q.push(c);
                self.toc.set_query(&self.gb, &self.cache, &q);
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.pop_mode(),
            KeyCode::Up => self.search.move_up(),
            KeyCode::Down => self.search.move_down(),
            KeyCode::Enter => {
                if let Some(pos) = self.search.accept() {
                    self.cursor = pos;
                    self.selecting = false;
                }
                self.pop_mode();
            }
            KeyCode::Backspace => {
                let mut q = self.search.query.clone();
                q.pop();
                self.search.set_query(&self.gb, &q);
            }
            KeyCode::Char(c) => {
                let mut q = self.search.query.clone();
                q.push(c);
                self.search.set_query(&self.gb, &q);
            }
            _ => {}
        }
    }

    /// Dispatches one key event according to the current mode.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.mods.ctrl && key.code == KeyCode::Char('c') {
            self.request_quit();
            return;
        }
        match self.mode {
            Mode::Welcome => self.mode = Mode::Writing,
            Mode::Writing => self.handle_writing_key(key),
            Mode::Toc => self.handle_toc_key(key),
            Mode::Search => self.handle_search_key(key),
            Mode::Help => {
                if matches!(key.code, KeyCode::Esc) {
                    self.pop_mode();
                }
            }
            Mode::Finished => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                    self.request_quit();
                }
            }
            Mode::Timer | Mode::History | Mode::TitleEdit | Mode::ImageEdit => {
                if matches!(key.code, KeyCode::Esc) {
                    self.pop_mode();
                }
            }
        }
    }

    /// Renders the current state to `sink` via `render::render` and
    /// returns the final cursor position. Separated from
    /// `frame()` so tests can call it without an `InputSource`.
    #[allow(clippy::too_many_arguments)]
    pub fn render_frame(
        &mut self,
        sink: &mut dyn DisplaySink,
        highlighter: &mut dyn HighlightSink,
        images: &mut dyn ImageSink,
        math: &mut dyn MathSink,
    ) -> CursorPos {
        self.cache.ensure(&self.gb, self.layout.text_width, self.layout.text_height);
        let cursor_vrow = self
        .cache
        .block_at_pos(self.cursor)
        .map(|b| b.vrow_start + self.cache.cursor_vrow_in_block(&self.gb, b, self.cursor))
        .unwrap_or(0);
        self.scroll_y = render::clamp_scroll(self.scroll_y, cursor_vrow, self.layout.text_height, self.cache.total_vrows.max(1));

        let state = RenderState { cursor: self.cursor, selection: self.selection_range(), raw_reveal: self.raw_reveal };
        render::render(&self.gb, &self.cache, self.layout, self.scroll_y, &state, &self.theme, sink, highlighter, images, math)
    }

    /// One `frame()` step: reads one key (if any), mutates, renders.
    /// Returns `false` once quit has been requested.
    #[allow(clippy::too_many_arguments)]
    pub fn frame(
        &mut self,
        input: &mut dyn InputSource,
        time: &dyn TimeSource,
        persist: &dyn Persistence,
        sink: &mut dyn DisplaySink,
        highlighter: &mut dyn HighlightSink,
        images: &mut dyn ImageSink,
        math: &mut dyn MathSink,
    ) -> std::io::Result<bool> {
        if let Some(key) = input.read_key()? {
            if self.mode == Mode::Writing && key.mods.ctrl && key.code == KeyCode::Char('s') {
                self.save_document(persist, time)?;
            } else {
                self.handle_key(key);
            }
        }

        if self.dirty && !self.gb.is_empty() {
            let idle = time.monotonic_secs() - self.last_save_secs;
            if idle >= self.config.autosave_interval_secs as f64 {
                self.save_document(persist, time)?;
            }
        }

        self.render_frame(sink, highlighter, images, math);
        Ok(!self.quit)
    }
}

#[allow(dead_code)]
fn key(code: KeyCode) -> KeyEvent {
    KeyEvent { code, mods: KeyMods::default() }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
