//! Display sink interface: the abstract surface the renderer draws
//! against, plus image/math/highlight collaborator traits.
//!
//! `highlight.rs`'s isolation rule generalizes here: the renderer never
//! imports `crossterm` or `ratatui` directly, only these traits. The
//! terminal-backed implementation lives in `term_sink.rs`.

use std::path::Path;

use crate::error::{ImageResolveError, PersistError};

/// An RGB color. Sinks that lack true color may round to their palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Underline decoration style, distinct from `set_underline_color`'s hue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnderlineStyle {
    Straight,
    Curly,
    Double,
    Dotted,
    Dashed,
}

/// Capabilities a concrete sink may or may not offer; the renderer
/// degrades emitters when a capability is missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub true_color: bool,
    pub styled_underline: bool,
    pub text_sizing: bool,
    pub images: bool,
}

/// The surface the renderer draws against. A frame is one
/// `sync_begin`/`sync_end` pair; `flush` commits it to the terminal.
pub trait DisplaySink {
    fn caps(&self) -> Capabilities;

    fn move_to(&mut self, row: u16, col: u16);

    fn set_fg(&mut self, rgb: Rgb);
    fn set_bg(&mut self, rgb: Rgb);
    fn set_bold(&mut self, on: bool);
    fn set_italic(&mut self, on: bool);
    fn set_dim(&mut self, on: bool);
    fn set_strikethrough(&mut self, on: bool);
    fn reset_attrs(&mut self);

    fn set_underline(&mut self, style: UnderlineStyle);
    fn set_underline_color(&mut self, rgb: Rgb);
    fn clear_underline(&mut self);

    fn write_str(&mut self, bytes: &str);
    fn write_char(&mut self, ch: char);
    /// Writes `bytes` at `scale`× the normal cell size (header glyphs).
    fn write_scaled(&mut self, bytes: &str, scale: u8);
    /// As `write_scaled`, but scaled by the fraction `num/denom` instead of
    /// an integer factor.
    fn write_scaled_frac(&mut self, bytes: &str, scale: u8, num: u32, denom: u32);

    fn sync_begin(&mut self);
    fn sync_end(&mut self);
    fn flush(&mut self);

    fn show_cursor_at(&mut self, row: u16, col: u16);
}

/// Image collaborator. The default `UnsupportedImageSink`
/// reports every query as unavailable so the renderer always has a
/// reserve-one-row fallback to take.
pub trait ImageSink {
    fn image_display_at(&mut self, path: &Path, row: u16, col: u16, max_cols: u16, max_rows: u16) -> bool;
    fn image_display_cropped(
        &mut self,
        path: &Path,
        row: u16,
        col: u16,
        max_cols: u16,
        crop_top: u16,
        visible: u16,
    ) -> bool;
    fn image_frame_start(&mut self);
    fn image_frame_end(&mut self);
    fn image_get_size(&mut self, path: &Path) -> Option<(u32, u32)>;
    fn image_calc_rows(&self, w: u32, h: u32, cols: u16, rows_hint: u16) -> u16;
    fn image_mask_region(&mut self, col: u16, row: u16, cols: u16, rows: u16, bg: Rgb);
    fn image_resolve_path(&self, raw: &str, base_dir: &Path) -> Result<std::path::PathBuf, ImageResolveError>;
}

/// A rendered TeX formula: a grid of opaque display cells. Each
/// cell's `data` is sink-specific (glyph text, or an escape-sequence blob).
pub struct TexSketch {
    pub width: usize,
    pub height: usize,
    pub rows: Vec<Vec<TexCell>>,
}

#[derive(Clone, Debug, Default)]
pub struct TexCell {
    pub data: String,
}

pub trait MathSink {
    fn tex_render(&mut self, latex: &str, block: bool) -> Option<TexSketch>;
}

/// Syntax highlighter collaborator. `highlight` returns a byte
/// string with opaque escape sequences interleaved with the code bytes;
/// the renderer passes these through literally while counting only
/// display cells.
pub trait HighlightSink {
    fn highlight(&mut self, code: &str, lang: Option<&str>) -> String;
}

/// Reports every image capability as unavailable. Named per the note in
/// `Cargo.toml`: image support is a phase-4 feature this crate doesn't
/// wire up yet.
#[derive(Default)]
pub struct UnsupportedImageSink;

impl ImageSink for UnsupportedImageSink {
    fn image_display_at(&mut self, _: &Path, _: u16, _: u16, _: u16, _: u16) -> bool {
        false
    }
    fn image_display_cropped(&mut self, _: &Path, _: u16, _: u16, _: u16, _: u16, _: u16) -> bool {
        false
    }
    fn image_frame_start(&mut self) {}
    fn image_frame_end(&mut self) {}
    fn image_get_size(&mut self, _: &Path) -> Option<(u32, u32)> {
        None
    }
    fn image_calc_rows(&self, _: u32, _: u32, _: u16, _: u16) -> u16 {
        1
    }
    fn image_mask_region(&mut self, _: u16, _: u16, _: u16, _: u16, _: Rgb) {}
    fn image_resolve_path(&self, raw: &str, base_dir: &Path) -> Result<std::path::PathBuf, ImageResolveError> {
        resolve_within_base_dir(raw, base_dir)
    }
}

/// Joins `raw` onto `base_dir` and rejects any `..` component that would
/// climb back out of it, mirroring `dawn_image.c`'s
/// `image_resolve_and_cache_to` failing closed on an unsafe path.
fn resolve_within_base_dir(raw: &str, base_dir: &Path) -> Result<std::path::PathBuf, ImageResolveError> {
    use std::path::Component;

    let mut depth: i64 = 0;
    for component in Path::new(raw).components() {
        match component {
            Component::ParentDir => depth -= 1,
            Component::Normal(_) => depth += 1,
            _ => {}
        }
        if depth < 0 {
            return Err(ImageResolveError::OutsideBaseDir(base_dir.join(raw)));
        }
    }
    Ok(base_dir.join(raw))
}

/// No TeX engine wired up; math blocks fall back to a one-row placeholder.
#[derive(Default)]
pub struct UnsupportedMathSink;

impl MathSink for UnsupportedMathSink {
    fn tex_render(&mut self, _latex: &str, _block: bool) -> Option<TexSketch> {
        None
    }
}

/// Key modifiers, bitset-like but kept as plain bools: a key event rarely
/// carries more than one or two at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct KeyMods {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// Decoded input event: arrows/navigation get named variants so the
/// engine never matches on raw escape sequences; everything else arrives
/// as a literal control byte or char.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Esc,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    MouseScrollUp,
    MouseScrollDown,
    MouseClick { row: u16, col: u16 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyMods,
}

/// Input collaborator. `read_key` blocks up to the implementation's
/// own frame timeout and returns `None` on timeout (the frame loop then
/// runs pending background jobs and renders anyway).
pub trait InputSource {
    fn read_key(&mut self) -> std::io::Result<Option<KeyEvent>>;
}

/// Monotonic + wall clock collaborator. Kept as a trait so tests
/// can supply a fake clock instead of depending on real elapsed time.
pub trait TimeSource {
    fn monotonic_secs(&self) -> f64;
    fn local_timestamp(&self) -> String;
}

/// System clock-backed `TimeSource`, the default collaborator `main.rs`
/// wires up.
#[derive(Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn monotonic_secs(&self) -> f64 {
        use std::time::Instant;
        static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
        let start = START.get_or_init(Instant::now);
        start.elapsed().as_secs_f64()
    }

    fn local_timestamp(&self) -> String {
        use std::time::{SystemTime, UNIX_EPOCH};
        let secs = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        secs.to_string()
    }
}

/// Clipboard collaborator. The no-op default simply round-trips
/// through an in-memory buffer so copy/paste within a single run still
/// works even with no platform clipboard wired up.
pub trait Clipboard {
    fn copy(&mut self, bytes: &str);
    fn paste(&mut self) -> String;
}

#[derive(Default)]
pub struct InMemoryClipboard {
    buf: String,
}

impl Clipboard for InMemoryClipboard {
    fn copy(&mut self, bytes: &str) {
        self.buf = bytes.to_string();
    }
    fn paste(&mut self) -> String {
        self.buf.clone()
    }
}

/// Persistence collaborator: the core never touches a filesystem
/// API directly, only this trait. The shipped impl lives in `persist.rs`.
pub trait Persistence {
    fn read_file(&self, path: &std::path::Path) -> Result<Vec<u8>, PersistError>;
    fn write_file(&self, path: &std::path::Path, bytes: &[u8]) -> Result<(), PersistError>;
    fn list_dir(&self, path: &std::path::Path) -> std::io::Result<Vec<std::path::PathBuf>>;
    fn mkdir_p(&self, path: &std::path::Path) -> std::io::Result<()>;
    fn get_mtime(&self, path: &std::path::Path) -> std::io::Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_clipboard_round_trips() {
        let mut clip = InMemoryClipboard::default();
        assert_eq!(clip.paste(), "");
        clip.copy("hello");
        assert_eq!(clip.paste(), "hello");
    }

    #[test]
    fn system_clock_monotonic_is_non_decreasing() {
        let clock = SystemClock;
        let a = clock.monotonic_secs();
        let b = clock.monotonic_secs();
        assert!(b >= a);
    }
}
