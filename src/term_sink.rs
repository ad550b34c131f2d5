//! Terminal-backed `DisplaySink`: issues crossterm commands
//! against any `io::Write`. `ratatui`'s bundled `crossterm` re-export is
//! used rather than a direct dependency, matching how the rest of the
//! crate reaches the terminal.

use std::io::{self, Write};

use ratatui::crossterm::style::{Attribute, Color as CtColor, SetAttribute, SetForegroundColor, SetBackgroundColor};
use ratatui::crossterm::{cursor, queue, style, terminal};

use crate::sink::{Capabilities, DisplaySink, Rgb, UnderlineStyle};

fn to_ct_color(rgb: Rgb) -> CtColor {
    CtColor::Rgb { r: rgb.0, g: rgb.1, b: rgb.2 }
}

/// Writes directly to `W` (normally `io::Stdout`), queuing commands and
/// relying on the caller to `flush()` once per frame.
pub struct TermSink<W: Write> {
    out: W,
    caps: Capabilities,
}

impl<W: Write> TermSink<W> {
    pub fn new(out: W, caps: Capabilities) -> Self {
        TermSink { out, caps }
    }
}

impl<W: Write> DisplaySink for TermSink<W> {
    fn caps(&self) -> Capabilities {
        self.caps
    }

    fn move_to(&mut self, row: u16, col: u16) {
        let _ = queue!(self.out, cursor::MoveTo(col, row));
    }

    fn set_fg(&mut self, rgb: Rgb) {
        let _ = queue!(self.out, SetForegroundColor(to_ct_color(rgb)));
    }

    fn set_bg(&mut self, rgb: Rgb) {
        let _ = queue!(self.out, SetBackgroundColor(to_ct_color(rgb)));
    }

    fn set_bold(&mut self, on: bool) {
        let attr = if on { Attribute::Bold } else { Attribute::NormalIntensity };
        let _ = queue!(self.out, SetAttribute(attr));
    }

    fn set_italic(&mut self, on: bool) {
        let attr = if on { Attribute::Italic } else { Attribute::NoItalic };
        let _ = queue!(self.out, SetAttribute(attr));
    }

    fn set_dim(&mut self, on: bool) {
        let attr = if on { Attribute::Dim } else { Attribute::NormalIntensity };
        let _ = queue!(self.out, SetAttribute(attr));
    }

    fn set_strikethrough(&mut self, on: bool) {
        let attr = if on { Attribute::CrossedOut } else { Attribute::NotCrossedOut };
        let _ = queue!(self.out, SetAttribute(attr));
    }

    fn reset_attrs(&mut self) {
        let _ = queue!(self.out, SetAttribute(Attribute::Reset));
    }

    fn set_underline(&mut self, style: UnderlineStyle) {
        if !self.caps.styled_underline {
            let _ = queue!(self.out, SetAttribute(Attribute::Underlined));
            return;
        }
        // Kitty-style underline escapes (CSI 4:n m) aren't modeled by
        // crossterm's `Attribute`; emit them directly as raw bytes.
        let n = match style {
            UnderlineStyle::Straight => 1,
            UnderlineStyle::Double => 2,
            UnderlineStyle::Curly => 3,
            UnderlineStyle::Dotted => 4,
            UnderlineStyle::Dashed => 5,
        };
        let _ = write!(self.out, "\x1b[4:{n}m");
    }

    fn set_underline_color(&mut self, rgb: Rgb) {
        let _ = write!(self.out, "\x1b[58:2::{}:{}:{}m", rgb.0, rgb.1, rgb.2);
    }

    fn clear_underline(&mut self) {
        let _ = queue!(self.out, SetAttribute(Attribute::NoUnderline));
    }

    fn write_str(&mut self, bytes: &str) {
        let _ = queue!(self.out, style::Print(bytes));
    }

    fn write_char(&mut self, ch: char) {
        let _ = queue!(self.out, style::Print(ch));
    }

    fn write_scaled(&mut self, bytes: &str, scale: u8) {
        if !self.caps.text_sizing || scale <= 1 {
            let _ = queue!(self.out, style::Print(bytes));
            return;
        }
        let _ = write!(self.out, "\x1b]66;s={scale};{bytes}\x1b\\");
    }

    fn write_scaled_frac(&mut self, bytes: &str, scale: u8, num: u32, denom: u32) {
        if !self.caps.text_sizing || scale <= 1 {
            let _ = queue!(self.out, style::Print(bytes));
            return;
        }
        let _ = write!(self.out, "\x1b]66;s={scale}:n={num}:d={denom};{bytes}\x1b\\");
    }

    fn sync_begin(&mut self) {
        let _ = write!(self.out, "\x1b[?2026h");
    }

    fn sync_end(&mut self) {
        let _ = write!(self.out, "\x1b[?2026l");
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn show_cursor_at(&mut self, row: u16, col: u16) {
        let _ = queue!(self.out, cursor::MoveTo(col, row), cursor::Show);
    }
}

/// Probes the actual terminal for the capabilitiesqueries,
/// falling back conservatively when detection fails.
pub fn detect_capabilities() -> Capabilities {
    Capabilities {
        true_color: std::env::var("COLORTERM").is_ok_and(|v| v == "truecolor" || v == "24bit"),
        styled_underline: false,
        text_sizing: false,
        images: false,
    }
}

pub fn terminal_size() -> io::Result<(u16, u16)> {
    terminal::size()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_str_queues_bytes() {
        let mut buf = Vec::new();
        {
            let mut sink = TermSink::new(&mut buf, Capabilities::default());
            sink.write_str("hello");
            sink.flush();
        }
        assert!(buf.windows(5).any(|w| w == b"hello"));
    }

    #[test]
    fn move_to_emits_cursor_sequence() {
        let mut buf = Vec::new();
        {
            let mut sink = TermSink::new(&mut buf, Capabilities::default());
            sink.move_to(2, 3);
            sink.flush();
        }
        assert!(!buf.is_empty());
    }

    #[test]
    fn underline_without_capability_falls_back_to_plain() {
        let mut buf = Vec::new();
        {
            let mut sink = TermSink::new(&mut buf, Capabilities::default());
            sink.set_underline(UnderlineStyle::Curly);
            sink.flush();
        }
        let s = String::from_utf8_lossy(&buf);
        assert!(!s.contains("4:3m"));
    }
}
