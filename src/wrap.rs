//! Word-wrap service: grapheme-cluster-aware wrap points over a
//! `GapBuffer` range.
//!
//! Wrapping never splits a grapheme cluster, measures display width with
//! east-asian-wide/variation-selector awareness via `unicode-width`, and
//! breaks preferentially after a space, secondarily after a hyphen. When a
//! line has no break opportunity and still overflows, a single grapheme
//! starts a new line — no hyphenation is inserted.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::gap::GapBuffer;

/// Returns the display width of the grapheme cluster starting at `pos`
/// (clamped to `end`), and the byte position right after it.
///
/// A grapheme is measured as the `unicode-width` width of its full
/// cluster text; non-printable clusters (e.g. a bare combining mark
/// fallback, control characters) measure 0.
pub fn grapheme_width_next(gb: &GapBuffer, pos: usize, end: usize) -> (usize, usize) {
    if pos >= end {
        return (0, pos);
    }
    let chunk = gb.substr(pos, end);
    let Some(g) = chunk.graphemes(true).next() else {
        return (0, end);
    };
    let next = pos + g.len();
    let width = if g.chars().all(|c| c.is_control()) { 0 } else { g.width() };
    (width, next)
}

/// Total display width of `[start, end)`.
pub fn display_width(gb: &GapBuffer, start: usize, end: usize) -> usize {
    let mut pos = start;
    let mut total = 0;
    while pos < end {
        let (w, next) = grapheme_width_next(gb, pos, end);
        total += w;
        if next <= pos {
            break;
        }
        pos = next;
    }
    total
}

/// Skips leading space/tab bytes starting at `pos`, up to `end`. Used to
/// trim continuation lines before measuring their wrap segment.
pub fn leading_space_skip(gb: &GapBuffer, pos: usize, end: usize) -> usize {
    let mut i = pos;
    while i < end && matches!(gb.at(i), Some(b' ') | Some(b'\t')) {
        i += 1;
    }
    i
}

/// Finds the best wrap point within `[start, end)` for a target display
/// `width`. Returns `(break_pos, actual_width)` where `break_pos` is the
/// byte offset the next line should start at (i.e. the end of this
/// wrapped segment) and `actual_width` is the display width consumed by
/// `[start, break_pos)`.
///
/// Break preference: after a space; secondarily after a hyphen; if
/// neither exists before the width limit is exceeded, one grapheme
/// starts a new wrapped line (forced single-grapheme break).
pub fn find_wrap_point(gb: &GapBuffer, start: usize, end: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    let mut pos = start;
    let mut consumed = 0usize;
    let mut last_space_break: Option<(usize, usize)> = None;
    let mut last_hyphen_break: Option<(usize, usize)> = None;

    loop {
        if pos >= end {
            return (pos, consumed);
        }
        let (w, next) = grapheme_width_next(gb, pos, end);
        if next <= pos {
            return (pos, consumed);
        }
        if consumed + w > width {
            if let Some((bp, bw)) = last_space_break {
                return (bp, bw);
            }
            if let Some((bp, bw)) = last_hyphen_break {
                return (bp, bw);
            }
            if consumed == 0 {
                // Forced single-grapheme break: the grapheme itself exceeds
                // the available width but must still occupy a row.
                return (next, w);
            }
            return (pos, consumed);
        }
        let grapheme_text = gb.substr(pos, next);
        consumed += w;
        pos = next;
        if grapheme_text == " " {
            last_space_break = Some((pos, consumed));
        } else if grapheme_text == "-" {
            last_hyphen_break = Some((pos, consumed));
        }
    }
}

/// As `find_wrap_point`, but over an owned string rather than a gap-buffer
/// range. Used for pretty-substituted inline content (resolved link text,
/// emoji glyphs, rendered math) that has no corresponding byte range in the
/// buffer to wrap over directly. Same break preference.
pub fn find_wrap_point_str(text: &str, width: usize) -> (usize, usize) {
    let width = width.max(1);
    let mut pos = 0usize;
    let mut consumed = 0usize;
    let mut last_space_break: Option<(usize, usize)> = None;
    let mut last_hyphen_break: Option<(usize, usize)> = None;

    for g in text.graphemes(true) {
        let w = if g.chars().all(|c| c.is_control()) { 0 } else { g.width() };
        if consumed + w > width {
            if let Some((bp, bw)) = last_space_break {
                return (bp, bw);
            }
            if let Some((bp, bw)) = last_hyphen_break {
                return (bp, bw);
            }
            if consumed == 0 {
                return (pos + g.len(), w);
            }
            return (pos, consumed);
        }
        consumed += w;
        pos += g.len();
        if g == " " {
            last_space_break = Some((pos, consumed));
        } else if g == "-" {
            last_hyphen_break = Some((pos, consumed));
        }
    }
    (pos, consumed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gb(s: &str) -> GapBuffer {
        GapBuffer::from_str(s)
    }

    #[test]
    fn wraps_at_space_boundary() {
        let b = gb("hello world");
        let (pos, w) = find_wrap_point(&b, 0, b.len(), 7);
        assert_eq!(b.substr(0, pos), "hello ");
        assert_eq!(w, 6);
    }

    #[test]
    fn short_line_returns_whole_range() {
        let b = gb("hi");
        let (pos, w) = find_wrap_point(&b, 0, b.len(), 80);
        assert_eq!(pos, b.len());
        assert_eq!(w, 2);
    }

    #[test]
    fn no_break_opportunity_forces_single_grapheme() {
        let b = gb("abcdefgh");
        let (pos, w) = find_wrap_point(&b, 0, b.len(), 3);
        // No space/hyphen anywhere: falls back to forced single-grapheme break.
        assert_eq!(pos, 1);
        assert_eq!(w, 1);
    }

    #[test]
    fn hyphen_is_secondary_break_preference() {
        let b = gb("well-formed");
        let (pos, _) = find_wrap_point(&b, 0, b.len(), 6);
        assert_eq!(b.substr(0, pos), "well-");
    }

    #[test]
    fn width_le_1_wraps_one_grapheme_per_row() {
        let b = gb("abc");
        let (pos, w) = find_wrap_point(&b, 0, b.len(), 0);
        assert_eq!(w, 1);
        assert_eq!(pos, 1);
    }

    #[test]
    fn wide_grapheme_occupies_full_row_when_narrower_than_it() {
        let b = gb("ab");
        let wide = gb("日");
        let (_pos, w) = find_wrap_point(&wide, 0, wide.len(), 1);
        assert_eq!(w, 2, "wide CJK glyph should report width 2 even over budget");
        let _ = b;
    }

    #[test]
    fn display_width_counts_cjk_as_double() {
        let b = gb("日本語");
        assert_eq!(display_width(&b, 0, b.len()), 6);
    }

    #[test]
    fn display_width_emoji_does_not_panic() {
        let b = gb("a🎉b");
        let w = display_width(&b, 0, b.len());
        assert!(w >= 3);
    }

    #[test]
    fn leading_space_skip_trims_spaces_only() {
        let b = gb(" text");
        let skipped = leading_space_skip(&b, 0, b.len());
        assert_eq!(b.substr(skipped, b.len()), "text");
    }

    #[test]
    fn find_wrap_point_str_wraps_at_space_boundary() {
        let (pos, w) = find_wrap_point_str("hello world", 7);
        assert_eq!(&"hello world"[..pos], "hello ");
        assert_eq!(w, 6);
    }

    #[test]
    fn find_wrap_point_str_forces_single_grapheme_with_no_break() {
        let (pos, w) = find_wrap_point_str("abcdefgh", 3);
        assert_eq!(pos, 1);
        assert_eq!(w, 1);
    }

    #[test]
    fn grapheme_width_next_handles_combining_marks_as_one_cluster() {
        let b = gb("e\u{0301}x"); // é (decomposed) + x
        let (_w, next) = grapheme_width_next(&b, 0, b.len());
        assert_eq!(b.substr(0, next), "e\u{0301}");
    }
}
