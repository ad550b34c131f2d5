//! Markdown style set: the inline style bitset, delimiter table, and the
//! static lookup tables (emoji shortcodes, HTML entities) recognizers
//! consult. This module holds no parsing logic — only the vocabulary the
//! parser and renderer share.

use bitflags::bitflags;

bitflags! {
    /// Inline styles plus header levels (H1..H6, mutually exclusive among
    /// themselves, line-level rather than inline). A line's *line style*
    /// carries at most one header bit; an inline position's style carries
    /// any combination of the non-header bits.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Style: u16 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const CODE = 1 << 2;
        const STRIKE = 1 << 3;
        const MARK = 1 << 4;
        const SUB = 1 << 5;
        const SUP = 1 << 6;
        const H1 = 1 << 7;
        const H2 = 1 << 8;
        const H3 = 1 << 9;
        const H4 = 1 << 10;
        const H5 = 1 << 11;
        const H6 = 1 << 12;
    }
}

impl Style {
    /// Returns the header level (1..6) if any header bit is set.
    pub fn header_level(self) -> Option<u8> {
        const LEVELS: [(Style, u8); 6] = [
            (Style::H1, 1),
            (Style::H2, 2),
            (Style::H3, 3),
            (Style::H4, 4),
            (Style::H5, 5),
            (Style::H6, 6),
        ];
        LEVELS.iter().find(|(bit, _)| self.contains(*bit)).map(|&(_, l)| l)
    }

    /// Builds the header-level style bit for a level in `1..=6`.
    pub fn for_header_level(level: u8) -> Style {
        match level {
            1 => Style::H1,
            2 => Style::H2,
            3 => Style::H3,
            4 => Style::H4,
            5 => Style::H5,
            _ => Style::H6,
        }
    }
}

/// A recognized inline delimiter and the style it toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelimSpec {
    pub text: &'static str,
    pub len: usize,
    pub style: Style,
}

/// Delimiter table in fixed recognition order. Two-byte delimiters are
/// listed before their one-byte prefixes would otherwise shadow them
/// (`**` before `*`).
pub const DELIMITERS: &[DelimSpec] = &[
    DelimSpec { text: "**", len: 2, style: Style::BOLD },
    DelimSpec { text: "~~", len: 2, style: Style::STRIKE },
    DelimSpec { text: "==", len: 2, style: Style::MARK },
    DelimSpec { text: "*", len: 1, style: Style::ITALIC },
    DelimSpec { text: "_", len: 1, style: Style::ITALIC },
    DelimSpec { text: "`", len: 1, style: Style::CODE },
];

/// Maximum nesting depth of the inline style stack.
pub const MAX_STYLE_DEPTH: usize = 8;

/// Bytes `check_delim` may scan backward from the cursor to locate an
/// enclosing element during smart edits.
pub const SMART_EDIT_SCAN_BACK: usize = 100;

/// Maximum undo ring size.
pub const MAX_UNDO: usize = 100;

/// A small static table of emoji shortcodes. Not exhaustive — this is the
/// vocabulary the renderer's `:name:` recognizer resolves against; unknown
/// codes pass through literally perpub const EMOJI_TABLE: &[(&str, &str)] = &[
("smile", "🙂"),
("grin", "😁"),
("joy", "😂"),
("heart", "❤️"),
("thumbsup", "👍"),
("thumbsdown", "👎"),
("fire", "🔥"),
("rocket", "🚀"),
("tada", "🎉"),
("eyes", "👀"),
("thinking", "🤔"),
("warning", "⚠️"),
("check", "✅"),
("x", "❌"),
("bulb", "💡"),
("star", "⭐"),
("wave", "👋"),
("100", "💯"),
("clap", "👏"),
("pencil", "📝"),
];

/// Resolves an emoji shortcode (without the surrounding colons) to its glyph.
pub fn resolve_emoji(name: &str) -> Option<&'static str> {
    EMOJI_TABLE
    .iter()
    .find(|(code, _)| *code == name)
    .map(|(_, glyph)| *glyph)
}

/// Named HTML entities this dialect recognizes.
pub const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{00A0}"),
    ("copy", "\u{00A9}"),
    ("reg", "\u{00AE}"),
    ("trade", "\u{2122}"),
    ("mdash", "\u{2014}"),
    ("ndash", "\u{2013}"),
    ("hellip", "\u{2026}"),
];

/// Resolves a named entity (without `&`/`;`) to its UTF-8 expansion.
pub fn resolve_named_entity(name: &str) -> Option<&'static str> {
    NAMED_ENTITIES
    .iter()
    .find(|(n, _)| *n == name)
    .map(|(_, v)| *v)
}

/// CommonMark-escapable ASCII punctuation for `\x` backslash escapes.
pub fn is_escapable_punct(c: char) -> bool {
    matches!(
        c,
        '!' | '"'
        | '#'
        | '$'
        | '%'
        | '&'
        | '\''
        | '('
        | ')'
        | '*'
        | '+'
        | ','
        | '-'
        | '.'
        | '/'
        | ':'
        | ';'
        | '<'
        | '='
        | '>'
        | '?'
        | '@'
        | '['
        | '\\'
        | ']'
        | '^'
        | '_'
        | '`'
        | '{'
        | '|'
        | '}'
        | '~'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_level_roundtrip() {
        for level in 1..=6u8 {
            let style = Style::for_header_level(level);
            assert_eq!(style.header_level(), Some(level));
        }
    }

    #[test]
    fn non_header_style_has_no_level() {
        assert_eq!(Style::BOLD.header_level(), None);
    }

    #[test]
    fn delimiters_are_ordered_longest_first_per_prefix() {
        // "**" must be found before "*" would match its first byte.
        let idx_bold = DELIMITERS.iter().position(|d| d.text == "**").unwrap();
        let idx_italic = DELIMITERS.iter().position(|d| d.text == "*").unwrap();
        assert!(idx_bold < idx_italic);
    }

    #[test]
    fn emoji_resolves_known_code() {
        assert_eq!(resolve_emoji("fire"), Some("🔥"));
    }

    #[test]
    fn emoji_unknown_code_passes_through() {
        assert_eq!(resolve_emoji("not-a-real-emoji"), None);
    }

    #[test]
    fn entity_resolves_amp() {
        assert_eq!(resolve_named_entity("amp"), Some("&"));
    }
}
