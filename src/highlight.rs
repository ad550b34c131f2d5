//! Syntax highlighting bridge: wraps syntect behind the `HighlightSink`
//! trait.
//!
//! This is a **leaf module** — it never imports from other editor modules
//! beyond `sink`. The renderer interacts with syntax highlighting
//! exclusively through `HighlightSink::highlight()`, which returns a byte
//! string of code interleaved with opaque ANSI escape sequences; the
//! renderer passes these through literally while counting only display
//! cells. This isolation means `syntect` types never leak into `block.rs`
//! or `render.rs`.

use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style as SyntectStyle, ThemeSet};
use syntect::parsing::{Scope, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::sink::HighlightSink;

/// Wraps syntect's syntax and theme sets, loaded once at startup.
///
/// `SyntaxSet` and `ThemeSet` are expensive to construct (~50ms each).
/// This struct ensures they are loaded once and reused for every code block.
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

/// Default syntect theme used for code highlighting.
const DEFAULT_THEME: &str = "base16-ocean.dark";

impl SyntectHighlighter {
    pub fn new(theme_name: impl Into<String>) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme_name.into(),
        }
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl HighlightSink for SyntectHighlighter {
    /// Highlights `code`, returning ANSI-escaped bytes with one trailing
    /// reset per input line and no trailing newline added beyond what
    /// `code` already carries.
    ///
    /// - `lang` is matched via `find_syntax_by_token` (e.g. "rust", "py").
    /// Falls back to plain text if the language is unknown or absent.
    fn highlight(&mut self, code: &str, lang: Option<&str>) -> String {
        // Oniguruma (syntect's regex engine) can exhaust memory on
        // pathological input, surfacing as a panic rather than an Err.
        const MAX_HIGHLIGHT_BYTES: usize = 512 * 1024;
        if code.len() > MAX_HIGHLIGHT_BYTES {
            return code.to_string();
        }

        let syntax = match lang {
            Some(l) if !l.is_empty() => self
            .syntax_set
            .find_syntax_by_token(l)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text()),
            _ => self.syntax_set.find_syntax_plain_text(),
        };

        let Some(theme) = self
        .theme_set
        .themes
        .get(&self.theme_name)
        .or_else(|| self.theme_set.themes.get(DEFAULT_THEME))
        else {
            return code.to_string();
        };

        let comment_color = resolve_comment_color(theme);
        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut out = String::with_capacity(code.len() * 2);

        for line in LinesWithEndings::from(code) {
            let Ok(ranges) = highlighter.highlight_line(line, &self.syntax_set) else {
                out.push_str(line);
                continue;
            };
            for (style, text) in ranges {
                let is_comment = comment_color.is_some_and(|cc| style.foreground == cc);
                push_ansi_span(&mut out, text, style, is_comment);
            }
        }

        out
    }
}

/// Resolves the foreground color that the given theme assigns to the
/// `comment` scope. Returns `None` if the theme doesn't distinguish it
/// from the default foreground.
fn resolve_comment_color(
    theme: &syntect::highlighting::Theme,
) -> Option<syntect::highlighting::Color> {
    let comment_scope = Scope::new("comment").ok()?;
    let highlighter = syntect::highlighting::Highlighter::new(theme);
    let style = highlighter.style_for_stack(&[comment_scope]);
    let default_fg = theme
    .settings
    .foreground
    .unwrap_or(syntect::highlighting::Color::BLACK);
    if style.foreground == default_fg {
        None
    } else {
        Some(style.foreground)
    }
}

/// Appends `text` wrapped in a true-color SGR sequence (foreground +
/// bold/italic/underline) followed by a reset. `is_comment` forces the
/// italic slot even when the theme doesn't mark the scope italic, so
/// comments read visually distinct regardless of theme.
fn push_ansi_span(out: &mut String, text: &str, style: SyntectStyle, is_comment: bool) {
    if text.is_empty() {
        return;
    }
    let mut sgr = vec![format!(
            "38;2;{};{};{}",
            style.foreground.r, style.foreground.g, style.foreground.b
    )];
    if style.font_style.contains(FontStyle::BOLD) {
        sgr.push("1".to_string());
    }
    if style.font_style.contains(FontStyle::ITALIC) || is_comment {
        sgr.push("3".to_string());
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        sgr.push("4".to_string());
    }
    out.push_str("\x1b[");
    out.push_str(&sgr.join(";"));
    out.push('m');
    out.push_str(text);
    out.push_str("\x1b[0m");
}

#[cfg(test)]
#[path = "highlight_tests.rs"]
mod tests;
