use super::*;

fn highlighter() -> SyntectHighlighter {
    SyntectHighlighter::default()
}

#[test]
fn highlight_known_rust_code_has_color_escapes() {
    let mut h = highlighter();
    let out = h.highlight("fn main() {\n    println!(\"hello\");\n}\n", Some("rust"));
    assert!(out.contains("\x1b[38;2;"), "rust code should carry color escapes");
}

#[test]
fn highlight_unknown_language_no_panic() {
    let mut h = highlighter();
    let out = h.highlight("some random text\nmore text\n", Some("nosuchlanguage"));
    assert!(out.contains("some random text"));
}

#[test]
fn highlight_empty_code_yields_empty() {
    let mut h = highlighter();
    assert_eq!(h.highlight("", Some("rust")), "");
}

#[test]
fn highlight_none_language_is_plain() {
    let mut h = highlighter();
    let out = h.highlight("plain text\n", None);
    assert!(out.contains("plain text"));
}

#[test]
fn highlight_invalid_theme_falls_back() {
    let mut h = SyntectHighlighter::new("nonexistent-theme");
    let out = h.highlight("fn main() {}\n", Some("rust"));
    assert!(out.contains("fn main"));
}

#[test]
fn highlight_source_bytes_preserved_verbatim() {
    let mut h = highlighter();
    let code = "line one\nline two\n";
    let out = h.highlight(code, Some("rust"));
    assert!(out.contains("line one"));
    assert!(out.contains("line two"));
}

#[test]
fn highlight_non_ascii_code_no_panic() {
    let mut h = highlighter();
    let code = "// Arrow → and ellipsis …\nlet s = \"héllo wörld\";\n";
    let out = h.highlight(code, Some("rust"));
    assert!(out.contains('→'));
    assert!(out.contains("héllo"));
}

#[test]
fn highlight_python_code_no_panic() {
    let mut h = highlighter();
    let out = h.highlight("def hello():\n    print(\"world\")\n", Some("python"));
    assert!(out.contains("hello"));
}

#[test]
fn resolve_comment_color_base16_ocean() {
    let themes = ThemeSet::load_defaults();
    let theme = themes
        .themes
        .get("base16-ocean.dark")
        .expect("base16-ocean.dark must be a built-in syntect theme");
    let color = resolve_comment_color(theme).expect("base16-ocean.dark should have a comment color");
    assert_eq!((color.r, color.g, color.b), (101, 115, 126));
}

#[test]
fn comment_gets_forced_italic_escape() {
    let mut h = highlighter();
    let out = h.highlight("// this is a comment\n", Some("rust"));
    assert!(out.contains(";3m") || out.contains("3m"), "comment should carry an italic SGR code");
}

#[test]
fn oversized_input_skips_highlighting() {
    let mut h = highlighter();
    let big = "x".repeat(600 * 1024);
    let out = h.highlight(&big, Some("rust"));
    assert_eq!(out, big);
}
