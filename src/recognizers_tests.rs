use super::*;
use crate::gap::GapBuffer;

fn gb(s: &str) -> GapBuffer {
    GapBuffer::from_str(s)
}

#[test]
fn header_levels_1_through_6() {
    for level in 1..=6u8 {
        let src = format!("{} Title\n", "#".repeat(level as usize));
        let b = gb(&src);
        assert_eq!(check_header(&b, 0), Some(level));
    }
}

#[test]
fn header_requires_space_after_hashes() {
    let b = gb("#NoSpace\n");
    assert_eq!(check_header(&b, 0), None);
}

#[test]
fn header_seven_hashes_is_not_a_header() {
    let b = gb("####### too many\n");
    assert_eq!(check_header(&b, 0), None);
}

#[test]
fn header_content_start_after_marker() {
    let b = gb("## Hi\n");
    let (level, start) = check_header_content(&b, 0).unwrap();
    assert_eq!(level, 2);
    assert_eq!(b.substr(start, 5), "Hi");
}

#[test]
fn hr_dashes_stars_underscores() {
    for rule in ["---", "***", "___", "- - -", "-----"] {
        let b = gb(rule);
        assert!(check_hr(&b, 0).is_some(), "expected HR for {rule:?}");
    }
}

#[test]
fn hr_rejects_mixed_chars() {
    let b = gb("-*-");
    assert_eq!(check_hr(&b, 0), None);
}

#[test]
fn hr_rejects_too_short() {
    let b = gb("--");
    assert_eq!(check_hr(&b, 0), None);
}

#[test]
fn blockquote_single_level() {
    let b = gb("> quoted\n");
    let (level, start) = check_blockquote(&b, 0).unwrap();
    assert_eq!(level, 1);
    assert_eq!(b.substr(start, start + 6), "quoted");
}

#[test]
fn blockquote_nested() {
    let b = gb(">> nested\n");
    let (level, _) = check_blockquote(&b, 0).unwrap();
    assert_eq!(level, 2);
}

#[test]
fn list_unordered_bullet() {
    let b = gb("- item\n");
    let (ordered, indent, start) = check_list(&b, 0).unwrap();
    assert!(!ordered);
    assert_eq!(indent, 0);
    assert_eq!(b.substr(start, start + 4), "item");
}

#[test]
fn list_ordered_with_paren() {
    let b = gb("1) item\n");
    let (ordered, _, _) = check_list(&b, 0).unwrap();
    assert!(ordered);
}

#[test]
fn list_requires_space_after_marker() {
    let b = gb("-item\n");
    assert_eq!(check_list(&b, 0), None);
}

#[test]
fn task_unchecked_and_checked() {
    let b = gb("- [ ] todo\n- [x] done\n");
    let (state, _, start) = check_task(&b, 0).unwrap();
    assert_eq!(state, 1);
    assert_eq!(b.substr(start, start + 4), "todo");

    let second_line = b.substr(0, b.len()).find("- [x]").unwrap();
    let (state2, _, _) = check_task(&b, second_line).unwrap();
    assert_eq!(state2, 2);
}

#[test]
fn footnote_def_and_ref() {
    let b = gb("text [^1] more\n\n[^1]: definition\n");
    let ref_pos = 5;
    let (id, total) = check_footnote_ref(&b, ref_pos).unwrap();
    assert_eq!(b.substr(id.0, id.1), "1");
    assert_eq!(total, 4);

    let def_pos = b.substr(0, b.len()).find("[^1]:").unwrap();
    let (id2, content_start, _) = check_footnote_def(&b, def_pos).unwrap();
    assert_eq!(b.substr(id2.0, id2.1), "1");
    assert_eq!(b.substr(content_start, content_start + 10), "definition");
}

#[test]
fn link_basic() {
    let b = gb("[text](http://example.com) after");
    let (text, url, total) = check_link(&b, 0).unwrap();
    assert_eq!(b.substr(text.0, text.1), "text");
    assert_eq!(b.substr(url.0, url.1), "http://example.com");
    assert_eq!(total, "[text](http://example.com)".len());
}

#[test]
fn link_text_no_newline() {
    let b = gb("[line1\nline2](url)");
    assert_eq!(check_link(&b, 0), None);
}

#[test]
fn image_basic_with_dims() {
    let b = gb("![alt](pic.png){width=100 height=-50}");
    let m = check_image(&b, 0).unwrap();
    assert_eq!(b.substr(m.alt.0, m.alt.1), "alt");
    assert_eq!(b.substr(m.path.0, m.path.1), "pic.png");
    assert_eq!(m.width, Some(100));
    assert_eq!(m.height, Some(-50));
}

#[test]
fn image_percent_width() {
    let b = gb("![x](y.png){width=50%}");
    let m = check_image(&b, 0).unwrap();
    assert_eq!(m.width, Some(-50));
}

#[test]
fn inline_math_basic() {
    let b = gb("$x^2$ done");
    let (content, total) = check_inline_math(&b, 0).unwrap();
    assert_eq!(b.substr(content.0, content.1), "x^2");
    assert_eq!(total, 5);
}

#[test]
fn inline_math_does_not_cross_newline() {
    let b = gb("$a\nb$");
    assert_eq!(check_inline_math(&b, 0), None);
}

#[test]
fn inline_math_rejects_double_dollar() {
    let b = gb("$$block$$");
    assert_eq!(check_inline_math(&b, 0), None);
}

#[test]
fn block_math_full() {
    let b = gb("$$\nE=mc^2\n$$\nafter");
    let (content, total) = check_block_math_full(&b, 0).unwrap();
    assert_eq!(b.substr(content.0, content.1), "E=mc^2");
    assert_eq!(b.substr(0, total), "$$\nE=mc^2\n$$\n");
}

#[test]
fn block_math_unterminated_runs_to_eof() {
    let b = gb("$$\nforever");
    let (content, total) = check_block_math_full(&b, 0).unwrap();
    assert_eq!(total, b.len());
    assert_eq!(b.substr(content.0, content.1), "forever");
}

#[test]
fn code_block_basic() {
    let b = gb("```rust\nfn main() {}\n```\nafter");
    let (lang, content, total) = check_code_block(&b, 0).unwrap();
    assert_eq!(b.substr(lang.0, lang.1), "rust");
    assert_eq!(b.substr(content.0, content.1), "fn main() {}");
    assert_eq!(b.substr(0, total), "```rust\nfn main() {}\n```\n");
}

#[test]
fn code_block_unterminated_runs_to_eof() {
    let b = gb("```\nno closing fence");
    let (_, _, total) = check_code_block(&b, 0).unwrap();
    assert_eq!(total, b.len());
}

#[test]
fn code_block_first_match_wins_ignoring_fence_length() {
    // A stricter CommonMark matching-fence-length rule is not adopted.
    let b = gb("````\ncode\n```\nmore\n````\n");
    let (_, content, _) = check_code_block(&b, 0).unwrap();
    assert_eq!(b.substr(content.0, content.1), "code");
}

#[test]
fn autolink_url_and_email() {
    let b = gb("<https://example.com>");
    let (url, _, is_email) = check_autolink(&b, 0).unwrap();
    assert_eq!(b.substr(url.0, url.1), "https://example.com");
    assert!(!is_email);

    let b2 = gb("<user@example.com>");
    let (_, _, is_email2) = check_autolink(&b2, 0).unwrap();
    assert!(is_email2);
}

#[test]
fn emoji_known_and_unknown() {
    let b = gb(":fire: and:not_real:");
    let (glyph, _, total) = check_emoji(&b, 0).unwrap();
    assert_eq!(glyph, "🔥");
    assert_eq!(total, 6);

    let pos = b.substr(0, b.len()).find(":not_real:").unwrap();
    assert_eq!(check_emoji(&b, pos), None);
}

#[test]
fn entity_named_and_numeric() {
    let b = gb("&amp;&#65;&#x41;");
    let (s1, t1) = check_entity(&b, 0).unwrap();
    assert_eq!(s1, "&");
    assert_eq!(t1, 5);

    let (s2, _) = check_entity(&b, 5).unwrap();
    assert_eq!(s2, "A");

    let (s3, _) = check_entity(&b, 10).unwrap();
    assert_eq!(s3, "A");
}

#[test]
fn delim_matches_longest_first() {
    let b = gb("**bold**");
    let (style, len) = check_delim(&b, 0).unwrap();
    assert_eq!(style, Style::BOLD);
    assert_eq!(len, 2);
}

#[test]
fn escape_known_punctuation() {
    let b = gb("\\*literal\\*");
    let (c, total) = check_escape(&b, 0).unwrap();
    assert_eq!(c, '*');
    assert_eq!(total, 2);
}

#[test]
fn escape_rejects_non_punctuation() {
    let b = gb("\\a");
    assert_eq!(check_escape(&b, 0), None);
}

#[test]
fn table_full_detection_and_alignment() {
    let b = gb("| a | b |\n|---|---:|\n| 1 | 22 |\n");
    let (aligns, after) = check_table(&b, 0).unwrap();
    assert_eq!(aligns.len(), 2);
    assert_eq!(aligns[0], Align::Default);
    assert_eq!(aligns[1], Align::Right);
    assert!(b.substr(after, after + 1) == "|");
}

#[test]
fn parse_table_row_splits_cells() {
    let b = gb("| a | bb |");
    let cells = parse_table_row(&b, 0, b.len());
    assert_eq!(cells.len(), 2);
    assert_eq!(b.substr(cells[0].0, cells[0].1).trim(), "a");
    assert_eq!(b.substr(cells[1].0, cells[1].1).trim(), "bb");
}

#[test]
fn heading_id_inline() {
    let b = gb("{#my-id} rest");
    let (id, total) = check_heading_id(&b, 0).unwrap();
    assert_eq!(b.substr(id.0, id.1), "my-id");
    assert_eq!(total, 8);
}

#[test]
fn link_tried_before_footnote_ref_on_overlap() {
    // [^id](url) is parsed as a link, not a footnote ref followed by "(url)"
    //.
    let b = gb("[^id](url)");
    assert!(check_link(&b, 0).is_some());
}
