use super::*;
use crate::gap::GapBuffer;

fn gb(s: &str) -> GapBuffer {
    GapBuffer::from_str(s)
}

///S1: auto-continue an unordered list.
#[test]
fn s1_auto_continue_unordered_list() {
    let mut b = gb("- one");
    let cursor = auto_continue_on_enter(&mut b, 5);
    assert_eq!(b.to_string_lossy(), "- one\n- ");
    assert_eq!(cursor, 8);
}

///S2: Enter on an empty list item ends the list.
#[test]
fn s2_end_list_by_enter_on_empty_item() {
    let mut b = gb("- \n");
    let cursor = auto_continue_on_enter(&mut b, 2);
    assert_eq!(b.to_string_lossy(), "\n\n");
    assert_eq!(cursor, 1);
}

///: a second Enter press on the now-blank line doesn't
/// re-trigger continuation (idempotence).
#[test]
fn empty_item_ends_list_after_exactly_one_press() {
    let mut b = gb("- \n");
    auto_continue_on_enter(&mut b, 2);
    assert!(rec::check_list(&b, 0).is_none());
}

///S4: ordered list continuation renumbers.
#[test]
fn s4_ordered_list_continuation_renumbers() {
    let mut b = gb("1. a");
    let cursor = auto_continue_on_enter(&mut b, 4);
    assert_eq!(b.to_string_lossy(), "1. a\n2. ");
    assert_eq!(cursor, 8);
}

#[test]
fn blockquote_continues_with_same_nesting() {
    let mut b = gb(">> quoted");
    let cursor = auto_continue_on_enter(&mut b, 9);
    assert_eq!(b.to_string_lossy(), ">> quoted\n>> ");
    assert_eq!(cursor, 13);
}

#[test]
fn task_continuation_preserves_box() {
    let mut b = gb("- [x] done");
    let cursor = auto_continue_on_enter(&mut b, 11);
    assert_eq!(b.to_string_lossy(), "- [x] done\n- [x] ");
    assert_eq!(cursor, 17);
}

#[test]
fn plain_paragraph_enter_is_just_a_newline() {
    let mut b = gb("plain text");
    let cursor = auto_continue_on_enter(&mut b, 11);
    assert_eq!(b.to_string_lossy(), "plain text\n");
    assert_eq!(cursor, 11);
}

///S3: smart backspace deletes the entire `**hi**` span.
#[test]
fn s3_smart_backspace_on_inline_bold() {
    let mut b = gb("before **hi** after");
    let cursor = smart_backspace(&mut b, 13);
    assert_eq!(b.to_string_lossy(), "before  after");
    assert_eq!(cursor, 7);
}

#[test]
fn smart_backspace_deletes_link() {
    let mut b = gb("see [text](url) now");
    let cursor = smart_backspace(&mut b, 15);
    assert_eq!(b.to_string_lossy(), "see now");
    assert_eq!(cursor, 4);
}

#[test]
fn smart_backspace_deletes_footnote_ref() {
    let mut b = gb("note[^1] more");
    let cursor = smart_backspace(&mut b, 8);
    assert_eq!(b.to_string_lossy(), "note more");
    assert_eq!(cursor, 4);
}

#[test]
fn smart_backspace_deletes_inline_math() {
    let mut b = gb("val $x^2$ end");
    let cursor = smart_backspace(&mut b, 9);
    assert_eq!(b.to_string_lossy(), "val end");
    assert_eq!(cursor, 4);
}

#[test]
fn smart_backspace_deletes_autotypography_artifact() {
    let mut b = gb("Acme(tm)");
    let cursor = smart_backspace(&mut b, 8);
    assert_eq!(b.to_string_lossy(), "Acme");
    assert_eq!(cursor, 4);
}

#[test]
fn smart_backspace_falls_back_to_one_grapheme() {
    let mut b = gb("hello");
    let cursor = smart_backspace(&mut b, 5);
    assert_eq!(b.to_string_lossy(), "hell");
    assert_eq!(cursor, 4);
}

#[test]
fn smart_backspace_at_zero_is_noop() {
    let mut b = gb("x");
    let cursor = smart_backspace(&mut b, 0);
    assert_eq!(b.to_string_lossy(), "x");
    assert_eq!(cursor, 0);
}

#[test]
fn auto_newline_after_link_completion() {
    let mut b = gb("see [text](url)");
    let new_cursor = auto_newline_after(&mut b, 15, ')');
    assert_eq!(new_cursor, Some(16));
    assert_eq!(b.to_string_lossy(), "see [text](url)\n");
}

#[test]
fn auto_newline_suppressed_when_not_at_end_of_construct() {
    let mut b = gb("see [text](url) trailing");
    let new_cursor = auto_newline_after(&mut b, 15, ')');
    assert_eq!(new_cursor, None);
}

#[test]
fn auto_newline_after_closing_code_fence() {
    let mut b = gb("```\ncode\n```");
    let new_cursor = auto_newline_after(&mut b, 12, '`');
    assert_eq!(new_cursor, Some(13));
}

#[test]
fn auto_newline_after_hr_completion() {
    let mut b = gb("---");
    let new_cursor = auto_newline_after(&mut b, 3, '-');
    assert_eq!(new_cursor, Some(4));
}

#[test]
fn auto_footnote_definition_inserts_with_separator_first_time() {
    let mut b = gb("see [^1] here");
    let result = auto_footnote_definition(&mut b, 8);
    assert!(result.is_some());
    assert!(b.to_string_lossy().ends_with("---\n[^1]: "));
}

#[test]
fn auto_footnote_definition_skips_separator_when_def_exists() {
    let mut b = gb("see [^1] and [^2]\n\n[^1]: first\n");
    let result = auto_footnote_definition(&mut b, 18);
    assert!(result.is_some());
    let text = b.to_string_lossy();
    assert!(text.ends_with("[^2]: "));
    assert!(!text.contains("---\n[^2]"));
}

#[test]
fn auto_footnote_definition_noop_when_already_defined() {
    let mut b = gb("see [^1]\n\n[^1]: def\n");
    let result = auto_footnote_definition(&mut b, 8);
    assert!(result.is_none());
}

#[test]
fn delete_element_removes_whole_link() {
    let mut b = gb("a [text](url) b");
    let cursor = delete_element(&mut b, 3);
    assert_eq!(b.to_string_lossy(), "a b");
    assert_eq!(cursor, 2);
}

#[test]
fn delete_element_falls_back_to_grapheme() {
    let mut b = gb("plain");
    let cursor = delete_element(&mut b, 0);
    assert_eq!(b.to_string_lossy(), "lain");
    assert_eq!(cursor, 0);
}
