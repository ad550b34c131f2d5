use super::*;
use crate::block::BlockCache;
use crate::gap::GapBuffer;
use crate::sink::{Capabilities, UnderlineStyle};
use std::path::{Path, PathBuf};

#[derive(Default)]
struct RecordingSink {
    writes: Vec<String>,
    last_move: Option<(u16, u16)>,
    shown_cursor: Option<(u16, u16)>,
}

impl DisplaySink for RecordingSink {
    fn caps(&self) -> Capabilities {
        Capabilities::default()
    }
    fn move_to(&mut self, row: u16, col: u16) {
        self.last_move = Some((row, col));
    }
    fn set_fg(&mut self, _: Rgb) {}
    fn set_bg(&mut self, _: Rgb) {}
    fn set_bold(&mut self, _: bool) {}
    fn set_italic(&mut self, _: bool) {}
    fn set_dim(&mut self, _: bool) {}
    fn set_strikethrough(&mut self, _: bool) {}
    fn reset_attrs(&mut self) {}
    fn set_underline(&mut self, _: UnderlineStyle) {}
    fn set_underline_color(&mut self, _: Rgb) {}
    fn clear_underline(&mut self) {}
    fn write_str(&mut self, s: &str) {
        self.writes.push(s.to_string());
    }
    fn write_char(&mut self, c: char) {
        self.writes.push(c.to_string());
    }
    fn write_scaled(&mut self, s: &str, _: u8) {
        self.writes.push(s.to_string());
    }
    fn write_scaled_frac(&mut self, s: &str, _: u8, _: u32, _: u32) {
        self.writes.push(s.to_string());
    }
    fn sync_begin(&mut self) {}
    fn sync_end(&mut self) {}
    fn flush(&mut self) {}
    fn show_cursor_at(&mut self, row: u16, col: u16) {
        self.shown_cursor = Some((row, col));
    }
}

struct NoImages;
impl ImageSink for NoImages {
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
    fn image_resolve_path(&self, raw: &str, base_dir: &Path) -> Result<PathBuf, crate::error::ImageResolveError> {
        Ok(base_dir.join(raw))
    }
}

struct NoMath;
impl MathSink for NoMath {
    fn tex_render(&mut self, _: &str, _: bool) -> Option<crate::sink::TexSketch> {
        None
    }
}

struct PassthroughHighlighter;
impl HighlightSink for PassthroughHighlighter {
    fn highlight(&mut self, code: &str, _: Option<&str>) -> String {
        code.to_string()
    }
}

fn gb(s: &str) -> GapBuffer {
    GapBuffer::from_str(s)
}

#[test]
fn compute_layout_centers_wide_area() {
    let layout = compute_layout(100, 30, 90);
    assert_eq!(layout.text_width, 70);
    assert!(layout.left_margin >= 10);
}

#[test]
fn compute_layout_uses_fixed_margin_when_narrow() {
    let layout = compute_layout(60, 30, 60);
    assert_eq!(layout.text_width, 52);
}

#[test]
fn clamp_scroll_keeps_cursor_within_band() {
    let scroll = clamp_scroll(0, 50, 20, 100);
    assert!(scroll <= 50);
    assert!(scroll + 20 > 50);
}

#[test]
fn clamp_scroll_never_exceeds_total_minus_height() {
    let scroll = clamp_scroll(0, 5, 20, 10);
    assert_eq!(scroll, 0);
}

#[test]
fn split_header_text_fits_on_one_line() {
    let (l1, l2) = split_header_text("short", 40);
    assert_eq!(l1, "short");
    assert!(l2.is_none());
}

#[test]
fn split_header_text_breaks_near_middle() {
    let (l1, l2) = split_header_text("a long header that needs two lines total", 20);
    assert!(l2.is_some());
    assert!(l1.len() <= 20);
    assert!(l2.unwrap().len() <= 20);
}

fn render_doc(src: &str, cursor: usize) -> (RecordingSink, CursorPos) {
    let b = gb(src);
    let mut cache = BlockCache::new();
    cache.ensure(&b, 40, 20);
    let layout = compute_layout(50, 24, 50);
    let state = RenderState { cursor, selection: None, raw_reveal: false };
    let theme = Theme::default();
    let mut sink = RecordingSink::default();
    let mut hl = PassthroughHighlighter;
    let mut images = NoImages;
    let mut math = NoMath;
    let pos = render(&b, &cache, layout, 0, &state, &theme, &mut sink, &mut hl, &mut images, &mut math);
    (sink, pos)
}

#[test]
fn render_paragraph_writes_text() {
    let (sink, _) = render_doc("hello world", 0);
    let joined: String = sink.writes.concat();
    assert!(joined.contains('h'));
}

#[test]
fn render_hr_writes_box_drawing() {
    let (sink, _) = render_doc("---\n", 0);
    assert!(sink.writes.iter().any(|w| w.contains('─')));
}

#[test]
fn render_header_applies_scale() {
    let (sink, _) = render_doc("# Title\n", 0);
    assert!(sink.writes.iter().any(|w| w.contains("Title")));
}

#[test]
fn render_code_block_passes_through_highlighter() {
    let (sink, _) = render_doc("```rs\nfn f() {}\n```\n", 0);
    assert!(sink.writes.iter().any(|w| w.contains("fn f")));
}

#[test]
fn render_table_emits_borders() {
    let (sink, _) = render_doc("| a | b |\n|---|---|\n| 1 | 2 |\n", 0);
    assert!(sink.writes.iter().any(|w| w.contains('┌')));
    assert!(sink.writes.iter().any(|w| w.contains('┘')));
}

#[test]
fn render_records_cursor_position() {
    let (_, pos) = render_doc("hello world", 3);
    assert!(pos.col > 0 || pos.row > 0);
}

#[test]
fn render_list_item_renders_bullet() {
    let (sink, _) = render_doc("- one\n", 0);
    assert!(sink.writes.iter().any(|w| w.contains('•')));
}

#[test]
fn render_task_item_renders_checkbox() {
    let (sink, _) = render_doc("- [x] done\n", 0);
    assert!(sink.writes.iter().any(|w| w.contains('☑')));
}

#[test]
fn render_blockquote_renders_bar_prefix() {
    let (sink, _) = render_doc("> quoted\n", 0);
    assert!(sink.writes.iter().any(|w| w.contains('┃')));
}

#[test]
fn render_link_shows_label_not_raw_markup() {
    let (sink, _) = render_doc("see [text](http://example.com) now", 0);
    let joined: String = sink.writes.concat();
    assert!(joined.contains("text"));
    assert!(!joined.contains("http://example.com"));
}

#[test]
fn render_emoji_shows_resolved_glyph() {
    let (sink, _) = render_doc("so :fire: hot", 0);
    let joined: String = sink.writes.concat();
    assert!(joined.contains('🔥'));
    assert!(!joined.contains(":fire:"));
}

#[test]
fn render_table_raw_reveal_shows_source_when_cursor_inside() {
    let b = gb("| a | b |\n|---|---|\n| 1 | 2 |\n");
    let mut cache = BlockCache::new();
    cache.ensure(&b, 40, 20);
    let layout = compute_layout(50, 24, 50);
    let state = RenderState { cursor: 2, selection: None, raw_reveal: true };
    let theme = Theme::default();
    let mut sink = RecordingSink::default();
    let mut hl = PassthroughHighlighter;
    let mut images = NoImages;
    let mut math = NoMath;
    render(&b, &cache, layout, 0, &state, &theme, &mut sink, &mut hl, &mut images, &mut math);
    let joined: String = sink.writes.concat();
    assert!(joined.contains('|'));
    assert!(!sink.writes.iter().any(|w| w.contains('┌')));
}

#[test]
fn render_header_trims_heading_id_suffix() {
    let (sink, _) = render_doc("# Title {#custom-id}\n", 0);
    let joined: String = sink.writes.concat();
    assert!(joined.contains("Title"));
    assert!(!joined.contains("{#custom-id}"));
}
