use super::*;
use crate::gap::GapBuffer;

fn gb(s: &str) -> GapBuffer {
    GapBuffer::from_str(s)
}

#[test]
fn block_tiling_invariant() {
    let b = gb("# H\n\npara text\n\n- item\n");
    let blocks = parse(&b);
    assert_eq!(blocks[0].range.0, 0);
    assert_eq!(blocks.last().unwrap().range.1, b.len());
    for w in blocks.windows(2) {
        assert_eq!(w[0].range.1, w[1].range.0, "blocks must tile without gaps");
    }
}

#[test]
fn header_then_paragraph_tiling() {
    let b = gb("# H\n\npara");
    let blocks = parse(&b);
    assert_eq!(blocks.len(), 2);
    assert!(matches!(blocks[0].kind, BlockKind::Header { level: 1, .. }));
    assert!(matches!(blocks[1].kind, BlockKind::Paragraph { .. }));
    assert_eq!(blocks[0].range, (0, 4));
    assert_eq!(blocks[1].range, (4, 9));
}

#[test]
fn vrow_monotonicity() {
    let b = gb("# H\n\npara one\npara two\n\n- item one\n- item two\n");
    let mut cache = BlockCache::new();
    cache.ensure(&b, 40, 20);
    for w in cache.blocks.windows(2) {
        assert!(w[0].vrow_start + w[0].vrow_count <= w[1].vrow_start);
    }
}

#[test]
fn paragraph_run_tiling() {
    let b = gb("hello **bold** world");
    let blocks = parse(&b);
    let BlockKind::Paragraph { runs } = &blocks[0].kind else { panic!("expected paragraph") };
    assert_eq!(runs[0].range.0, 0);
    let mut prev_end = runs[0].range.0;
    for r in runs {
        assert_eq!(r.range.0, prev_end);
        prev_end = r.range.1;
    }
    assert_eq!(prev_end, blocks[0].range.1);
}

#[test]
fn paragraph_recognizes_bold_run_style() {
    let b = gb("a **bold** b");
    let blocks = parse(&b);
    let BlockKind::Paragraph { runs } = &blocks[0].kind else { panic!() };
    let bold_run = runs.iter().find(|r| r.style.contains(Style::BOLD)).expect("bold run");
    assert_eq!(b.substr(bold_run.range.0, bold_run.range.1), "bold");
}

#[test]
fn paragraph_link_run() {
    let b = gb("see [text](http://x) now");
    let blocks = parse(&b);
    let BlockKind::Paragraph { runs } = &blocks[0].kind else { panic!() };
    let link = runs.iter().find(|r| matches!(r.kind, InlineRunKind::Link { .. })).expect("link run");
    assert_eq!(b.substr(link.range.0, link.range.1), "[text](http://x)");
}

#[test]
fn paragraph_recognizes_html_entity_run() {
    let b = gb("a &amp; b");
    let blocks = parse(&b);
    let BlockKind::Paragraph { runs } = &blocks[0].kind else { panic!() };
    let entity = runs.iter().find_map(|r| match &r.kind {
            InlineRunKind::Entity { resolved } => Some(resolved.clone()),
            _ => None,
    });
    assert_eq!(entity.as_deref(), Some("&"));
}

#[test]
fn paragraph_recognizes_backslash_escape_run() {
    let b = gb("a \\*b\\* c");
    let blocks = parse(&b);
    let BlockKind::Paragraph { runs } = &blocks[0].kind else { panic!() };
    let escapes: Vec<char> = runs
    .iter()
    .filter_map(|r| match &r.kind {
            InlineRunKind::Escape { ch } => Some(*ch),
            _ => None,
    })
    .collect();
    assert_eq!(escapes, vec!['*', '*']);
}

#[test]
fn unclosed_delimiter_stays_literal() {
    let b = gb("a *b c");
    let blocks = parse(&b);
    let BlockKind::Paragraph { runs } = &blocks[0].kind else { panic!() };
    assert!(runs.iter().all(|r| !r.style.contains(Style::ITALIC)));
}

#[test]
fn code_block_parses_as_single_block() {
    let b = gb("```rs\nfn f(){}\n```\nafter");
    let blocks = parse(&b);
    assert!(matches!(blocks[0].kind, BlockKind::Code { .. }));
    assert_eq!(blocks[0].range, (0, 19));
}

#[test]
fn blockquote_spans_consecutive_lines() {
    let b = gb("> one\n> two\npara\n");
    let blocks = parse(&b);
    assert!(matches!(blocks[0].kind, BlockKind::Blockquote { .. }));
    assert_eq!(b.substr(blocks[0].range.0, blocks[0].range.1), "> one\n> two\n");
}

#[test]
fn footnote_def_continues_until_blank_line() {
    let b = gb("[^1]: def line one\ncontinued\n\npara\n");
    let blocks = parse(&b);
    assert!(matches!(blocks[0].kind, BlockKind::FootnoteDef { .. }));
    assert_eq!(b.substr(blocks[0].range.0, blocks[0].range.1), "[^1]: def line one\ncontinued\n");
}

#[test]
fn list_item_is_one_line() {
    let b = gb("- one\n- two\n");
    let blocks = parse(&b);
    assert_eq!(blocks.len(), 2);
    assert!(matches!(blocks[0].kind, BlockKind::ListItem { .. }));
    assert_eq!(blocks[0].range, (0, 6));
}

#[test]
fn task_item_detects_checked_state() {
    let b = gb("- [x] done\n");
    let blocks = parse(&b);
    let BlockKind::ListItem { task_state, .. } = &blocks[0].kind else { panic!() };
    assert_eq!(*task_state, TaskState::Checked);
}

#[test]
fn table_block_row_count_includes_header() {
    let b = gb("| a | b |\n|---|---:|\n| 1 | 22 |\n");
    let blocks = parse(&b);
    let BlockKind::Table { col_count, row_count, .. } = &blocks[0].kind else { panic!() };
    assert_eq!(*col_count, 2);
    assert_eq!(*row_count, 2);
    assert_eq!(blocks[0].range.1, b.len());
}

#[test]
fn table_vrow_count_matches_spec_example() {
    let b = gb("| a | b |\n|---|---|\n| 1 | 22 |\n");
    let mut cache = BlockCache::new();
    cache.ensure(&b, 40, 20);
    assert_eq!(cache.blocks[0].vrow_count, 5);
}

#[test]
fn block_at_pos_resolves_eof_to_last_block() {
    let b = gb("# H\n\npara");
    let mut cache = BlockCache::new();
    cache.ensure(&b, 40, 20);
    let found = cache.block_at_pos(b.len()).unwrap();
    assert_eq!(found.range, cache.blocks.last().unwrap().range);
}

#[test]
fn block_at_vrow_finds_correct_block() {
    let b = gb("# H\n\npara\n\n- a\n- b\n");
    let mut cache = BlockCache::new();
    cache.ensure(&b, 40, 20);
    let last = cache.blocks.last().unwrap();
    let found = cache.block_at_vrow(last.vrow_start).unwrap();
    assert_eq!(found.range, last.range);
}

#[test]
fn cache_invalidation_forces_reparse() {
    let b = gb("para one\n");
    let mut cache = BlockCache::new();
    cache.ensure(&b, 40, 20);
    assert!(cache.is_valid());
    cache.invalidate();
    assert!(!cache.is_valid());
    cache.ensure(&b, 40, 20);
    assert!(cache.is_valid());
}

#[test]
fn empty_document_has_no_blocks() {
    let b = gb("");
    let blocks = parse(&b);
    assert!(blocks.is_empty());
}

#[test]
fn style_stack_depth_limit_falls_back_to_literal() {
    // Nine nested emphasis opens exceed MAX_STYLE_DEPTH (8); the 9th stays literal.
    let src = "*a *b *c *d *e *f *g *h *i deep*i*h*g*f*e*d*c*b*a".replace(' ', "");
    let b = gb(&src);
    // Doesn't panic and still tiles the block.
    let blocks = parse(&b);
    let BlockKind::Paragraph { runs } = &blocks[0].kind else { panic!() };
    let mut prev_end = blocks[0].range.0;
    for r in runs {
        assert_eq!(r.range.0, prev_end);
        prev_end = r.range.1;
    }
}
