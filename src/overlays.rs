//! TOC and search overlays: read-only dialogs over the block
//! cache / document bytes. Neither overlay mutates the gap buffer; both
//! resolve to a cursor position the engine applies on accept.

use crate::block::{BlockCache, BlockKind};
use crate::gap::GapBuffer;

fn block_text_end(gb: &GapBuffer, range: (usize, usize)) -> usize {
    if range.1 > range.0 && gb.at(range.1 - 1) == Some(b'\n') {
        range.1 - 1
    } else {
        range.1
    }
}

/// One header entry in the TOC, resolved fresh each time the query
/// changes.
#[derive(Clone, Debug, PartialEq)]
pub struct TocEntry {
    pub level: u8,
    pub text: String,
    pub content_start: usize,
}

/// Table-of-contents overlay state.
#[derive(Default)]
pub struct TocOverlay {
    pub query: String,
    pub entries: Vec<TocEntry>,
    pub selected: usize,
    pub scroll: usize,
}

impl TocOverlay {
    pub fn open(&mut self, gb: &GapBuffer, cache: &BlockCache) {
        self.query.clear();
        self.selected = 0;
        self.scroll = 0;
        self.recompute(gb, cache);
    }

    pub fn set_query(&mut self, gb: &GapBuffer, cache: &BlockCache, query: &str) {
        self.query = query.to_string();
        self.selected = 0;
        self.scroll = 0;
        self.recompute(gb, cache);
    }

    fn recompute(&mut self, gb: &GapBuffer, cache: &BlockCache) {
        let needle = self.query.to_lowercase();
        self.entries = cache
        .blocks
        .iter()
        .filter_map(|b| match &b.kind {
                BlockKind::Header { level, content_start,.. } => {
                    let end = block_text_end(gb, b.range);
                    let text = gb.substr(*content_start, end);
                    if needle.is_empty() || text.to_lowercase().contains(&needle) {
                        Some(TocEntry { level: *level, text, content_start: *content_start })
                    } else {
                        None
                    }
                }
                _ => None,
        })
        .collect();
    }

    pub fn move_down(&mut self) {
        if !self.entries.is_empty() {
            self.selected = (self.selected + 1).min(self.entries.len() - 1);
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Returns the byte offset to jump the editor cursor to, if any entry
    /// is selected.
    pub fn accept(&self) -> Option<usize> {
        self.entries.get(self.selected).map(|e| e.content_start)
    }
}

/// One search hit: the match's byte range, the line it occurs on (as a
/// `(line_start, line_end)` pair), and the match's offset within that
/// line for highlighting the snippet.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub match_range: (usize, usize),
    pub line_range: (usize, usize),
    pub offset_in_line: usize,
}

const MAX_SEARCH_RESULTS: usize = 500;

/// Search overlay state: case-insensitive substring
/// search over the whole document.
#[derive(Default)]
pub struct SearchOverlay {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub selected: usize,
    pub scroll: usize,
    pub truncated: bool,
}

impl SearchOverlay {
    pub fn open(&mut self) {
        self.query.clear();
        self.results.clear();
        self.selected = 0;
        self.scroll = 0;
        self.truncated = false;
    }

    pub fn set_query(&mut self, gb: &GapBuffer, query: &str) {
        self.query = query.to_string();
        self.selected = 0;
        self.scroll = 0;
        self.run_search(gb);
    }

    fn run_search(&mut self, gb: &GapBuffer) {
        self.results.clear();
        self.truncated = false;
        if self.query.is_empty() {
            return;
        }
        let text = gb.substr(0, gb.len());
        // `map[i]` is the byte offset in `text` the `i`-th byte of `lowered`
        // was produced from, so a byte offset `find` returns in `lowered`
        // maps back to a real char boundary in `text` even when
        // lowercasing changes a character's UTF-8 length.
        let (lowered, map): (String, Vec<usize>) = {
            let mut lowered = String::with_capacity(text.len());
            let mut map = Vec::with_capacity(text.len());
            for (byte_pos, ch) in text.char_indices() {
                for lc in ch.to_lowercase() {
                    for _ in 0..lc.len_utf8() {
                        map.push(byte_pos);
                    }
                    lowered.push(lc);
                }
            }
            map.push(text.len());
            (lowered, map)
        };
        let needle = self.query.to_lowercase();
        if needle.is_empty() {
            return;
        }

        let mut search_from = 0usize;
        while let Some(rel) = lowered[search_from..].find(&needle) {
            let match_lower_start = search_from + rel;
            let match_lower_end = match_lower_start + needle.len();
            let start = map[match_lower_start];
            let end = map[match_lower_end];

            let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
            let line_end = text[start..].find('\n').map(|i| start + i).unwrap_or(text.len());

            self.results.push(SearchResult {
                    match_range: (start, end),
                    line_range: (line_start, line_end),
                    offset_in_line: start - line_start,
            });

            if self.results.len() >= MAX_SEARCH_RESULTS {
                self.truncated = true;
                break;
            }
            search_from = match_lower_end.max(match_lower_start + 1);
        }
    }

    pub fn move_down(&mut self) {
        if !self.results.is_empty() {
            self.selected = (self.selected + 1).min(self.results.len() - 1);
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn accept(&self) -> Option<usize> {
        self.results.get(self.selected).map(|r| r.match_range.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gap::GapBuffer;

    fn gb(s: &str) -> GapBuffer {
        GapBuffer::from_str(s)
    }

    #[test]
    fn toc_lists_all_headers_with_empty_query() {
        let b = gb("# One\n\nbody\n\n## Two\n");
        let mut cache = BlockCache::new();
        cache.ensure(&b, 80, 24);
        let mut toc = TocOverlay::default();
        toc.open(&b, &cache);
        assert_eq!(toc.entries.len(), 2);
        assert_eq!(toc.entries[0].text, "One");
        assert_eq!(toc.entries[1].level, 2);
    }

    #[test]
    fn toc_filters_case_insensitively() {
        let b = gb("# Alpha\n\n# Beta\n");
        let mut cache = BlockCache::new();
        cache.ensure(&b, 80, 24);
        let mut toc = TocOverlay::default();
        toc.open(&b, &cache);
        toc.set_query(&b, &cache, "BET");
        assert_eq!(toc.entries.len(), 1);
        assert_eq!(toc.entries[0].text, "Beta");
    }

    #[test]
    fn toc_accept_returns_content_start() {
        let b = gb("# Title\nbody\n");
        let mut cache = BlockCache::new();
        cache.ensure(&b, 80, 24);
        let mut toc = TocOverlay::default();
        toc.open(&b, &cache);
        assert_eq!(toc.accept(), Some(2));
    }

    #[test]
    fn search_finds_case_insensitive_matches() {
        let b = gb("Hello World\nhello again\n");
        let mut s = SearchOverlay::default();
        s.open();
        s.set_query(&b, "hello");
        assert_eq!(s.results.len(), 2);
    }

    #[test]
    fn search_empty_query_yields_no_results() {
        let b = gb("some text\n");
        let mut s = SearchOverlay::default();
        s.open();
        s.set_query(&b, "");
        assert!(s.results.is_empty());
    }

    #[test]
    fn search_result_line_range_is_correct() {
        let b = gb("first line\nsecond needle line\nthird\n");
        let mut s = SearchOverlay::default();
        s.open();
        s.set_query(&b, "needle");
        assert_eq!(s.results.len(), 1);
        let r = &s.results[0];
        let text = b.substr(r.line_range.0, r.line_range.1);
        assert_eq!(text, "second needle line");
    }

    #[test]
    fn search_accept_returns_match_start() {
        let b = gb("abc needle xyz\n");
        let mut s = SearchOverlay::default();
        s.open();
        s.set_query(&b, "needle");
        assert_eq!(s.accept(), Some(4));
    }
}
