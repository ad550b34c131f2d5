//! Gap buffer: byte-addressable text storage optimized for locality of edits.
//!
//! The gap buffer keeps an unused "gap" region at the most recent edit
//! position. Insertions and deletions at that position are amortized O(1);
//! moving the gap elsewhere is O(distance moved). Logical byte positions
//! exposed to callers are always gap-free — the gap is an implementation
//! detail that never appears in `at`/`substr`/`copy_to` results.

/// Initial gap size carved out when a new buffer is created or grown.
const INITIAL_GAP: usize = 1024;

/// A mutable UTF-8 byte sequence with a moving gap at the edit cursor.
///
/// Invariants: bytes outside `[gap_start, gap_end)` are valid content: no
/// mutation silently drops or reorders content bytes. All public positions
/// are logical (gap-free) offsets in `[0, len()]`.
pub struct GapBuffer {
    buffer: Vec<u8>,
    gap_start: usize,
    gap_end: usize,
}

impl GapBuffer {
    /// Creates an empty gap buffer with a default initial gap.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_GAP)
    }

    /// Creates an empty gap buffer with at least `capacity` bytes of gap.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![0u8; capacity],
            gap_start: 0,
            gap_end: capacity,
        }
    }

    /// Creates a gap buffer preloaded with `text`, gap positioned at the end.
    pub fn from_str(text: &str) -> Self {
        let mut gb = Self::with_capacity(text.len() + INITIAL_GAP);
        gb.insert_str(0, text.as_bytes());
        gb
    }

    /// Number of content bytes (excludes the gap).
    pub fn len(&self) -> usize {
        self.buffer.len() - (self.gap_end - self.gap_start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maps a logical position to a physical buffer index.
    #[inline]
    fn physical(&self, logical: usize) -> usize {
        if logical < self.gap_start {
            logical
        } else {
            logical + (self.gap_end - self.gap_start)
        }
    }

    /// Moves the gap so it starts at logical position `pos`.
    fn move_gap_to(&mut self, pos: usize) {
        let pos = pos.min(self.len());
        if pos == self.gap_start {
            return;
        }
        if pos < self.gap_start {
            // Shift bytes in [pos, gap_start) to the right, after the gap.
            let count = self.gap_start - pos;
            let gap_len = self.gap_end - self.gap_start;
            for i in (0..count).rev() {
                self.buffer[self.gap_end - count + i] = self.buffer[pos + i];
            }
            let _ = gap_len;
            self.gap_start = pos;
            self.gap_end -= count;
        } else {
            // Shift bytes in [gap_end, physical(pos)) to the left, before the gap.
            let count = pos - self.gap_start;
            for i in 0..count {
                self.buffer[self.gap_start + i] = self.buffer[self.gap_end + i];
            }
            self.gap_start += count;
            self.gap_end += count;
        }
    }

    /// Ensures the gap has room for at least `extra` more bytes, growing
    /// and reallocating if necessary. The gap must already be positioned
    /// at the insertion point before calling this.
    fn ensure_gap(&mut self, extra: usize) {
        let gap_len = self.gap_end - self.gap_start;
        if gap_len >= extra {
            return;
        }
        let needed = extra - gap_len;
        let grow = needed.max(INITIAL_GAP).max(self.buffer.len());
        let old_tail_len = self.buffer.len() - self.gap_end;
        let mut new_buffer = vec![0u8; self.buffer.len() + grow];
        new_buffer[..self.gap_start].copy_from_slice(&self.buffer[..self.gap_start]);
        let new_gap_end = self.gap_start + gap_len + grow;
        new_buffer[new_gap_end..new_gap_end + old_tail_len]
        .copy_from_slice(&self.buffer[self.gap_end..]);
        self.buffer = new_buffer;
        self.gap_end = new_gap_end;
    }

    /// Inserts a single byte at logical position `pos`.
    pub fn insert(&mut self, pos: usize, byte: u8) {
        self.insert_str(pos, &[byte]);
    }

    /// Inserts `bytes` at logical position `pos`, shifting positions >= pos
    /// forward by `bytes.len()`.
    pub fn insert_str(&mut self, pos: usize, bytes: &[u8]) {
        let pos = pos.min(self.len());
        self.move_gap_to(pos);
        self.ensure_gap(bytes.len());
        self.buffer[self.gap_start..self.gap_start + bytes.len()].copy_from_slice(bytes);
        self.gap_start += bytes.len();
    }

    /// Deletes `n` bytes starting at logical position `pos`.
    pub fn delete(&mut self, pos: usize, n: usize) {
        let len = self.len();
        let pos = pos.min(len);
        let n = n.min(len - pos);
        if n == 0 {
            return;
        }
        self.move_gap_to(pos);
        self.gap_end += n;
    }

    /// Returns the byte at logical position `i`, or `None` if out of range.
    pub fn at(&self, i: usize) -> Option<u8> {
        if i >= self.len() {
            return None;
        }
        Some(self.buffer[self.physical(i)])
    }

    /// Copies `n` bytes starting at `i` into `dst` (caller-provided storage).
    /// Writes fewer bytes than `n` if the range runs past the end.
    pub fn copy_to(&self, i: usize, n: usize, dst: &mut [u8]) -> usize {
        let len = self.len();
        let i = i.min(len);
        let n = n.min(len - i).min(dst.len());
        for k in 0..n {
            dst[k] = self.buffer[self.physical(i + k)];
        }
        n
    }

    /// Extracts a contiguous byte range `[s, e)` as a fresh owned `Vec<u8>`.
    pub fn substr_bytes(&self, s: usize, e: usize) -> Vec<u8> {
        let len = self.len();
        let s = s.min(len);
        let e = e.min(len).max(s);
        let mut out = Vec::with_capacity(e - s);
        for i in s..e {
            out.push(self.buffer[self.physical(i)]);
        }
        out
    }

    /// Extracts a contiguous byte range `[s, e)` as an owned `String`.
    ///
    /// The range is expected to sit on UTF-8 boundaries; invalid sequences
    /// are replaced per `String::from_utf8_lossy` rather than panicking,
    /// since byte-faithfulness is about the buffer's own
    /// storage, not about every caller-chosen slice being valid UTF-8.
    pub fn substr(&self, s: usize, e: usize) -> String {
        String::from_utf8_lossy(&self.substr_bytes(s, e)).into_owned()
    }

    /// Returns the whole buffer's content as an owned `Vec<u8>`.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.substr_bytes(0, self.len())
    }

    /// Returns the whole buffer's content as an owned `String` (lossy).
    pub fn to_string_lossy(&self) -> String {
        self.substr(0, self.len())
    }

    /// Replaces the entire buffer's content with `text`, gap moved to the end.
    pub fn replace_all(&mut self, text: &str) {
        let len = self.len();
        self.delete(0, len);
        self.insert_str(0, text.as_bytes());
    }

    // ── UTF-8 navigation ─────────────────────────────────────────────────

    /// Snaps back to the start of the codepoint containing or preceding `pos`.
    pub fn utf8_prev(&self, pos: usize) -> usize {
        let mut p = pos.min(self.len());
        if p == 0 {
            return 0;
        }
        p -= 1;
        while p > 0 && self.is_continuation_byte(p) {
            p -= 1;
        }
        p
    }

    /// Snaps forward to the start of the next codepoint after the one at `pos`.
    pub fn utf8_next(&self, pos: usize) -> usize {
        let len = self.len();
        if pos >= len {
            return len;
        }
        let (_, char_len) = self.decode_at(pos);
        (pos + char_len).min(len)
    }

    /// Decodes the Unicode scalar starting at `pos`, returning
    /// `(codepoint, byte_len)`. Returns `(REPLACEMENT_CHARACTER, 1)` for
    /// invalid sequences so navigation always makes forward progress.
    pub fn utf8_at(&self, pos: usize) -> (char, usize) {
        self.decode_at(pos)
    }

    fn is_continuation_byte(&self, pos: usize) -> bool {
        matches!(self.at(pos), Some(b) if b & 0xC0 == 0x80)
    }

    fn decode_at(&self, pos: usize) -> (char, usize) {
        let len = self.len();
        if pos >= len {
            return ('\0', 0);
        }
        let mut buf = [0u8; 4];
        let n = self.copy_to(pos, 4.min(len - pos), &mut buf);
        match std::str::from_utf8(&buf[..n]) {
            Ok(s) => {
                if let Some(c) = s.chars().next() {
                    return (c, c.len_utf8());
                }
                (char::REPLACEMENT_CHARACTER, 1)
            }
            Err(e) => {
                let valid = e.valid_up_to();
                if valid > 0 {
                    let s = std::str::from_utf8(&buf[..valid]).unwrap();
                    let c = s.chars().next().unwrap();
                    (c, c.len_utf8())
                } else {
                    (char::REPLACEMENT_CHARACTER, 1)
                }
            }
        }
    }
}

impl Default for GapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "gap_tests.rs"]
mod tests;
