//! A character gap buffer for the visible document.
//!
//! The engine only decides *where* an accepted edit lands; something still
//! has to hold the text. A gap buffer keeps insertions and deletions
//! around a movable gap so a burst of edits at one spot costs O(1) each
//! after the first.
//!
//! Positions are character offsets, matching the position arithmetic in
//! the transform rules. Out-of-range edits are clamped to the buffer
//! bounds: a transformed operation can legitimately point one past the
//! text it raced against.

use std::fmt;

use crate::ot::op::OpKind;
use crate::ot::op::Operation;

/// Fresh gap capacity added when the gap runs out.
const MIN_GAP: usize = 32;

/// A text buffer with a movable gap at the last edit point.
#[derive(Clone, Debug)]
pub struct GapBuffer {
    buf: Vec<char>,
    gap_start: usize,
    gap_len: usize,
}

impl GapBuffer {
    /// Create an empty buffer.
    pub fn new() -> GapBuffer {
        return GapBuffer {
            buf: vec!['\0'; MIN_GAP],
            gap_start: 0,
            gap_len: MIN_GAP,
        };
    }

    /// Create a buffer holding `text`.
    pub fn from_str(text: &str) -> GapBuffer {
        let mut buffer = GapBuffer::new();
        buffer.insert(0, text);
        return buffer;
    }

    /// Number of characters of text (the gap does not count).
    pub fn len(&self) -> usize {
        return self.buf.len() - self.gap_len;
    }

    /// True if the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Insert `text` at character offset `pos`, clamped to the end.
    pub fn insert(&mut self, pos: usize, text: &str) {
        let pos = pos.min(self.len());
        let count = text.chars().count();
        self.move_gap(pos);
        self.ensure_gap(count);
        for (i, ch) in text.chars().enumerate() {
            self.buf[self.gap_start + i] = ch;
        }
        self.gap_start += count;
        self.gap_len -= count;
    }

    /// Delete `count` characters starting at offset `pos`; both are
    /// clamped to the text bounds.
    pub fn delete(&mut self, pos: usize, count: usize) {
        let pos = pos.min(self.len());
        let count = count.min(self.len() - pos);
        self.move_gap(pos);
        // deleted characters are simply swallowed by the gap
        self.gap_len += count;
    }

    /// Apply an accepted, transformed operation to the text.
    ///
    /// Updates carry styling intent and leave the text untouched.
    pub fn apply(&mut self, op: &Operation) {
        match op.kind() {
            OpKind::Insert => self.insert(op.position(), op.value()),
            OpKind::Delete => self.delete(op.position(), op.value_len()),
            OpKind::Update => {}
        }
    }

    /// Move the gap so it starts at character offset `pos`.
    fn move_gap(&mut self, pos: usize) {
        if pos < self.gap_start {
            // shift the span [pos, gap_start) right across the gap
            self.buf
                .copy_within(pos..self.gap_start, pos + self.gap_len);
            self.gap_start = pos;
        } else if pos > self.gap_start {
            // shift the span just past the gap left into it
            let from = self.gap_start + self.gap_len;
            let count = pos - self.gap_start;
            self.buf.copy_within(from..from + count, self.gap_start);
            self.gap_start = pos;
        }
    }

    /// Widen the gap to hold at least `needed` more characters.
    fn ensure_gap(&mut self, needed: usize) {
        if self.gap_len >= needed {
            return;
        }
        let grow = (needed - self.gap_len).max(MIN_GAP);
        let at = self.gap_start + self.gap_len;
        self.buf.splice(at..at, std::iter::repeat('\0').take(grow));
        self.gap_len += grow;
    }
}

impl Default for GapBuffer {
    fn default() -> Self {
        return Self::new();
    }
}

impl fmt::Display for GapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in &self.buf[..self.gap_start] {
            write!(f, "{}", ch)?;
        }
        for ch in &self.buf[self.gap_start + self.gap_len..] {
            write!(f, "{}", ch)?;
        }
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ot::engine::OperationEngine;

    #[test]
    fn starts_empty() {
        let buffer = GapBuffer::new();
        assert_eq!(buffer.len(), 0);
        assert!(buffer.is_empty());
        assert_eq!(buffer.to_string(), "");
    }

    #[test]
    fn insert_at_the_end() {
        let mut buffer = GapBuffer::new();
        buffer.insert(0, "hello");
        buffer.insert(5, " world");
        assert_eq!(buffer.to_string(), "hello world");
        assert_eq!(buffer.len(), 11);
    }

    #[test]
    fn insert_in_the_middle() {
        let mut buffer = GapBuffer::from_str("held");
        buffer.insert(2, "llo wor");
        assert_eq!(buffer.to_string(), "hello world");
    }

    #[test]
    fn insert_position_is_clamped() {
        let mut buffer = GapBuffer::from_str("ab");
        buffer.insert(99, "c");
        assert_eq!(buffer.to_string(), "abc");
    }

    #[test]
    fn delete_in_the_middle() {
        let mut buffer = GapBuffer::from_str("hello world");
        buffer.delete(5, 6);
        assert_eq!(buffer.to_string(), "hello");
    }

    #[test]
    fn delete_count_is_clamped() {
        let mut buffer = GapBuffer::from_str("hello");
        buffer.delete(3, 99);
        assert_eq!(buffer.to_string(), "hel");
        buffer.delete(99, 1);
        assert_eq!(buffer.to_string(), "hel");
    }

    #[test]
    fn edits_across_the_gap_both_ways() {
        let mut buffer = GapBuffer::from_str("abcdef");
        buffer.insert(1, "X"); // gap near the front
        buffer.insert(6, "Y"); // forces a rightward gap move
        buffer.delete(0, 1); // and back left
        assert_eq!(buffer.to_string(), "XbcdeYf");
    }

    #[test]
    fn growth_past_the_initial_gap() {
        let mut buffer = GapBuffer::new();
        let long = "x".repeat(MIN_GAP * 3 + 7);
        buffer.insert(0, &long);
        assert_eq!(buffer.len(), long.len());
        assert_eq!(buffer.to_string(), long);
    }

    #[test]
    fn multibyte_characters_count_as_one() {
        let mut buffer = GapBuffer::from_str("naïve");
        assert_eq!(buffer.len(), 5);
        buffer.delete(2, 1);
        assert_eq!(buffer.to_string(), "nave");
    }

    #[test]
    fn applies_engine_output() {
        let mut engine = OperationEngine::new(1);
        let mut buffer = GapBuffer::new();

        let op = engine
            .push(
                true,
                "document",
                "hello",
                crate::ot::op::OpKind::Insert,
                0,
                0,
                &[],
                None,
            )
            .unwrap()
            .unwrap();
        buffer.apply(&op);

        let op = engine
            .push(
                true,
                "document",
                "ell",
                crate::ot::op::OpKind::Delete,
                1,
                0,
                &[],
                None,
            )
            .unwrap()
            .unwrap();
        buffer.apply(&op);

        assert_eq!(buffer.to_string(), "ho");
    }
}
