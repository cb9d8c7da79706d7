//! Recursive text chunking with character overlap
//!
//! Text is split at the coarsest separator that yields pieces within budget
//! (paragraph break, then line break, then space, then single characters).
//! Adjacent pieces are merged back into windows. The first window may use the
//! whole `chunk_size`; every later window is prefixed with the
//! `chunk_overlap` characters that precede it.
//! Chunks are always contiguous slices of the source text, so removing the
//! overlap prefixes and concatenating gives back the document exactly.

use std::ops::Range;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, Document};

/// Separators tried in order, coarsest first. The empty separator means a
/// character-level hard split.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Text chunker with configurable size, overlap and separator preference
#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters shared with the previous chunk
    chunk_overlap: usize,
    /// Separators, coarsest first
    separators: Vec<String>,
}

impl RecursiveTextSplitter {
    /// Create a new chunker. `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Replace the separator preference list
    pub fn with_separators(mut self, separators: &[&str]) -> Self {
        self.separators = separators.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Maximum chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in characters
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Chunk a single document
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        self.split_spans(&doc.content)
            .into_iter()
            .enumerate()
            .map(|(i, span)| Chunk {
                text: doc.content[span.bytes].to_string(),
                source: doc.source.clone(),
                chunk_index: i as u32,
                char_start: span.char_start,
                char_end: span.char_end,
            })
            .collect()
    }

    /// Chunk every document, preserving document order
    pub fn chunk_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        docs.iter().flat_map(|doc| self.chunk_document(doc)).collect()
    }

    /// Split raw text into chunk strings
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_spans(text)
            .into_iter()
            .map(|span| text[span.bytes].to_string())
            .collect()
    }

    fn split_spans(&self, text: &str) -> Vec<Span> {
        if text.is_empty() {
            return Vec::new();
        }

        // The first window has no overlap prefix and may fill the whole chunk
        let mut head = Vec::new();
        split_recursive(text, 0, &self.separators, self.chunk_size, &mut head);
        let mut windows = merge_segments(text, head, self.chunk_size);
        windows.truncate(1);

        // Later windows leave room for the overlap prefix
        let rest = windows.first().map_or(0, |w| w.end);
        if rest < text.len() {
            let window = self.chunk_size - self.chunk_overlap;
            let mut tail = Vec::new();
            split_recursive(&text[rest..], rest, &self.separators, window, &mut tail);
            windows.extend(merge_segments(text, tail, window));
        }

        let mut spans = Vec::with_capacity(windows.len());
        let mut core_char_start = 0usize;

        for (i, range) in windows.into_iter().enumerate() {
            let core_chars = text[range.clone()].chars().count();
            let overlap = if i == 0 {
                0
            } else {
                self.chunk_overlap.min(core_char_start)
            };
            let byte_start = back_chars(text, range.start, overlap);

            spans.push(Span {
                bytes: byte_start..range.end,
                char_start: core_char_start - overlap,
                char_end: core_char_start + core_chars,
            });
            core_char_start += core_chars;
        }

        spans
    }
}

/// A chunk's location in the source text
#[derive(Debug, Clone)]
struct Span {
    bytes: Range<usize>,
    char_start: usize,
    char_end: usize,
}

/// Split `text` (located at byte `offset` of the source) into contiguous
/// segments of at most `budget` characters, trying separators in order.
fn split_recursive(
    text: &str,
    offset: usize,
    separators: &[String],
    budget: usize,
    out: &mut Vec<Range<usize>>,
) {
    if text.chars().count() <= budget {
        out.push(offset..offset + text.len());
        return;
    }

    let (separator, remaining) = match separators.split_first() {
        Some((sep, rest)) if !sep.is_empty() => (sep.as_str(), rest),
        _ => {
            hard_split(text, offset, budget, out);
            return;
        }
    };

    let mut start = offset;
    for piece in split_keeping_separator(text, separator) {
        if piece.chars().count() <= budget {
            out.push(start..start + piece.len());
        } else {
            split_recursive(piece, start, remaining, budget, out);
        }
        start += piece.len();
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Character-level fallback: cut every `budget` characters
fn hard_split(text: &str, offset: usize, budget: usize, out: &mut Vec<Range<usize>>) {
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == budget {
            out.push(offset + start..offset + idx);
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        out.push(offset + start..offset + text.len());
    }
}

/// Greedily merge adjacent segments into windows of at most `budget` characters
fn merge_segments(text: &str, segments: Vec<Range<usize>>, budget: usize) -> Vec<Range<usize>> {
    let mut windows: Vec<Range<usize>> = Vec::new();
    let mut current: Option<(Range<usize>, usize)> = None;

    for segment in segments {
        let len = text[segment.clone()].chars().count();
        current = match current.take() {
            Some((range, chars)) if chars + len <= budget => Some((range.start..segment.end, chars + len)),
            Some((range, _)) => {
                windows.push(range);
                Some((segment, len))
            }
            None => Some((segment, len)),
        };
    }

    if let Some((range, _)) = current {
        windows.push(range);
    }

    windows
}

/// Byte position `n` characters before `byte_pos` (clamped at 0)
fn back_chars(text: &str, byte_pos: usize, n: usize) -> usize {
    text[..byte_pos]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(byte_pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Drop each chunk's overlap with its predecessor and concatenate
    fn reconstruct(chunks: &[Chunk]) -> String {
        let mut out = String::new();
        let mut prev_end = 0;
        for chunk in chunks {
            let skip = prev_end - chunk.char_start;
            out.extend(chunk.text.chars().skip(skip));
            prev_end = chunk.char_end;
        }
        out
    }

    #[test]
    fn test_empty_document_yields_no_chunks() {
        let splitter = RecursiveTextSplitter::new(100, 10);
        assert!(splitter.chunk_document(&Document::new("", "empty.txt")).is_empty());
    }

    #[test]
    fn test_short_document_is_single_chunk() {
        let splitter = RecursiveTextSplitter::new(100, 10);
        let chunks = splitter.chunk_document(&Document::new("Office hours are 9 to 5.", "hr.txt"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Office hours are 9 to 5.");
        assert_eq!(chunks[0].source, "hr.txt");
        assert_eq!((chunks[0].char_start, chunks[0].char_end), (0, 24));
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let splitter = RecursiveTextSplitter::new(20, 0);
        let chunks = splitter.split_text("para one.\n\npara two is longer\n\nthree");
        assert_eq!(chunks, vec!["para one.\n\n", "para two is longer\n\n", "three"]);
    }

    #[test]
    fn test_falls_back_to_words_then_characters() {
        let splitter = RecursiveTextSplitter::new(6, 0);
        let chunks = splitter.split_text("aa bb cccccccccc");
        assert_eq!(chunks, vec!["aa bb ", "cccccc", "cccc"]);
    }

    #[test]
    fn test_hard_split_with_overlap() {
        let splitter = RecursiveTextSplitter::new(4, 2);
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "cdef", "efgh", "ghij"]);
    }

    #[test]
    fn test_first_chunk_uses_full_size() {
        let text = "x".repeat(2000);
        let splitter = RecursiveTextSplitter::new(1000, 200);
        let lens: Vec<usize> = splitter
            .split_text(&text)
            .iter()
            .map(|c| c.chars().count())
            .collect();
        assert_eq!(lens, vec![1000, 1000, 400]);
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(10);
        let splitter = RecursiveTextSplitter::new(60, 15);
        let chunks = splitter.chunk_document(&Document::new(text.clone(), "fox.txt"));

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail: String = pair[0].text.chars().skip(pair[0].char_len() - 15).collect();
            let head: String = pair[1].text.chars().take(15).collect();
            assert_eq!(tail, head);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let text = "héllo wörld ünïcödé ".repeat(5);
        let splitter = RecursiveTextSplitter::new(7, 3);
        let chunks = splitter.chunk_document(&Document::new(text.clone(), "u.txt"));
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 7));
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_chunks_inherit_source_and_index() {
        let docs = vec![
            Document::new("alpha beta gamma delta", "a.txt"),
            Document::new("epsilon zeta eta theta", "b.txt"),
        ];
        let chunks = RecursiveTextSplitter::new(12, 2).chunk_documents(&docs);
        assert!(chunks.iter().any(|c| c.source == "a.txt"));
        assert!(chunks.iter().any(|c| c.source == "b.txt"));
        let first_b = chunks.iter().find(|c| c.source == "b.txt").unwrap();
        assert_eq!(first_b.chunk_index, 0);
        assert_eq!(first_b.char_start, 0);
    }

    fn size_and_overlap() -> impl Strategy<Value = (usize, usize)> {
        (1usize..80).prop_flat_map(|size| (Just(size), 0..size))
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_document(
            text in "[a-zé .\n]{0,400}",
            (size, overlap) in size_and_overlap(),
        ) {
            let splitter = RecursiveTextSplitter::new(size, overlap);
            let chunks = splitter.chunk_document(&Document::new(text.clone(), "p.txt"));
            prop_assert_eq!(reconstruct(&chunks), text);
        }

        #[test]
        fn prop_chunks_respect_size_and_overlap(
            text in "[a-z \n]{1,400}",
            (size, overlap) in size_and_overlap(),
        ) {
            let splitter = RecursiveTextSplitter::new(size, overlap);
            let chunks = splitter.chunk_document(&Document::new(text, "p.txt"));
            prop_assert!(!chunks.is_empty());
            for chunk in &chunks {
                prop_assert!(chunk.text.chars().count() <= size);
                prop_assert_eq!(chunk.text.chars().count(), chunk.char_len());
            }
            for pair in chunks.windows(2) {
                let shared = pair[0].char_end - pair[1].char_start;
                prop_assert_eq!(shared, overlap.min(pair[0].char_end));
            }
        }
    }
}
