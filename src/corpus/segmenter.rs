//! Word-window segmentation
//!
//! Splits document text into fixed-size word windows. Splitting on
//! whitespace keeps every word exactly once, so concatenating the chunks
//! reproduces the document up to whitespace normalization.

use std::str::SplitWhitespace;

/// Segment `text` into chunks of at most `chunk_size` words
///
/// Words are whitespace-separated tokens; runs of whitespace collapse to a
/// single space inside each chunk. The final chunk may be shorter. Yields
/// nothing for text with no words.
pub fn segment_words(text: &str, chunk_size: usize) -> WordChunks<'_> {
    debug_assert!(chunk_size > 0, "chunk_size must be positive");

    WordChunks {
        words: text.split_whitespace(),
        chunk_size,
    }
}

/// Iterator over word windows of a document
pub struct WordChunks<'a> {
    words: SplitWhitespace<'a>,
    chunk_size: usize,
}

impl Iterator for WordChunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut chunk = String::new();
        let mut count = 0;

        for word in self.words.by_ref() {
            if !chunk.is_empty() {
                chunk.push(' ');
            }
            chunk.push_str(word);
            count += 1;
            if count == self.chunk_size {
                break;
            }
        }

        if count == 0 {
            None
        } else {
            Some(chunk)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_preserve_every_word() {
        let text = "one two three four five six seven";
        let chunks: Vec<String> = segment_words(text, 3).collect();

        assert_eq!(chunks, vec!["one two three", "four five six", "seven"]);

        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_exact_multiple_has_no_short_tail() {
        let chunks: Vec<String> = segment_words("a b c d", 2).collect();
        assert_eq!(chunks, vec!["a b", "c d"]);
    }

    #[test]
    fn test_short_document_single_chunk() {
        let chunks: Vec<String> = segment_words("hello world", 500).collect();
        assert_eq!(chunks, vec!["hello world"]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert_eq!(segment_words("", 10).count(), 0);
        assert_eq!(segment_words("   \n\t  ", 10).count(), 0);
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        let chunks: Vec<String> = segment_words("one\n\ntwo\t three", 10).collect();
        assert_eq!(chunks, vec!["one two three"]);
    }

    #[test]
    fn test_chunk_size_one() {
        let chunks: Vec<String> = segment_words("a b c", 1).collect();
        assert_eq!(chunks, vec!["a", "b", "c"]);
    }
}
