//! Sentence Segmentation and Chunking
//!
//! Splits raw policy text into sentence units and sliding windows of
//! consecutive sentences. Sentence-boundary detection sits behind the
//! `SentenceTokenizer` trait so a linguistic tokenizer can be plugged in;
//! the built-in implementation splits on terminal punctuation.

use std::sync::Arc;

/// Capability trait for sentence-boundary detection.
pub trait SentenceTokenizer: Send + Sync {
    /// Split raw text into candidate sentences, trimmed, in source order.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Rule-based tokenizer splitting on sentence-terminal punctuation.
///
/// Newlines are also treated as boundaries since extracted policy text
/// frequently carries headings and bullet lists without terminal periods.
#[derive(Debug, Default, Clone, Copy)]
pub struct PunctuationTokenizer;

impl SentenceTokenizer for PunctuationTokenizer {
    fn split(&self, text: &str) -> Vec<String> {
        text.split(['.', '!', '?', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Segments documents into admissible sentence units and chunks.
#[derive(Clone)]
pub struct Segmenter {
    tokenizer: Arc<dyn SentenceTokenizer>,
    min_len: usize,
}

impl Segmenter {
    /// Create a segmenter with the built-in punctuation tokenizer.
    /// Units of `min_len` characters or fewer are discarded.
    pub fn new(min_len: usize) -> Self {
        Self {
            tokenizer: Arc::new(PunctuationTokenizer),
            min_len,
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn SentenceTokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Ordered sentence units passing the minimum-length admission filter.
    /// Empty or fully filtered input yields an empty vec, never an error.
    pub fn sentences(&self, text: &str) -> Vec<String> {
        self.tokenizer
            .split(text)
            .into_iter()
            .filter(|s| s.chars().count() > self.min_len)
            .collect()
    }

    /// Sliding windows of `window_size` consecutive sentences, joined by a
    /// single space. Produces `len - window_size + 1` chunks when the window
    /// fits, zero otherwise. `window_size` of zero yields no chunks.
    pub fn chunks(&self, text: &str, window_size: usize) -> Vec<String> {
        if window_size == 0 {
            return Vec::new();
        }
        let sentences = self.sentences(text);
        if window_size > sentences.len() {
            return Vec::new();
        }
        sentences
            .windows(window_size)
            .map(|w| w.join(" "))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg() -> Segmenter {
        Segmenter::new(15)
    }

    #[test]
    fn test_sentences_preserve_order_and_filter_short() {
        let text = "Access to systems requires authentication. Ok. \
                    All passwords must be rotated every ninety days.";
        let units = seg().sentences(text);
        assert_eq!(units.len(), 2);
        assert!(units[0].starts_with("Access"));
        assert!(units[1].starts_with("All passwords"));
        for u in &units {
            assert!(u.chars().count() > 15);
        }
    }

    #[test]
    fn test_empty_input_yields_empty() {
        assert!(seg().sentences("").is_empty());
        assert!(seg().sentences("Short. Tiny. No.").is_empty());
        assert!(seg().chunks("", 3).is_empty());
    }

    #[test]
    fn test_chunk_count_is_len_minus_window_plus_one() {
        let text = "Sentence number one goes right here. \
                    Sentence number two goes right here. \
                    Sentence number three goes right here. \
                    Sentence number four goes right here.";
        let s = seg();
        assert_eq!(s.chunks(text, 1).len(), 4);
        assert_eq!(s.chunks(text, 3).len(), 2);
        assert_eq!(s.chunks(text, 4).len(), 1);
        assert_eq!(s.chunks(text, 5).len(), 0);
        assert_eq!(s.chunks(text, 0).len(), 0);
    }

    #[test]
    fn test_chunks_are_sliding_not_partitioning() {
        let text = "Sentence number one goes right here. \
                    Sentence number two goes right here. \
                    Sentence number three goes right here.";
        let chunks = seg().chunks(text, 2);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].contains("one") && chunks[0].contains("two"));
        assert!(chunks[1].contains("two") && chunks[1].contains("three"));
    }

    #[test]
    fn test_custom_tokenizer_is_honored() {
        struct LineTokenizer;
        impl SentenceTokenizer for LineTokenizer {
            fn split(&self, text: &str) -> Vec<String> {
                text.lines().map(|l| l.trim().to_string()).collect()
            }
        }
        let s = Segmenter::new(0).with_tokenizer(Arc::new(LineTokenizer));
        let units = s.sentences("first line\nsecond line");
        assert_eq!(units, vec!["first line", "second line"]);
    }
}
