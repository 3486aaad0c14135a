//! Text Processing Module
//!
//! Sentence segmentation, sliding-window chunking, and normalized
//! keyword extraction for policy documents and control descriptions.

pub mod keywords;
pub mod segment;

pub use keywords::keywords;
pub use segment::{PunctuationTokenizer, Segmenter, SentenceTokenizer};
