//! Matching Module
//!
//! Two entry points for relating policy text to controls: a cheap lexical
//! keyword-overlap pre-filter and the semantic embedding matcher that
//! produces the excerpt lists handed to the coverage classifier.

pub mod lexical;
pub mod semantic;

pub use lexical::{candidate_controls, CandidateMatch, LexicalConfig};
pub use semantic::{MatcherConfig, SemanticMatcher, SentenceMatch};
