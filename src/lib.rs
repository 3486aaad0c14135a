//! Control Coverage Matching & Scoring Engine
//!
//! Maps free-text policy documents against structured compliance-control
//! catalogs and scores how well each policy covers each control:
//! - Sentence segmentation and sliding-window chunking
//! - Lexical keyword-overlap pre-filtering across a catalog
//! - Semantic sentence matching via embeddings (fastembed)
//! - Topical domain tagging for documents and controls
//! - Coverage scoring with letter grades, per policy and per framework
//!
//! The coverage judgment itself is an external capability (an LLM behind
//! the `CoverageClassifier` trait); this crate supplies its inputs and
//! consumes its structured output.

pub mod catalog;
pub mod classify;
pub mod context;
pub mod domain;
pub mod embedding;
pub mod matcher;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod text;

// Re-exports for convenience
pub use catalog::Catalog;
pub use classify::{Coverage, CoverageClassifier};
pub use context::MatchContext;
pub use pipeline::Auditor;
pub use report::{AuditReport, BatchSummary};
