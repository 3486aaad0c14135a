//! Matching invariants: segmentation ordering, lexical threshold
//! semantics, and the semantic matcher's determinism, dedup, and bound
//! guarantees, exercised with a deterministic mock embedder.

use std::collections::HashSet;
use std::sync::Arc;

use policy_audit::catalog::{Catalog, RawControl};
use policy_audit::context::MatchContext;
use policy_audit::embedding::test_util::MockEmbeddingProvider;
use policy_audit::matcher::{candidate_controls, LexicalConfig, SemanticMatcher};
use policy_audit::text::Segmenter;

async fn context() -> Arc<MatchContext> {
    Arc::new(
        MatchContext::new(Arc::new(MockEmbeddingProvider::new()))
            .await
            .unwrap(),
    )
}

const CONTROL_TEXT: &str =
    "Require authentication and a password for every user account login attempt.";

#[test]
fn segmenter_preserves_source_order() {
    let text = "Alpha sentence about passwords. Beta sentence about backups. \
                Gamma sentence about inventories.";
    let units = Segmenter::new(15).sentences(text);
    assert_eq!(units.len(), 3);
    assert!(units[0].starts_with("Alpha"));
    assert!(units[1].starts_with("Beta"));
    assert!(units[2].starts_with("Gamma"));
}

#[tokio::test]
async fn semantic_matcher_is_deterministic() {
    let ctx = context().await;
    let matcher = SemanticMatcher::new(ctx);
    let doc = "Users enter a password and authentication token to login to an account. \
               Office chairs are restocked in the supply room every spring.";
    let a = matcher.match_control(doc, CONTROL_TEXT).await.unwrap();
    let b = matcher.match_control(doc, CONTROL_TEXT).await.unwrap();
    assert_eq!(a, b);
    assert!(!a.is_empty());
}

#[tokio::test]
async fn semantic_matches_respect_top_k_threshold_and_dedup() {
    let ctx = context().await;
    let matcher = SemanticMatcher::new(ctx);
    // Five admissible sentences, all topically close to the control,
    // each with a distinct 60-char prefix.
    let doc = "Users enter a password and authentication token to login to an account. \
               A password and authentication check happens at every account login. \
               Authentication and password rules protect each user account during login. \
               Login requires a password for the user and an authentication step. \
               Account login with a password and user authentication is mandatory.";
    let matches = matcher.match_control(doc, CONTROL_TEXT).await.unwrap();

    let config = matcher.config();
    assert_eq!(matches.len(), config.top_k);
    let mut prefixes = HashSet::new();
    for m in &matches {
        assert!(m.score >= config.threshold);
        let prefix: String = m.sentence.to_lowercase().chars().take(60).collect();
        assert!(prefixes.insert(prefix), "duplicate prefix in match list");
    }
    for pair in matches.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn inadmissible_policy_text_yields_zero_matches() {
    let ctx = context().await;
    let matcher = SemanticMatcher::new(ctx);
    // Every sentence at or below the minimum admissible length
    let doc = "Login now. Do it. Yes.";
    let matches = matcher.match_control(doc, CONTROL_TEXT).await.unwrap();
    assert!(matches.is_empty());
}

#[tokio::test]
async fn lexical_threshold_is_inclusive_at_two() {
    let ctx = context().await;
    let raw = vec![
        RawControl {
            id: "AC-1".to_string(),
            framework: "NIST".to_string(),
            title: "Access enforcement".to_string(),
            text: "Access control training for staff".to_string(),
        },
        RawControl {
            id: "AT-1".to_string(),
            framework: "NIST".to_string(),
            title: "Awareness".to_string(),
            text: "Security awareness training policy".to_string(),
        },
    ];
    let catalog = Catalog::build(raw, &ctx).await.unwrap();

    // Doc lemmas include {access, control, policy}; AC-1 shares two,
    // AT-1 shares only "policy".
    let doc = "The access control policy document";
    let candidates = candidate_controls(doc, &catalog, &LexicalConfig::default());
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].control_id, "AC-1");
    assert_eq!(
        candidates[0].overlap,
        vec!["access".to_string(), "control".to_string()]
    );
}
