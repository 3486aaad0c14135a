//! Normalized Keyword Extraction
//!
//! Produces the keyword set used by the lexical matcher: lowercase
//! alphabetic tokens with stop words removed and a conservative suffix
//! lemmatizer applied, returned sorted for deterministic output.

use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

fn word_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]+").unwrap())
}

fn stop_words() -> &'static HashSet<&'static str> {
    static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| {
        [
            "a", "an", "the", "and", "or", "but", "if", "in", "on", "at", "to", "for", "of",
            "with", "by", "from", "as", "is", "was", "are", "were", "been", "be", "being",
            "have", "has", "had", "do", "does", "did", "will", "would", "could", "should",
            "may", "might", "must", "shall", "can", "need", "this", "that", "these", "those",
            "i", "you", "he", "she", "it", "we", "they", "its", "their", "our", "your", "my",
            "what", "which", "who", "whom", "whose", "where", "when", "why", "how", "all",
            "any", "each", "every", "both", "few", "more", "most", "other", "some", "such",
            "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very", "just",
            "also", "now", "here", "there", "into", "upon", "about", "over", "under", "per",
            "via", "within", "without", "between", "during", "before", "after", "above",
            "below", "up", "down", "out", "off", "then", "once", "ensure", "etc",
        ]
        .into_iter()
        .collect()
    })
}

/// Reduce a lowercase token to a dictionary-ish base form.
///
/// Deliberately conservative: only strips common inflectional suffixes where
/// the remaining stem is long enough to still be a word. Good enough for
/// overlap counting; not a linguistic lemmatizer.
fn lemma(token: &str) -> String {
    let t = token;
    if let Some(stem) = t.strip_suffix("ies") {
        if stem.len() >= 3 {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = t.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    if let Some(stem) = t.strip_suffix("ing") {
        if stem.len() >= 4 {
            return stem.to_string();
        }
    }
    if let Some(stem) = t.strip_suffix("ed") {
        if stem.len() >= 4 {
            return stem.to_string();
        }
    }
    if t.ends_with('s') && !t.ends_with("ss") && !t.ends_with("us") && !t.ends_with("is") {
        let stem = &t[..t.len() - 1];
        if stem.len() >= 3 {
            return stem.to_string();
        }
    }
    t.to_string()
}

/// Extract the normalized keyword set of a text: lowercase alphabetic
/// tokens, stop words removed, lemmatized, sorted.
pub fn keywords(text: &str) -> BTreeSet<String> {
    word_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.len() >= 2 && !stop_words().contains(w.as_str()))
        .map(|w| lemma(&w))
        .filter(|w| !stop_words().contains(w.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_normalize_case_and_drop_stop_words() {
        let kw = keywords("The Access Control policy is for all users.");
        assert!(kw.contains("access"));
        assert!(kw.contains("control"));
        assert!(kw.contains("policy"));
        assert!(kw.contains("user"));
        assert!(!kw.contains("the"));
        assert!(!kw.contains("is"));
    }

    #[test]
    fn test_lemma_plurals_and_inflections() {
        assert_eq!(lemma("policies"), "policy");
        assert_eq!(lemma("accesses"), "access");
        assert_eq!(lemma("controls"), "control");
        assert_eq!(lemma("training"), "train");
        assert_eq!(lemma("encrypted"), "encrypt");
        // Stems too short to strip are left alone
        assert_eq!(lemma("status"), "status");
        assert_eq!(lemma("access"), "access");
        assert_eq!(lemma("analysis"), "analysis");
    }

    #[test]
    fn test_non_alphabetic_tokens_excluded() {
        let kw = keywords("ISO-27001 requires 2FA; see §4.2!");
        assert!(kw.contains("iso"));
        assert!(kw.contains("require"));
        assert!(!kw.iter().any(|w| w.chars().any(|c| !c.is_alphabetic())));
    }

    #[test]
    fn test_output_is_sorted_and_deduplicated() {
        let kw: Vec<String> = keywords("password passwords PASSWORD token").into_iter().collect();
        assert_eq!(kw, vec!["password".to_string(), "token".to_string()]);
    }
}
