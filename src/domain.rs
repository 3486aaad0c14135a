//! Topical Domain Tagging
//!
//! A fixed set of coarse security domains used to group controls and
//! documents. Documents are tagged by case-insensitive keyword presence;
//! controls are tagged by nearest domain keyword-bag embedding (see
//! `MatchContext::tag_control`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five topical domains recognized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    AccessControl,
    IncidentResponse,
    AssetManagement,
    DataProtection,
    SecurityGovernance,
}

impl Domain {
    /// All domains in enumeration order. Tie-breaking in control tagging
    /// follows this order.
    pub const ALL: [Domain; 5] = [
        Domain::AccessControl,
        Domain::IncidentResponse,
        Domain::AssetManagement,
        Domain::DataProtection,
        Domain::SecurityGovernance,
    ];

    /// Representative keywords defining the domain.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Domain::AccessControl => {
                &["authentication", "authorization", "login", "password", "access control"]
            }
            Domain::IncidentResponse => {
                &["incident", "breach", "response", "forensics", "security incident"]
            }
            Domain::AssetManagement => {
                &["inventory", "asset", "device", "hardware", "endpoint"]
            }
            Domain::DataProtection => {
                &["encryption", "retention", "disposal", "confidentiality", "sensitive data"]
            }
            Domain::SecurityGovernance => {
                &["policy", "risk", "training", "compliance", "audit", "roles"]
            }
        }
    }

    /// The keyword bag as one space-joined string, used for embedding.
    pub fn keyword_bag(self) -> String {
        self.keywords().join(" ")
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::AccessControl => "access_control",
            Domain::IncidentResponse => "incident_response",
            Domain::AssetManagement => "asset_management",
            Domain::DataProtection => "data_protection",
            Domain::SecurityGovernance => "security_governance",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag a document by case-insensitive keyword presence.
///
/// Returns every domain with at least one keyword hit, in enumeration
/// order; a document may belong to zero, one, or several domains.
pub fn tag_document(text: &str) -> Vec<Domain> {
    let lower = text.to_lowercase();
    Domain::ALL
        .into_iter()
        .filter(|d| d.keywords().iter().any(|kw| lower.contains(kw)))
        .collect()
}
