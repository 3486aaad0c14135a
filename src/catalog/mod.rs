//! Control Catalog Module
//!
//! Normalizes framework catalogs (ISO-style nested domains, NIST-style
//! flat arrays, CIS-style control/safeguard nesting) into uniform control
//! records with canonical text and a precomputed domain tag.

pub mod loader;

pub use loader::{parse_catalog, CatalogError};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use crate::context::MatchContext;
use crate::domain::Domain;

/// A control as parsed from a framework catalog, before domain tagging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawControl {
    pub id: String,
    pub framework: String,
    pub title: String,
    /// Canonical text: title/description/summary/text/discussion fields,
    /// in that priority order, joined by ". "; missing fields skipped.
    pub text: String,
}

/// A single requirement statement from a compliance framework, ready for
/// matching. Read-only once built; the domain tag is computed at load and
/// never reassigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Control {
    pub id: String,
    pub framework: String,
    pub title: String,
    pub text: String,
    pub domain: Domain,
}

/// An ordered collection of controls, possibly spanning frameworks.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    controls: Vec<Control>,
}

impl Catalog {
    /// Build a catalog from raw controls, tagging each control's domain
    /// once via the matching context. Rejects duplicate ids within a
    /// framework.
    pub async fn build(raw: Vec<RawControl>, ctx: &MatchContext) -> Result<Self> {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut controls = Vec::with_capacity(raw.len());

        for rc in raw {
            if !seen.insert((rc.framework.clone(), rc.id.clone())) {
                return Err(CatalogError::DuplicateId {
                    framework: rc.framework,
                    id: rc.id,
                }
                .into());
            }
            let domain = ctx.tag_control(&rc.text).await?;
            controls.push(Control {
                id: rc.id,
                framework: rc.framework,
                title: rc.title,
                text: rc.text,
                domain,
            });
        }

        info!("Catalog built with {} controls", controls.len());
        Ok(Self { controls })
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Look up a control by framework and id.
    pub fn get(&self, framework: &str, id: &str) -> Option<&Control> {
        self.controls
            .iter()
            .find(|c| c.framework == framework && c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::test_util::MockEmbeddingProvider;
    use std::sync::Arc;

    fn raw(framework: &str, id: &str) -> RawControl {
        RawControl {
            id: id.to_string(),
            framework: framework.to_string(),
            title: "Password management".to_string(),
            text: "Password management. Require strong authentication for all accounts."
                .to_string(),
        }
    }

    #[tokio::test]
    async fn test_build_tags_domains_once() -> Result<()> {
        let ctx = MatchContext::new(Arc::new(MockEmbeddingProvider::new())).await?;
        let catalog = Catalog::build(vec![raw("ISO", "A.9.1"), raw("NIST", "AC-2")], &ctx).await?;
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.controls()[0].domain, Domain::AccessControl);
        assert!(catalog.get("NIST", "AC-2").is_some());
        assert!(catalog.get("ISO", "AC-2").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_id_within_framework_rejected() -> Result<()> {
        let ctx = MatchContext::new(Arc::new(MockEmbeddingProvider::new())).await?;
        let err = Catalog::build(vec![raw("ISO", "A.9.1"), raw("ISO", "A.9.1")], &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("duplicate control id"));
        Ok(())
    }

    #[tokio::test]
    async fn test_same_id_across_frameworks_allowed() -> Result<()> {
        let ctx = MatchContext::new(Arc::new(MockEmbeddingProvider::new())).await?;
        let catalog = Catalog::build(vec![raw("ISO", "1.1"), raw("CIS", "1.1")], &ctx).await?;
        assert_eq!(catalog.len(), 2);
        Ok(())
    }
}
