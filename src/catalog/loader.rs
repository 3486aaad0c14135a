//! Framework Catalog Loaders
//!
//! Parses the three catalog shapes the engine understands and normalizes
//! them into `RawControl`s:
//! - ISO style:  `{ "domains": [ { "controls": [ { "ref", "title", "summary" } ] } ] }`
//! - CIS style:  `[ { "control_id", "safeguards": [ { "id", "title", "description" } ] } ]`
//! - NIST style: `[ { "id", "title", "text" } ]`
//!
//! The shape is sniffed from the JSON structure, so callers only supply a
//! framework id and the raw document.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::RawControl;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate control id '{id}' in framework '{framework}'")]
    DuplicateId { framework: String, id: String },
    #[error("malformed catalog for framework '{framework}': {source}")]
    Parse {
        framework: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unrecognized catalog shape for framework '{framework}'")]
    UnknownShape { framework: String },
}

/// Text-bearing fields common to all catalog shapes. Canonical text
/// concatenates whichever are present, in priority order, joined by ". ".
#[derive(Debug, Default, Deserialize)]
struct EntryText {
    title: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    text: Option<String>,
    discussion: Option<String>,
}

impl EntryText {
    fn canonical(&self) -> String {
        [
            self.title.as_deref(),
            self.description.as_deref(),
            self.summary.as_deref(),
            self.text.as_deref(),
            self.discussion.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(". ")
    }

    fn title(&self) -> String {
        self.title.clone().unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct IsoCatalog {
    domains: Vec<IsoDomain>,
}

#[derive(Deserialize)]
struct IsoDomain {
    #[serde(default)]
    controls: Vec<IsoControl>,
}

#[derive(Deserialize)]
struct IsoControl {
    #[serde(rename = "ref")]
    ref_id: String,
    #[serde(flatten)]
    text: EntryText,
}

#[derive(Deserialize)]
struct NistControl {
    id: String,
    #[serde(flatten)]
    text: EntryText,
}

#[derive(Deserialize)]
struct CisControl {
    control_id: String,
    #[serde(default)]
    safeguards: Vec<CisSafeguard>,
}

#[derive(Deserialize)]
struct CisSafeguard {
    id: String,
    #[serde(flatten)]
    text: EntryText,
}

/// Parse a catalog document into raw controls, sniffing its shape.
pub fn parse_catalog(framework: &str, json: &str) -> Result<Vec<RawControl>, CatalogError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            framework: framework.to_string(),
            source,
        })?;

    let raw = if value.get("domains").is_some() {
        parse_iso(framework, value)?
    } else if value
        .as_array()
        .and_then(|a| a.first())
        .map(|first| first.get("safeguards").is_some() || first.get("control_id").is_some())
        .unwrap_or(false)
    {
        parse_cis(framework, value)?
    } else if value.is_array() {
        parse_nist(framework, value)?
    } else {
        return Err(CatalogError::UnknownShape {
            framework: framework.to_string(),
        });
    };

    debug!("Parsed {} controls for framework '{}'", raw.len(), framework);
    Ok(raw)
}

fn parse_iso(framework: &str, value: serde_json::Value) -> Result<Vec<RawControl>, CatalogError> {
    let catalog: IsoCatalog = from_value(framework, value)?;
    Ok(catalog
        .domains
        .into_iter()
        .flat_map(|d| d.controls)
        .map(|c| RawControl {
            id: c.ref_id,
            framework: framework.to_string(),
            title: c.text.title(),
            text: c.text.canonical(),
        })
        .collect())
}

fn parse_nist(framework: &str, value: serde_json::Value) -> Result<Vec<RawControl>, CatalogError> {
    let controls: Vec<NistControl> = from_value(framework, value)?;
    Ok(controls
        .into_iter()
        .map(|c| RawControl {
            id: c.id,
            framework: framework.to_string(),
            title: c.text.title(),
            text: c.text.canonical(),
        })
        .collect())
}

fn parse_cis(framework: &str, value: serde_json::Value) -> Result<Vec<RawControl>, CatalogError> {
    let controls: Vec<CisControl> = from_value(framework, value)?;
    let mut raw = Vec::new();
    for control in controls {
        for sg in control.safeguards {
            // Safeguard ids sometimes repeat the parent id ("1.4"); keep
            // only the local segment when composing the full reference.
            let local = sg.id.rsplit('.').next().unwrap_or(&sg.id).to_string();
            raw.push(RawControl {
                id: format!("{}.{}", control.control_id, local),
                framework: framework.to_string(),
                title: sg.text.title(),
                text: sg.text.canonical(),
            });
        }
    }
    Ok(raw)
}

fn from_value<T: serde::de::DeserializeOwned>(
    framework: &str,
    value: serde_json::Value,
) -> Result<T, CatalogError> {
    serde_json::from_value(value).map_err(|source| CatalogError::Parse {
        framework: framework.to_string(),
        source,
    })
}
