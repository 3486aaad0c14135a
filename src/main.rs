//! Policy Audit Batch Runner
//!
//! Loads framework catalogs from a controls directory, audits every
//! extracted policy text in a policies directory, and writes one report
//! JSON per policy to an output directory. Document format extraction
//! (PDF/DOCX to text) happens upstream; this binary consumes plain text.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use policy_audit::catalog::{parse_catalog, Catalog, RawControl};
use policy_audit::classify::{
    LlmClassifier, LlmProvider, OllamaProvider, OpenAICompatibleProvider,
};
use policy_audit::context::MatchContext;
use policy_audit::embedding::LocalEmbeddingProvider;
use policy_audit::matcher::MatcherConfig;
use policy_audit::pipeline::{AuditConfig, Auditor};
use policy_audit::report::{BatchSummary, CoverageRecord};

// ──────────────────────────────────────────────────────────────────────────────
// CONFIGURATION
// ──────────────────────────────────────────────────────────────────────────────

struct RunnerConfig {
    /// Directory of framework catalog JSON files
    controls_dir: PathBuf,
    /// Directory of extracted policy .txt files
    policies_dir: PathBuf,
    /// Directory for report JSON output
    output_dir: PathBuf,
    /// Classifier model name
    model: String,
    /// OpenAI-compatible endpoint; Ollama is used when unset
    llm_url: Option<String>,
    matcher: MatcherConfig,
    lexical_prefilter: bool,
}

impl RunnerConfig {
    fn from_env() -> Self {
        let mut matcher = MatcherConfig::default();
        if let Some(t) = env_parse::<f32>("AUDIT_THRESHOLD") {
            matcher.threshold = t;
        }
        if let Some(k) = env_parse::<usize>("AUDIT_TOP_K") {
            matcher.top_k = k;
        }
        Self {
            controls_dir: env_path("AUDIT_CONTROLS_DIR", "controls"),
            policies_dir: env_path("AUDIT_POLICIES_DIR", "processed"),
            output_dir: env_path("AUDIT_OUTPUT_DIR", "output"),
            model: std::env::var("AUDIT_MODEL").unwrap_or_else(|_| "llama3.1:8b".to_string()),
            llm_url: std::env::var("AUDIT_LLM_URL").ok(),
            matcher,
            lexical_prefilter: std::env::var("AUDIT_LEXICAL_PREFILTER")
                .map(|v| v == "1")
                .unwrap_or(false),
        }
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key).unwrap_or_else(|_| default.to_string()).into()
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let config = RunnerConfig::from_env();
    fs::create_dir_all(&config.output_dir).await?;

    let ctx = Arc::new(MatchContext::new(Arc::new(LocalEmbeddingProvider::new())).await?);

    let catalog = load_catalogs(&config.controls_dir, &ctx).await?;
    if catalog.is_empty() {
        anyhow::bail!(
            "No controls loaded from {:?}; expected framework catalog JSON files",
            config.controls_dir
        );
    }

    let provider: Arc<dyn LlmProvider> = match &config.llm_url {
        Some(url) => Arc::new(OpenAICompatibleProvider::new(
            url.clone(),
            std::env::var("AUDIT_LLM_API_KEY").ok(),
        )),
        None => Arc::new(OllamaProvider::default()),
    };
    let classifier = Arc::new(LlmClassifier::new(provider).with_model(&config.model));

    let auditor = Auditor::new(ctx, classifier).with_config(AuditConfig {
        matcher: config.matcher,
        lexical_prefilter: config.lexical_prefilter,
        ..AuditConfig::default()
    });

    let mut audited: Vec<String> = Vec::new();
    let mut batch_records: Vec<CoverageRecord> = Vec::new();
    let mut entries = fs::read_dir(&config.policies_dir)
        .await
        .with_context(|| format!("Cannot read policies directory {:?}", config.policies_dir))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("policy")
            .to_string();
        let text = fs::read_to_string(&path).await?;
        if text.trim().is_empty() {
            warn!("Skipping empty policy file {:?}", path);
            continue;
        }

        let report = auditor.audit(&name, &text, &catalog).await?;
        let out_path = config.output_dir.join(format!("{name}_report.json"));
        fs::write(&out_path, serde_json::to_string_pretty(&report)?).await?;
        info!(
            "{}: {}% ({}) -> {:?}",
            name, report.summary.percentage, report.summary.grade, out_path
        );
        batch_records.extend(report.records);
        audited.push(name);
    }

    // Cross-policy aggregation: framework pools spanning the whole batch
    // plus one overall compliance score.
    if !audited.is_empty() {
        let batch = BatchSummary::from_records(audited, &batch_records);
        let batch_path = config.output_dir.join("batch_summary.json");
        fs::write(&batch_path, serde_json::to_string_pretty(&batch)?).await?;
        info!(
            "Batch: {} policies, {}% ({}) overall -> {:?}",
            batch.policies.len(),
            batch.overall.percentage,
            batch.overall.grade,
            batch_path
        );
    } else {
        warn!("No policy .txt files found in {:?}", config.policies_dir);
    }
    Ok(())
}

/// Load every catalog JSON in the directory; the framework id is the file
/// stem (e.g. `iso27001.json` -> framework "iso27001").
async fn load_catalogs(dir: &Path, ctx: &MatchContext) -> Result<Catalog> {
    let mut raw: Vec<RawControl> = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Cannot read controls directory {:?}", dir))?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let framework = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        let json = fs::read_to_string(&path).await?;
        let controls = parse_catalog(&framework, &json)?;
        info!("Loaded {} controls from {:?}", controls.len(), path);
        raw.extend(controls);
    }
    Catalog::build(raw, ctx).await
}
