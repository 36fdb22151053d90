// Reconciles `[models]` with the models the server currently has loaded.

use crate::config::{Config, ConfigFile, DEFAULT_TIMEOUT_SECS, ModelProfile};
use crate::error::{self, Result};
use crate::http::HttpClient;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timeout for the `/models` introspection call.
pub const LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// A model reported by `GET /models`.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveModel {
    pub id: String,
    pub display_name: String,
    pub raw: serde_json::Value,
}

impl LiveModel {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let raw = serde_json::json!({ "id": id.clone() });
        Self::with_raw(id, raw)
    }

    fn with_raw(id: String, raw: serde_json::Value) -> Self {
        Self {
            display_name: display_name(&id),
            id,
            raw,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// `openai/` dropped, remaining `/` turned into `-`.
pub fn display_name(id: &str) -> String {
    id.replace("openai/", "").replace('/', "-")
}

/// Lowercase, with everything outside `[a-z0-9_]` replaced by `_`.
pub fn key_base(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `base`, or `base_1`, `base_2`, ... whichever is the first not `taken`.
pub fn unique_key(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultChange {
    Unchanged,
    Repointed { from: String, to: String },
    Cleared { from: String },
}

/// What a sync did, as `(key, model id)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub kept: Vec<(String, String)>,
    pub removed: Vec<(String, String)>,
    pub added: Vec<(String, String)>,
    pub default_change: DefaultChange,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Server reported no models; the file was left alone.
    NothingToSync,
    Synced(SyncReport),
}

/// Rewrite `config.models` so it matches `live`, then repair the default.
pub fn reconcile(config: &mut Config, live: &[LiveModel]) -> SyncReport {
    let previous = std::mem::take(&mut config.models);
    let mut kept = Vec::new();
    let mut removed = Vec::new();

    for (key, profile) in previous {
        if live.iter().any(|m| m.id == profile.name) {
            kept.push((key.clone(), profile.name.clone()));
            config.models.insert(key, profile);
        } else {
            warn!(%key, model = %profile.name, "removing model not loaded on server");
            removed.push((key, profile.name));
        }
    }

    let mut added = Vec::new();
    for model in live {
        if config.models.values().any(|p| p.name == model.id) {
            continue;
        }
        let key = unique_key(&key_base(&model.display_name), |k| {
            config.models.contains_key(k)
        });
        debug!(%key, model = %model.id, "adding discovered model");
        config.models.insert(
            key.clone(),
            ModelProfile::new(
                model.id.clone(),
                DEFAULT_TIMEOUT_SECS,
                format!("Auto-detected: {}", model.display_name),
            ),
        );
        added.push((key, model.id.clone()));
    }

    let default_change = repair_default(config);

    SyncReport {
        kept,
        removed,
        added,
        default_change,
        total: config.models.len(),
    }
}

fn repair_default(config: &mut Config) -> DefaultChange {
    let Some(current) = config.settings.default_model.clone() else {
        return DefaultChange::Unchanged;
    };
    if config.models.contains_key(&current) {
        return DefaultChange::Unchanged;
    }

    match config.models.keys().next().cloned() {
        Some(first) => {
            info!(from = %current, to = %first, "default model re-pointed");
            config.settings.default_model = Some(first.clone());
            DefaultChange::Repointed {
                from: current,
                to: first,
            }
        }
        None => {
            warn!(from = %current, "no models left, clearing default model");
            config.settings.default_model = None;
            DefaultChange::Cleared { from: current }
        }
    }
}

/// Query `GET {base_url}/models`.
pub async fn fetch_live_models(base_url: &str) -> Result<Vec<LiveModel>> {
    let http = HttpClient::new(base_url, LIST_TIMEOUT)?;
    let resp: ModelsResponse = http.get_json("models").await?;
    let models = parse_live_models(resp);
    debug!(count = models.len(), "fetched live models");
    Ok(models)
}

/// Entries without a usable `id` are skipped.
pub fn parse_live_models(resp: ModelsResponse) -> Vec<LiveModel> {
    resp.data
        .into_iter()
        .filter_map(|raw| {
            let id = raw.get("id").and_then(|v| v.as_str())?.to_string();
            if id.is_empty() {
                return None;
            }
            Some(LiveModel::with_raw(id, raw))
        })
        .collect()
}

/// Load, fetch, reconcile, save.
pub async fn sync_config(file: &ConfigFile) -> Result<SyncOutcome> {
    let mut config = file.load()?;
    let live = fetch_live_models(config.lm_studio.base_url()).await?;
    if live.is_empty() {
        return Ok(SyncOutcome::NothingToSync);
    }

    let report = reconcile(&mut config, &live);
    file.save(&config)?;
    info!(
        kept = report.kept.len(),
        removed = report.removed.len(),
        added = report.added.len(),
        "synced model profiles"
    );
    Ok(SyncOutcome::Synced(report))
}

pub fn help() -> &'static str {
    "# LM Studio Model Sync Utility\n\n\
     Usage:\n  \
     hello-crew sync list    - List models available in LM Studio\n  \
     hello-crew sync sync    - Sync LM Studio models to the config file\n"
}

async fn list_command(config_path: &Path) -> String {
    let mut out = String::new();
    let models = match ConfigFile::locate(config_path).and_then(|f| f.load()) {
        Ok(config) => match fetch_live_models(config.lm_studio.base_url()).await {
            Ok(models) => models,
            Err(e) => {
                out.push_str(&error::report(&e));
                Vec::new()
            }
        },
        Err(e) => {
            out.push_str(&error::report(&e));
            Vec::new()
        }
    };
    out.push_str(&render_live_models(&models));
    out
}

async fn sync_command(config_path: &Path) -> String {
    let outcome = match ConfigFile::locate(config_path) {
        Ok(file) => sync_config(&file).await,
        Err(e) => Err(e),
    };
    let mut out = match outcome {
        Ok(SyncOutcome::Synced(report)) => render_report(&report),
        Ok(SyncOutcome::NothingToSync) => "No models to sync.\n".to_string(),
        Err(e) => format!("{}No models to sync.\n", error::report(&e)),
    };
    out.push_str("\nYou can now run:\n  hello-crew switch list\n");
    out
}

/// Handle one sync invocation (`list`, `sync`, `help`) and return what to print.
pub async fn run(config_path: &Path, action: Option<&str>) -> String {
    match action {
        None | Some("help" | "--help" | "-h") => format!("{}\n", help()),
        Some("list") => list_command(config_path).await,
        Some("sync") => sync_command(config_path).await,
        Some(other) => format!("* ERROR: Unknown command '{other}'\n\n{}\n", help()),
    }
}

pub fn render_live_models(models: &[LiveModel]) -> String {
    let mut out = String::from("# Models available in LM Studio:\n\n");
    if models.is_empty() {
        out.push_str("No models found or LM Studio not accessible.\n");
        return out;
    }
    for (i, model) in models.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, model.display_name);
        let _ = writeln!(out, "     ID: {}", model.id);
        out.push('\n');
    }
    out
}

pub fn render_report(report: &SyncReport) -> String {
    let mut out = String::from("# Syncing models from LM Studio to config...\n\n");
    for (key, name) in &report.kept {
        let _ = writeln!(out, "✓ Kept existing model: {key} ({name})");
    }
    for (key, name) in &report.removed {
        let _ = writeln!(out, "⚠ Removed model (not in LM Studio): {key} ({name})");
    }
    for (key, name) in &report.added {
        let _ = writeln!(out, "+ Added new model: {key} ({name})");
    }
    match &report.default_change {
        DefaultChange::Unchanged => {}
        DefaultChange::Repointed { to, .. } => {
            let _ = writeln!(out, "! Updated default model to: {to}");
        }
        DefaultChange::Cleared { .. } => {
            out.push_str("! Warning: No models available, cleared default model\n");
        }
    }
    let _ = write!(
        out,
        "\n✓ Configuration updated with {} models\n",
        report.total
    );
    out
}
