use serde::{Deserialize, Serialize};

/// Main Pharmos configuration
///
/// Configuration is loaded from (in priority order):
/// 1. `pharmos.jsonc` - JSON with comments
/// 2. `pharmos.json` - Standard JSON
/// 3. `pharmos.yml` / `pharmos.yaml` - YAML format
///
/// Also checks hidden variants (`.pharmos.*`) and `~/.config/pharmos/` for
/// global config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PharmosConfig {
    /// Generation backend settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Worker dispatch settings
    #[serde(default)]
    pub workers: WorkerSettings,
}

/// Generation backend settings
///
/// # Example
///
/// ```yaml
/// provider:
///   api_key: $GEMINI_API_KEY
///   model_candidates:
///     - gemini-1.5-flash
///     - gemini-1.5-pro
///     - gemini-pro
///   probe_timeout_seconds: 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API key, or a `$VAR` reference expanded at load time. When absent the
    /// `GEMINI_API_KEY` environment variable is consulted.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Ordered backend candidates, most capable first.
    #[serde(default = "default_model_candidates")]
    pub model_candidates: Vec<String>,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model_candidates: default_model_candidates(),
            probe_timeout_seconds: default_probe_timeout(),
        }
    }
}

/// Worker dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// `live` hits real registries and search endpoints; `simulated` keeps
    /// every worker deterministic and offline.
    #[serde(default)]
    pub data_mode: DataModeSetting,

    #[serde(default = "default_task_timeout")]
    pub task_timeout_seconds: u64,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            data_mode: DataModeSetting::default(),
            task_timeout_seconds: default_task_timeout(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataModeSetting {
    #[default]
    Live,
    Simulated,
}

fn default_model_candidates() -> Vec<String> {
    vec![
        "gemini-1.5-flash".to_string(),
        "gemini-1.5-pro".to_string(),
        "gemini-pro".to_string(),
    ]
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_task_timeout() -> u64 {
    45
}

fn default_max_concurrency() -> usize {
    4
}
