use crate::schema::PharmosConfig;
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Jsonc,
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;

        match ext {
            "jsonc" => Some(Self::Jsonc),
            "json" => Some(Self::Json),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: PharmosConfig,
    pub path: PathBuf,
    pub format: ConfigFormat,
}

/// Load configuration from an explicit path or the first discovered
/// candidate; falls back to defaults when nothing is found.
pub fn load_config(config_path: Option<&Path>) -> Result<PharmosConfig> {
    match config_path {
        Some(path) => load_config_from_file(path).map(|r| r.config),
        None => match find_config_file() {
            Some(path) => load_config_from_file(&path).map(|r| r.config),
            None => Ok(PharmosConfig::default()),
        },
    }
}

pub fn load_config_from_file(path: &Path) -> Result<ResolvedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| anyhow!("Unknown config format for: {}", path.display()))?;

    let config = parse_config_content(&content, format)?;

    Ok(ResolvedConfig {
        config: expand_env_vars(config),
        path: path.to_path_buf(),
        format,
    })
}

fn parse_config_content(content: &str, format: ConfigFormat) -> Result<PharmosConfig> {
    match format {
        ConfigFormat::Jsonc => json5::from_str(content).context("Failed to parse JSONC"),
        ConfigFormat::Json => serde_json::from_str(content).context("Failed to parse JSON"),
        ConfigFormat::Yaml => serde_yaml_ng::from_str(content).context("Failed to parse YAML"),
    }
}

const CONFIG_CANDIDATES: &[&str] = &[
    "pharmos.jsonc",
    "pharmos.json",
    "pharmos.yml",
    "pharmos.yaml",
    ".pharmos.jsonc",
    ".pharmos.json",
    ".pharmos.yml",
    ".pharmos.yaml",
];

fn find_config_file() -> Option<PathBuf> {
    for candidate in CONFIG_CANDIDATES {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        for candidate in CONFIG_CANDIDATES {
            let path = config_dir.join("pharmos").join(candidate);
            if path.exists() {
                return Some(path);
            }
        }
    }

    None
}

/// Resolve the backend credential: configured value first (after env
/// expansion), then the `GEMINI_API_KEY` environment variable.
pub fn resolve_api_key(config: &PharmosConfig) -> Result<SecretString> {
    if let Some(key) = config.provider.api_key.as_deref() {
        let trimmed = key.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('$') {
            return Ok(SecretString::from(trimmed.to_string()));
        }
    }

    env::var("GEMINI_API_KEY")
        .map(SecretString::from)
        .map_err(|_| {
            anyhow!(
                "No API key configured. Set provider.api_key in the config file \
                 or export GEMINI_API_KEY."
            )
        })
}

fn expand_env_vars(mut config: PharmosConfig) -> PharmosConfig {
    if let Some(key) = config.provider.api_key.take() {
        config.provider.api_key = Some(expand_env_string(&key));
    }
    config.provider.model_candidates = config
        .provider
        .model_candidates
        .iter()
        .map(|m| expand_env_string(m))
        .collect();
    config
}

fn expand_env_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            if chars.peek() == Some(&'{') {
                // ${VAR} syntax
                chars.next(); // consume '{'
                let var_name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                if let Ok(value) = env::var(&var_name) {
                    result.push_str(&value);
                } else {
                    result.push('$');
                    result.push('{');
                    result.push_str(&var_name);
                    result.push('}');
                }
            } else {
                // $VAR syntax - use peek() to avoid consuming the delimiter
                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        var_name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !var_name.is_empty() {
                    if let Ok(value) = env::var(&var_name) {
                        result.push_str(&value);
                    } else {
                        result.push('$');
                        result.push_str(&var_name);
                    }
                } else {
                    result.push('$');
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataModeSetting;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[test]
    fn format_detection_by_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("pharmos.jsonc")),
            Some(ConfigFormat::Jsonc)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("pharmos.yaml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("pharmos.toml")), None);
    }

    #[test]
    fn loads_yaml_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pharmos.yml");
        fs::write(
            &path,
            "provider:\n  model_candidates: [only-model]\nworkers:\n  data_mode: simulated\n",
        )
        .unwrap();

        let resolved = load_config_from_file(&path).unwrap();
        assert_eq!(resolved.format, ConfigFormat::Yaml);
        assert_eq!(resolved.config.provider.model_candidates, vec!["only-model"]);
        assert_eq!(resolved.config.workers.data_mode, DataModeSetting::Simulated);
    }

    #[test]
    fn loads_jsonc_with_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pharmos.jsonc");
        fs::write(
            &path,
            "{\n  // backend settings\n  \"provider\": { \"probe_timeout_seconds\": 5 }\n}",
        )
        .unwrap();

        let resolved = load_config_from_file(&path).unwrap();
        assert_eq!(resolved.config.provider.probe_timeout_seconds, 5);
    }

    #[test]
    fn expands_env_vars_in_api_key() {
        env::set_var("PHARMOS_TEST_KEY", "secret-from-env");
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pharmos.json");
        fs::write(&path, "{\"provider\": {\"api_key\": \"${PHARMOS_TEST_KEY}\"}}").unwrap();

        let resolved = load_config_from_file(&path).unwrap();
        assert_eq!(
            resolved.config.provider.api_key.as_deref(),
            Some("secret-from-env")
        );
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/pharmos.json")));
        assert!(result.is_err());
    }

    #[test]
    fn api_key_resolution_prefers_config_value() {
        let mut config = PharmosConfig::default();
        config.provider.api_key = Some("configured-key".to_string());
        let key = resolve_api_key(&config).unwrap();
        assert_eq!(key.expose_secret(), "configured-key");
    }

    #[test]
    fn api_key_falls_back_to_environment() {
        env::set_var("GEMINI_API_KEY", "env-key");
        let config = PharmosConfig::default();
        let key = resolve_api_key(&config).unwrap();
        assert_eq!(key.expose_secret(), "env-key");
        env::remove_var("GEMINI_API_KEY");
    }
}
