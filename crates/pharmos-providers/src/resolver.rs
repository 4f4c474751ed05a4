//! Resilient backend model resolver
//!
//! Walks an ordered list of candidate model identifiers, probing each with a
//! minimal generation request, and commits to the first one that answers.
//! Model availability varies per account and region, so a single hardcoded
//! model name is the most common way for a run to die; the probe trades one
//! extra round trip for never hard-failing on that.

use secrecy::SecretString;
use std::sync::Arc;
use thiserror::Error;

use pharmos_protocol::Message;

use crate::{GeminiClient, ModelClient, ProviderConfig, ProviderError};

/// Default candidate order: most capable/cheapest first, most stable last.
pub const DEFAULT_MODEL_CANDIDATES: [&str; 3] =
    ["gemini-1.5-flash", "gemini-1.5-pro", "gemini-pro"];

const PROBE_PROMPT: &str = "ping";
const PROBE_MAX_TOKENS: usize = 8;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no usable generation backend: last candidate failed with {last}")]
    BackendUnavailable {
        #[source]
        last: ProviderError,
    },

    #[error("no backend candidates configured")]
    NoCandidates,
}

/// Selects a working generation backend from an ordered candidate list.
#[derive(Debug, Clone)]
pub struct ModelResolver {
    candidates: Vec<String>,
    base_url: Option<String>,
    timeout_seconds: u64,
}

impl Default for ModelResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_CANDIDATES.iter().map(|s| s.to_string()))
    }
}

impl ModelResolver {
    pub fn new(candidates: impl IntoIterator<Item = String>) -> Self {
        Self {
            candidates: candidates.into_iter().collect(),
            base_url: None,
            timeout_seconds: 30,
        }
    }

    /// Override the API base URL, used by tests to point at a mock server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_probe_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Probe candidates in order and return the first working handle.
    ///
    /// Resolution is not cached: availability can change between runs, so
    /// every run re-resolves.
    pub async fn resolve(
        &self,
        api_key: &SecretString,
    ) -> Result<Arc<dyn ModelClient>, ResolveError> {
        let mut last_error: Option<ProviderError> = None;

        for candidate in &self.candidates {
            let mut config = ProviderConfig::gemini(api_key.clone(), candidate.clone())
                .with_max_tokens(PROBE_MAX_TOKENS)
                .with_timeout(self.timeout_seconds);
            if let Some(url) = &self.base_url {
                config = config.with_base_url(url.clone());
            }

            let client = match GeminiClient::new(config) {
                Ok(client) => client,
                Err(err) => {
                    tracing::warn!(model = %candidate, error = %err, "candidate rejected at construction");
                    last_error = Some(err);
                    continue;
                }
            };

            match client.chat(&[Message::user(PROBE_PROMPT)]).await {
                Ok(_) => {
                    tracing::info!(model = %candidate, "backend resolved");
                    // Rebuild without the probe's token cap for real traffic.
                    let mut config =
                        ProviderConfig::gemini(api_key.clone(), candidate.clone());
                    if let Some(url) = &self.base_url {
                        config = config.with_base_url(url.clone());
                    }
                    let handle = GeminiClient::new(config)
                        .map_err(|err| ResolveError::BackendUnavailable { last: err })?;
                    return Ok(Arc::new(handle));
                }
                Err(err) => {
                    tracing::warn!(model = %candidate, error = %err, "candidate probe failed");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(last) => Err(ResolveError::BackendUnavailable { last }),
            None => Err(ResolveError::NoCandidates),
        }
    }
}
