//! Shared web-search data source
//!
//! Backs both the patent-landscape and web-intelligence workers. The live
//! variant uses the DuckDuckGo instant-answer endpoint; the simulated variant
//! returns a deterministic, clearly labeled stand-in.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::capability::AgentError;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://api.duckduckgo.com";

const SEARCH_TIMEOUT_SECS: u64 = 10;
const MAX_TOPICS: usize = 5;

#[derive(Clone)]
pub enum WebSearch {
    Live(LiveSearch),
    Simulated,
}

impl WebSearch {
    pub fn live() -> Self {
        Self::Live(LiveSearch::new(DEFAULT_SEARCH_BASE_URL))
    }

    pub fn live_with_base_url(base_url: impl Into<String>) -> Self {
        Self::Live(LiveSearch::new(base_url))
    }

    pub async fn search(&self, query: &str) -> Result<String, AgentError> {
        match self {
            Self::Live(live) => live.search(query).await,
            Self::Simulated => Ok(format!(
                "[Simulated search] Representative findings for \"{}\": published literature \
                 and registry entries consistent with the query; no live sources consulted.",
                query
            )),
        }
    }
}

#[derive(Clone)]
pub struct LiveSearch {
    client: Client,
    base_url: String,
}

impl LiveSearch {
    fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn search(&self, query: &str) -> Result<String, AgentError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AgentError::UpstreamStatus {
                status: response.status().as_u16(),
            });
        }

        let answer: InstantAnswer = response.json().await?;
        let mut lines = Vec::new();

        if !answer.abstract_text.is_empty() {
            lines.push(answer.abstract_text);
        }
        for topic in answer.related_topics.into_iter().take(MAX_TOPICS) {
            if let Some(text) = topic.text {
                lines.push(format!("- {}", text));
            }
        }

        if lines.is_empty() {
            Ok(format!("No search results found for \"{}\".", query))
        } else {
            Ok(lines.join("\n"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
struct RelatedTopic {
    #[serde(rename = "Text", default)]
    text: Option<String>,
}
