//! Report synthesis
//!
//! Combines the original query and every tool output, in plan order, into a
//! single markdown narrative. Outputs are opaque text here: error strings
//! from degraded tasks are summarized as caveats, not hidden.

use secrecy::SecretString;

use pharmos_protocol::{AgentName, AgentOutputs, Message};
use pharmos_providers::{ModelClient, ModelResolver};

use crate::error::SynthesisError;

pub struct Synthesizer {
    resolver: ModelResolver,
}

impl Synthesizer {
    pub fn new(resolver: ModelResolver) -> Self {
        Self { resolver }
    }

    pub async fn synthesize(
        &self,
        query: &str,
        outputs: &AgentOutputs,
        api_key: &SecretString,
    ) -> Result<String, SynthesisError> {
        let backend = self.resolver.resolve(api_key).await?;
        tracing::debug!(model = backend.model(), sections = outputs.len(), "synthesizing report");

        let messages = [
            Message::system(
                "You are a Pharmaceutical Strategy Consultant writing for an executive audience.",
            ),
            Message::user(build_prompt(query, outputs)),
        ];

        let response = backend
            .chat(&messages)
            .await
            .map_err(SynthesisError::Generation)?;

        Ok(response.content)
    }
}

fn build_prompt(query: &str, outputs: &AgentOutputs) -> String {
    let has_trade_data = outputs.contains_key(&AgentName::EXIMTrendsAgent);
    let supply_chain_section = if has_trade_data {
        ", Supply Chain Risk"
    } else {
        ""
    };

    format!(
        "User Query: \"{query}\"\n\n\
         Data Gathered:\n{data}\n\n\
         Write a Strategic Innovation Story report in Markdown.\n\
         Include these sections: Executive Summary, Clinical & Competitive Landscape, \
         IP & Legal Risk, Commercial Viability{supply_chain_section}, Recommendation.\n\
         Where a section's data is an error message, state the gap as a caveat instead \
         of omitting the section.",
        data = serialize_outputs(outputs),
    )
}

/// Stable, human-readable serialization of the outputs mapping, preserving
/// plan order.
pub(crate) fn serialize_outputs(outputs: &AgentOutputs) -> String {
    outputs
        .iter()
        .map(|(name, output)| format!("### {name}\n{output}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs() -> AgentOutputs {
        let mut map = AgentOutputs::new();
        map.insert(AgentName::IQVIAInsightsAgent, "market data".to_string());
        map.insert(AgentName::EXIMTrendsAgent, "trade data".to_string());
        map
    }

    #[test]
    fn serialization_preserves_insertion_order() {
        let serialized = serialize_outputs(&outputs());
        let market = serialized.find("IQVIAInsightsAgent").unwrap();
        let trade = serialized.find("EXIMTrendsAgent").unwrap();
        assert!(market < trade);
        assert!(serialized.contains("### IQVIAInsightsAgent\nmarket data"));
    }

    #[test]
    fn prompt_requests_supply_chain_section_only_with_trade_data() {
        let with_trade = build_prompt("q", &outputs());
        assert!(with_trade.contains("Supply Chain Risk"));

        let mut no_trade = AgentOutputs::new();
        no_trade.insert(AgentName::IQVIAInsightsAgent, "market".to_string());
        let without = build_prompt("q", &no_trade);
        assert!(!without.contains("Supply Chain Risk"));
    }

    #[test]
    fn prompt_carries_query_and_data() {
        let prompt = build_prompt("Feasibility of Metformin", &outputs());
        assert!(prompt.contains("Feasibility of Metformin"));
        assert!(prompt.contains("market data"));
        assert!(prompt.contains("Executive Summary"));
        assert!(prompt.contains("Recommendation"));
    }
}
