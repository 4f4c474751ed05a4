//! Plan generation
//!
//! One structured-generation request per run: the backend is told the worker
//! catalog and must reply with a single JSON object matching the plan
//! schema. A reply that fails to parse or validate fails the run; there is
//! no retry.

use secrecy::SecretString;

use pharmos_protocol::{AgentName, Message, ResearchPlan};
use pharmos_providers::{ModelClient, ModelResolver};

use crate::error::PlanError;

pub struct PlanGenerator {
    resolver: ModelResolver,
}

impl PlanGenerator {
    pub fn new(resolver: ModelResolver) -> Self {
        Self { resolver }
    }

    pub async fn generate(
        &self,
        query: &str,
        api_key: &SecretString,
    ) -> Result<ResearchPlan, PlanError> {
        let backend = self.resolver.resolve(api_key).await?;
        tracing::debug!(model = backend.model(), "generating plan");

        let messages = [Message::system(system_prompt()), Message::user(query)];
        let response = backend
            .chat(&messages)
            .await
            .map_err(PlanError::Generation)?;

        parse_plan(response.text())
    }
}

fn system_prompt() -> String {
    let catalog = AgentName::ALL
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}. *{}:* {}", i + 1, name, name.purpose()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are the Master Orchestrator for a pharmaceutical innovation engine. \
         Analyze the strategic research query and break it down into a structured JSON \
         plan for your specialized worker agents.\n\n\
         ## Available Worker Agents and Capabilities:\n{catalog}\n\n\
         ## Task Instructions:\n\
         1. Fill all core research fields (molecule, indication, therapeutic_area, research_goal).\n\
         2. Select the necessary agents for the required_agents list.\n\
         3. Write a unique, specific instruction for every selected agent.\n\n\
         Reply with a single JSON object and nothing else, shaped as:\n\
         {{\"molecule\": \"...\", \"indication\": \"...\", \"therapeutic_area\": \"...\", \
         \"research_goal\": \"...\", \"required_agents\": \
         [{{\"agent_name\": \"...\", \"specific_instruction\": \"...\"}}]}}"
    )
}

/// Parse the raw model reply into a validated plan.
pub(crate) fn parse_plan(raw: &str) -> Result<ResearchPlan, PlanError> {
    let json = extract_json_object(raw).ok_or_else(|| PlanError::Schema {
        reason: "no JSON object in reply".to_string(),
        raw: raw.to_string(),
    })?;

    let plan: ResearchPlan = serde_json::from_str(json).map_err(|e| PlanError::Schema {
        reason: e.to_string(),
        raw: raw.to_string(),
    })?;

    plan.validate()?;
    Ok(plan)
}

/// Locate the JSON object in a reply that may be wrapped in prose or a
/// fenced code block.
fn extract_json_object(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();

    let inner = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.split("```").next().unwrap_or(rest)
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.split("```").next().unwrap_or(rest)
    } else {
        trimmed
    };

    let start = inner.find('{')?;
    let end = inner.rfind('}')?;
    (end > start).then(|| &inner[start..=end])
}
