//! Research plan schema
//!
//! The plan is produced once per run by the planning stage and is immutable
//! afterwards. `AgentName` is a closed catalog: a name outside the set fails
//! deserialization instead of being silently accepted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed catalog of worker capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentName {
    ClinicalTrialsAgent,
    IQVIAInsightsAgent,
    PatentLandscapeAgent,
    EXIMTrendsAgent,
    WebIntelligenceAgent,
    InternalKnowledgeAgent,
}

impl AgentName {
    pub const ALL: [AgentName; 6] = [
        AgentName::ClinicalTrialsAgent,
        AgentName::IQVIAInsightsAgent,
        AgentName::PatentLandscapeAgent,
        AgentName::EXIMTrendsAgent,
        AgentName::WebIntelligenceAgent,
        AgentName::InternalKnowledgeAgent,
    ];

    /// One-line purpose, used in the planner prompt and the catalog listing
    pub fn purpose(&self) -> &'static str {
        match self {
            Self::ClinicalTrialsAgent => {
                "Analyzes the competitive pipeline using data from ClinicalTrials.gov."
            }
            Self::IQVIAInsightsAgent => {
                "Provides commercial viability analysis using IQVIA-style market data."
            }
            Self::PatentLandscapeAgent => {
                "Assesses intellectual property risk using patent filings."
            }
            Self::EXIMTrendsAgent => {
                "Analyzes API export-import trade data for supply chain stability."
            }
            Self::WebIntelligenceAgent => {
                "Performs real-time web search for external scientific rationale."
            }
            Self::InternalKnowledgeAgent => {
                "Summarizes internal documents to assess strategic fit."
            }
        }
    }
}

impl std::fmt::Display for AgentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClinicalTrialsAgent => write!(f, "ClinicalTrialsAgent"),
            Self::IQVIAInsightsAgent => write!(f, "IQVIAInsightsAgent"),
            Self::PatentLandscapeAgent => write!(f, "PatentLandscapeAgent"),
            Self::EXIMTrendsAgent => write!(f, "EXIMTrendsAgent"),
            Self::WebIntelligenceAgent => write!(f, "WebIntelligenceAgent"),
            Self::InternalKnowledgeAgent => write!(f, "InternalKnowledgeAgent"),
        }
    }
}

/// One unit of dispatch work within a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTask {
    pub agent_name: AgentName,
    /// Precise instruction for the worker; must be non-empty
    pub specific_instruction: String,
}

/// Structured execution plan derived from a free-text research query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// Primary subject entity of the research query
    pub molecule: String,
    /// Target disease or condition
    pub indication: String,
    /// Broad domain classification, used for context routing
    pub therapeutic_area: String,
    /// Free-text summary of the overall objective
    pub research_goal: String,
    /// Dispatch work list; order defines execution and display order
    pub required_agents: Vec<AgentTask>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanValidationError {
    #[error("plan selects no agents")]
    NoAgents,
    #[error("blank instruction for {0}")]
    BlankInstruction(AgentName),
    #[error("agent {0} appears more than once")]
    DuplicateAgent(AgentName),
}

impl ResearchPlan {
    /// Structural validation beyond what deserialization enforces
    pub fn validate(&self) -> Result<(), PlanValidationError> {
        if self.required_agents.is_empty() {
            return Err(PlanValidationError::NoAgents);
        }
        let mut seen = std::collections::HashSet::new();
        for task in &self.required_agents {
            if task.specific_instruction.trim().is_empty() {
                return Err(PlanValidationError::BlankInstruction(task.agent_name));
            }
            if !seen.insert(task.agent_name) {
                return Err(PlanValidationError::DuplicateAgent(task.agent_name));
            }
        }
        Ok(())
    }

    /// Agent names in plan order
    pub fn agent_names(&self) -> Vec<AgentName> {
        self.required_agents.iter().map(|t| t.agent_name).collect()
    }
}

/// Outputs mapping produced by the dispatch stage; insertion order is the
/// plan order.
pub type AgentOutputs = IndexMap<AgentName, String>;
