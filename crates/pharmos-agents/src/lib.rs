//! Worker capabilities for the Pharmos research pipeline.
//!
//! Each worker implements the `Capability` trait and declares the plan
//! fields it needs via `ContextSpec`. Network-backed workers carry two data
//! sources (live and deterministic simulator) selected by `DataMode`.

pub mod capability;
pub mod clinical;
pub mod market;
pub mod patents;
pub mod registry;
pub mod search;
mod sim;
pub mod trade;
pub mod web_intel;

pub use capability::{AgentError, Capability, ContextSpec, TaskContext};
pub use clinical::{ClinicalTrialsCapability, TrialRegistry};
pub use market::MarketInsightsCapability;
pub use patents::PatentLandscapeCapability;
pub use registry::{CapabilityRegistry, DataMode};
pub use search::WebSearch;
pub use trade::TradeFlowsCapability;
pub use web_intel::WebIntelligenceCapability;
