//! Capability registry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use pharmos_protocol::AgentName;

use crate::capability::Capability;
use crate::clinical::{ClinicalTrialsCapability, TrialRegistry};
use crate::market::MarketInsightsCapability;
use crate::patents::PatentLandscapeCapability;
use crate::search::WebSearch;
use crate::trade::TradeFlowsCapability;
use crate::web_intel::WebIntelligenceCapability;

/// Data-source selection for the network-backed workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataMode {
    #[default]
    Live,
    /// Deterministic simulators only; no network traffic.
    Simulated,
}

/// Static table mapping worker names to callables.
///
/// `InternalKnowledgeAgent` is deliberately not registered here: the
/// dispatcher routes it to the knowledge base it was constructed with.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    capabilities: HashMap<AgentName, Arc<dyn Capability>>,
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.names())
            .finish()
    }
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard worker catalog.
    pub fn with_defaults(mode: DataMode) -> Self {
        let (trials, search) = match mode {
            DataMode::Live => (TrialRegistry::live(), WebSearch::live()),
            DataMode::Simulated => (TrialRegistry::Simulated, WebSearch::Simulated),
        };

        let mut registry = Self::new();
        registry.register(Arc::new(ClinicalTrialsCapability::new(trials)));
        registry.register(Arc::new(PatentLandscapeCapability::new(search.clone())));
        registry.register(Arc::new(MarketInsightsCapability::new()));
        registry.register(Arc::new(TradeFlowsCapability::new()));
        registry.register(Arc::new(WebIntelligenceCapability::new(search)));
        registry
    }

    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        self.capabilities.insert(capability.name(), capability);
    }

    pub fn get(&self, name: AgentName) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(&name).cloned()
    }

    pub fn contains(&self, name: AgentName) -> bool {
        self.capabilities.contains_key(&name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut out: Vec<_> = self.capabilities.keys().map(|n| n.to_string()).collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_the_catalog_except_internal_knowledge() {
        let registry = CapabilityRegistry::with_defaults(DataMode::Simulated);
        assert_eq!(registry.len(), 5);
        assert!(registry.contains(AgentName::ClinicalTrialsAgent));
        assert!(registry.contains(AgentName::IQVIAInsightsAgent));
        assert!(registry.contains(AgentName::PatentLandscapeAgent));
        assert!(registry.contains(AgentName::EXIMTrendsAgent));
        assert!(registry.contains(AgentName::WebIntelligenceAgent));
        assert!(!registry.contains(AgentName::InternalKnowledgeAgent));
    }

    #[test]
    fn names_are_sorted() {
        let registry = CapabilityRegistry::with_defaults(DataMode::Simulated);
        let names = registry.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
