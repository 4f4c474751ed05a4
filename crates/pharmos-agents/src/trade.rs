//! API export-import trade flows worker (deterministic simulator)

use async_trait::async_trait;

use pharmos_protocol::AgentName;

use crate::capability::{AgentError, Capability, ContextSpec, TaskContext};
use crate::sim::{stable_choice, stable_hash, stable_range};

const COUNTRIES: [&str; 4] = ["China", "India", "Germany", "USA"];
const RISK_LEVELS: [&str; 3] = ["Low", "Medium", "High"];

pub struct TradeFlowsCapability;

impl TradeFlowsCapability {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TradeFlowsCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Capability for TradeFlowsCapability {
    fn name(&self) -> AgentName {
        AgentName::EXIMTrendsAgent
    }

    fn context_spec(&self) -> ContextSpec {
        ContextSpec::molecule()
    }

    async fn run(&self, ctx: &TaskContext) -> Result<String, AgentError> {
        let molecule = ctx.molecule_for(self.name())?;

        let hub = stable_choice(molecule, &COUNTRIES);
        let risk = stable_choice(&format!("{molecule}/risk"), &RISK_LEVELS);
        let volume = stable_range(molecule, 50, 500);

        // Two distinct exporters, hub-independent but stable per molecule.
        let first = (stable_hash(molecule) as usize) % COUNTRIES.len();
        let second = (first + 1 + (stable_hash(molecule) as usize / 7) % (COUNTRIES.len() - 1))
            % COUNTRIES.len();
        let exporters = [COUNTRIES[first], COUNTRIES[second]];

        let report = serde_json::json!({
            "molecule": molecule,
            "primary_sourcing_hub": hub,
            "import_volume_metric_tons": volume,
            "supply_chain_risk": risk,
            "major_exporters": exporters,
        });

        serde_json::to_string_pretty(&report)
            .map_err(|e| AgentError::Other(format!("serialization failed: {e}")))
    }
}
