//! Patent landscape worker

use async_trait::async_trait;

use pharmos_protocol::AgentName;

use crate::capability::{AgentError, Capability, ContextSpec, TaskContext};
use crate::search::WebSearch;

pub struct PatentLandscapeCapability {
    search: WebSearch,
}

impl PatentLandscapeCapability {
    pub fn new(search: WebSearch) -> Self {
        Self { search }
    }

    fn query_for(molecule: &str) -> String {
        format!(
            "site:patents.google.com OR site:uspto.gov {molecule} patent expiry formulation"
        )
    }
}

#[async_trait]
impl Capability for PatentLandscapeCapability {
    fn name(&self) -> AgentName {
        AgentName::PatentLandscapeAgent
    }

    fn context_spec(&self) -> ContextSpec {
        ContextSpec::molecule()
    }

    async fn run(&self, ctx: &TaskContext) -> Result<String, AgentError> {
        let molecule = ctx.molecule_for(self.name())?;

        match self.search.search(&Self::query_for(molecule)).await {
            Ok(results) => Ok(format!(
                "Patent Search Results (Source: Google Patents/USPTO via Web):\n{results}"
            )),
            Err(err) => Ok(format!("Patent search failed: {err}")),
        }
    }
}
