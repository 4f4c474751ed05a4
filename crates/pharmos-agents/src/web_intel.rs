//! Web intelligence worker

use async_trait::async_trait;

use pharmos_protocol::AgentName;

use crate::capability::{AgentError, Capability, ContextSpec, TaskContext};
use crate::search::WebSearch;

pub struct WebIntelligenceCapability {
    search: WebSearch,
}

impl WebIntelligenceCapability {
    pub fn new(search: WebSearch) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Capability for WebIntelligenceCapability {
    fn name(&self) -> AgentName {
        AgentName::WebIntelligenceAgent
    }

    fn context_spec(&self) -> ContextSpec {
        ContextSpec::NONE
    }

    async fn run(&self, ctx: &TaskContext) -> Result<String, AgentError> {
        match self.search.search(&ctx.instruction).await {
            Ok(results) => Ok(results),
            Err(err) => Ok(format!("Web search failed: {err}")),
        }
    }
}
