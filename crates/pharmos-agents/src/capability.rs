//! Worker capability contract
//!
//! Every worker declares which plan fields it needs through `ContextSpec`;
//! the dispatcher assembles a `TaskContext` generically from that declaration
//! instead of special-casing agent names at the call site.

use async_trait::async_trait;
use thiserror::Error;

use pharmos_protocol::AgentName;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("missing {field} in task context for {agent}")]
    MissingContext {
        agent: AgentName,
        field: &'static str,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream returned status {status}")]
    UpstreamStatus { status: u16 },

    #[error("{0}")]
    Other(String),
}

/// Which of the plan's domain fields a capability requires. The specific
/// instruction is always provided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextSpec {
    pub molecule: bool,
    pub indication: bool,
    pub therapeutic_area: bool,
}

impl ContextSpec {
    pub const NONE: ContextSpec = ContextSpec {
        molecule: false,
        indication: false,
        therapeutic_area: false,
    };

    pub fn molecule() -> Self {
        Self {
            molecule: true,
            ..Self::NONE
        }
    }

    pub fn molecule_and_indication() -> Self {
        Self {
            molecule: true,
            indication: true,
            ..Self::NONE
        }
    }

    pub fn therapeutic_area() -> Self {
        Self {
            therapeutic_area: true,
            ..Self::NONE
        }
    }
}

/// Per-task context assembled by the dispatcher from the plan and the
/// capability's `ContextSpec`.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    pub instruction: String,
    pub molecule: Option<String>,
    pub indication: Option<String>,
    pub therapeutic_area: Option<String>,
}

impl TaskContext {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            ..Default::default()
        }
    }

    pub fn molecule_for(&self, agent: AgentName) -> Result<&str, AgentError> {
        self.molecule
            .as_deref()
            .ok_or(AgentError::MissingContext {
                agent,
                field: "molecule",
            })
    }

    pub fn indication_for(&self, agent: AgentName) -> Result<&str, AgentError> {
        self.indication
            .as_deref()
            .ok_or(AgentError::MissingContext {
                agent,
                field: "indication",
            })
    }

    pub fn therapeutic_area_for(&self, agent: AgentName) -> Result<&str, AgentError> {
        self.therapeutic_area
            .as_deref()
            .ok_or(AgentError::MissingContext {
                agent,
                field: "therapeutic_area",
            })
    }
}

/// A named, independently invokable unit of domain data gathering.
///
/// Implementations are expected to be self-fallback-safe: when their own
/// external dependency is down they return a clearly labeled degraded answer
/// instead of an error. The dispatcher still isolates anything that escapes.
#[async_trait]
pub trait Capability: Send + Sync {
    fn name(&self) -> AgentName;

    fn context_spec(&self) -> ContextSpec;

    async fn run(&self, ctx: &TaskContext) -> Result<String, AgentError>;
}
