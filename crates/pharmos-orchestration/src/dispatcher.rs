//! Plan dispatch
//!
//! Iterates the plan's task list, resolves each task against the capability
//! registry (or the knowledge base for internal-knowledge tasks), and
//! isolates every per-task failure into an error-describing output string.
//! One broken integration degrades one section of the report, never the run.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use pharmos_agents::{Capability, CapabilityRegistry, ContextSpec, TaskContext};
use pharmos_protocol::{AgentName, AgentOutputs, AgentTask, ResearchPlan};
use pharmos_retrieval::KnowledgeBase;

use crate::control::RunControl;
use crate::error::DispatchError;

pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(45);
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// The string recorded when a planned agent has no registry entry.
pub const AGENT_NOT_FOUND: &str = "Error: Agent not found.";

pub struct Dispatcher {
    registry: CapabilityRegistry,
    knowledge: Arc<dyn KnowledgeBase>,
    task_timeout: Duration,
    max_concurrency: usize,
}

impl Dispatcher {
    pub fn new(registry: CapabilityRegistry, knowledge: Arc<dyn KnowledgeBase>) -> Self {
        Self {
            registry,
            knowledge,
            task_timeout: DEFAULT_TASK_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit.max(1);
        self
    }

    pub async fn execute(&self, plan: &ResearchPlan) -> Result<AgentOutputs, DispatchError> {
        self.execute_with_control(plan, &RunControl::new()).await
    }

    /// Execute every task, bounded-concurrently, preserving plan order in
    /// the returned mapping. Returns an error only for a structurally
    /// invalid plan.
    pub async fn execute_with_control(
        &self,
        plan: &ResearchPlan,
        control: &RunControl,
    ) -> Result<AgentOutputs, DispatchError> {
        if plan.required_agents.is_empty() {
            return Err(DispatchError::EmptyPlan);
        }

        let results: Vec<(AgentName, String)> = stream::iter(plan.required_agents.iter())
            .map(|task| self.run_task(plan, task, control))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut outputs = AgentOutputs::new();
        for (name, output) in results {
            outputs.insert(name, output);
        }
        Ok(outputs)
    }

    async fn run_task(
        &self,
        plan: &ResearchPlan,
        task: &AgentTask,
        control: &RunControl,
    ) -> (AgentName, String) {
        let name = task.agent_name;

        if control.is_cancelled() {
            return (name, "Task skipped: run cancelled.".to_string());
        }

        tracing::debug!(agent = %name, "dispatching task");

        let output = if name == AgentName::InternalKnowledgeAgent {
            // Retrieval collaborator; a missing index yields its own
            // informative sentinel, not an error.
            let knowledge = Arc::clone(&self.knowledge);
            let instruction = task.specific_instruction.clone();
            self.bounded(name, async move { Ok(knowledge.query(&instruction).await) })
                .await
        } else {
            match self.registry.get(name) {
                None => AGENT_NOT_FOUND.to_string(),
                Some(capability) => {
                    let ctx = build_context(plan, task, capability.context_spec());
                    self.bounded(name, async move { capability.run(&ctx).await.map_err(|e| e.to_string()) })
                        .await
                }
            }
        };

        (name, output)
    }

    /// Run one task body under the per-task timeout on its own task, so a
    /// panic or stall in one worker cannot touch its siblings.
    async fn bounded<F>(&self, name: AgentName, body: F) -> String
    where
        F: std::future::Future<Output = Result<String, String>> + Send + 'static,
    {
        let handle = tokio::spawn(tokio::time::timeout(self.task_timeout, body));

        match handle.await {
            Ok(Ok(Ok(output))) => output,
            Ok(Ok(Err(err))) => {
                tracing::warn!(agent = %name, error = %err, "task failed");
                format!("Error: {err}")
            }
            Ok(Err(_elapsed)) => {
                tracing::warn!(agent = %name, timeout_secs = self.task_timeout.as_secs(), "task timed out");
                format!(
                    "Error: {} timed out after {}s.",
                    name,
                    self.task_timeout.as_secs()
                )
            }
            Err(join_err) => {
                tracing::error!(agent = %name, error = %join_err, "task aborted");
                format!("Error: {name} aborted unexpectedly.")
            }
        }
    }
}

fn build_context(plan: &ResearchPlan, task: &AgentTask, spec: ContextSpec) -> TaskContext {
    TaskContext {
        instruction: task.specific_instruction.clone(),
        molecule: spec.molecule.then(|| plan.molecule.clone()),
        indication: spec.indication.then(|| plan.indication.clone()),
        therapeutic_area: spec.therapeutic_area.then(|| plan.therapeutic_area.clone()),
    }
}
