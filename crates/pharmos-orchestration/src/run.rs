//! Run orchestration
//!
//! A three-stage sequential state machine: Planning -> Executing ->
//! Synthesizing -> Done. Transitions are unconditional; no stage is retried
//! or revisited. Executing cannot fail the run for per-task errors, only
//! for a structurally invalid plan.

use secrecy::SecretString;
use std::time::Instant;

use pharmos_protocol::{AgentOutputs, ResearchPlan};
use pharmos_providers::ModelResolver;

use crate::control::RunControl;
use crate::dispatcher::Dispatcher;
use crate::error::RunError;
use crate::planner::PlanGenerator;
use crate::synthesizer::Synthesizer;

/// Stages of one orchestration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Planning,
    Executing,
    Synthesizing,
    Done,
}

impl RunStage {
    /// Get the next stage in the pipeline, if any
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Planning => Some(Self::Executing),
            Self::Executing => Some(Self::Synthesizing),
            Self::Synthesizing => Some(Self::Done),
            Self::Done => None,
        }
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planning => write!(f, "planning"),
            Self::Executing => write!(f, "executing"),
            Self::Synthesizing => write!(f, "synthesizing"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Aggregate state of one finished run, exposed to the caller. Built up
/// stage by stage during the run and discarded with it; nothing here
/// outlives or is shared across invocations.
#[derive(Debug)]
pub struct CompletedRun {
    pub id: String,
    pub query: String,
    pub plan: ResearchPlan,
    pub outputs: AgentOutputs,
    pub report: String,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

pub struct Orchestrator {
    planner: PlanGenerator,
    dispatcher: Dispatcher,
    synthesizer: Synthesizer,
}

impl Orchestrator {
    pub fn new(resolver: ModelResolver, dispatcher: Dispatcher) -> Self {
        Self {
            planner: PlanGenerator::new(resolver.clone()),
            dispatcher,
            synthesizer: Synthesizer::new(resolver),
        }
    }

    pub async fn run(
        &self,
        query: &str,
        api_key: &SecretString,
    ) -> Result<CompletedRun, RunError> {
        self.run_with_control(query, api_key, &RunControl::new())
            .await
    }

    pub async fn run_with_control(
        &self,
        query: &str,
        api_key: &SecretString,
        control: &RunControl,
    ) -> Result<CompletedRun, RunError> {
        let run_id = uuid::Uuid::new_v4().to_string();

        Self::enter_stage(control, &run_id, RunStage::Planning)?;
        let started = Instant::now();
        let plan = self.planner.generate(query, api_key).await?;
        tracing::info!(
            run_id = %run_id,
            molecule = %plan.molecule,
            agents = plan.required_agents.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "plan generated"
        );

        Self::enter_stage(control, &run_id, RunStage::Executing)?;
        let started = Instant::now();
        let outputs = self.dispatcher.execute_with_control(&plan, control).await?;
        tracing::info!(
            run_id = %run_id,
            outputs = outputs.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "execution finished"
        );

        Self::enter_stage(control, &run_id, RunStage::Synthesizing)?;
        let started = Instant::now();
        let report = self.synthesizer.synthesize(query, &outputs, api_key).await?;
        tracing::info!(
            run_id = %run_id,
            report_chars = report.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "report synthesized"
        );

        tracing::info!(run_id = %run_id, stage = %RunStage::Done, "run complete");

        Ok(CompletedRun {
            id: run_id,
            query: query.to_string(),
            plan,
            outputs,
            report,
            completed_at: chrono::Utc::now(),
        })
    }

    fn enter_stage(
        control: &RunControl,
        run_id: &str,
        stage: RunStage,
    ) -> Result<(), RunError> {
        if control.is_cancelled() {
            tracing::info!(run_id = %run_id, stage = %stage, "run cancelled");
            return Err(RunError::Cancelled);
        }
        tracing::info!(run_id = %run_id, stage = %stage, "stage started");
        Ok(())
    }
}
