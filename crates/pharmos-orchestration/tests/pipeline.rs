//! End-to-end pipeline scenarios against a scripted mock backend.
//!
//! The mock Gemini server answers the resolver probe, the planning request,
//! and the synthesis request based on request-body content; workers run in
//! simulated mode, so no test touches the network.

use std::sync::Arc;

use secrecy::SecretString;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pharmos_agents::{CapabilityRegistry, DataMode};
use pharmos_orchestration::{
    Dispatcher, Orchestrator, PlanError, RunControl, RunError, AGENT_NOT_FOUND,
};
use pharmos_protocol::AgentName;
use pharmos_providers::ModelResolver;
use pharmos_retrieval::{KnowledgeBase, MemoryKnowledgeBase, NO_DOCUMENTS_MESSAGE};

const METFORMIN_PLAN: &str = r#"{
    "molecule": "Metformin",
    "indication": "Anti-Aging / Longevity",
    "therapeutic_area": "Endocrinology",
    "research_goal": "Assess feasibility of repurposing Metformin for anti-aging",
    "required_agents": [
        {"agent_name": "IQVIAInsightsAgent", "specific_instruction": "Size the longevity market"},
        {"agent_name": "EXIMTrendsAgent", "specific_instruction": "Check API sourcing stability"},
        {"agent_name": "WebIntelligenceAgent", "specific_instruction": "Collect mTOR and AMPK evidence"},
        {"agent_name": "InternalKnowledgeAgent", "specific_instruction": "Summarize internal repurposing memos"}
    ]
}"#;

const REPORT: &str = "# Strategic Innovation Story\n\n## Executive Summary\nPromising.\n\n\
                      ## Clinical & Competitive Landscape\n...\n\n## IP & Legal Risk\n...\n\n\
                      ## Commercial Viability\n...\n\n## Supply Chain Risk\n...\n\n\
                      ## Recommendation\nProceed to scoping.";

fn gemini_text_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 20 }
    })
}

async fn scripted_backend() -> MockServer {
    let server = MockServer::start().await;

    // Resolver probes.
    Mock::given(method("POST"))
        .and(body_string_contains("ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_body("pong")))
        .mount(&server)
        .await;

    // Planning request.
    Mock::given(method("POST"))
        .and(body_string_contains("Master Orchestrator"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_body(METFORMIN_PLAN)))
        .mount(&server)
        .await;

    // Synthesis request.
    Mock::given(method("POST"))
        .and(body_string_contains("Data Gathered"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_body(REPORT)))
        .mount(&server)
        .await;

    server
}

fn orchestrator(server: &MockServer, knowledge: Arc<dyn KnowledgeBase>) -> Orchestrator {
    let resolver =
        ModelResolver::new(["test-model".to_string()]).with_base_url(server.uri());
    let dispatcher = Dispatcher::new(
        CapabilityRegistry::with_defaults(DataMode::Simulated),
        knowledge,
    );
    Orchestrator::new(resolver, dispatcher)
}

#[tokio::test]
async fn metformin_feasibility_runs_end_to_end() {
    let server = scripted_backend().await;
    let orchestrator = orchestrator(&server, Arc::new(MemoryKnowledgeBase::new()));

    let run = orchestrator
        .run(
            "Feasibility of Metformin for Anti-Aging",
            &SecretString::from("test-key"),
        )
        .await
        .expect("run should complete");

    assert_eq!(run.plan.molecule, "Metformin");
    assert!(run.plan.indication.to_lowercase().contains("anti-aging"));
    assert!(run.plan.agent_names().contains(&AgentName::IQVIAInsightsAgent));
    assert!(run.plan.agent_names().contains(&AgentName::WebIntelligenceAgent));

    // One output per planned task, in plan order.
    assert_eq!(run.outputs.len(), 4);
    let keys: Vec<AgentName> = run.outputs.keys().copied().collect();
    assert_eq!(keys, run.plan.agent_names());

    // Simulated workers produce real sections; empty knowledge base degrades
    // to its sentinel rather than failing the run.
    assert!(run.outputs[&AgentName::IQVIAInsightsAgent].contains("IQVIA_Mock_DB"));
    assert_eq!(
        run.outputs[&AgentName::InternalKnowledgeAgent],
        NO_DOCUMENTS_MESSAGE
    );

    assert!(run.report.contains("## Executive Summary"));
    assert!(run.report.contains("## Recommendation"));
}

#[tokio::test]
async fn ingested_documents_feed_the_internal_knowledge_section() {
    let server = scripted_backend().await;
    let knowledge = Arc::new(MemoryKnowledgeBase::new());
    knowledge
        .ingest_text("Internal memo: metformin repurposing was funded in Q3.")
        .await;
    let orchestrator = orchestrator(&server, knowledge);

    let run = orchestrator
        .run(
            "Feasibility of Metformin for Anti-Aging",
            &SecretString::from("test-key"),
        )
        .await
        .unwrap();

    assert!(run.outputs[&AgentName::InternalKnowledgeAgent].contains("Internal memo"));
}

#[tokio::test]
async fn unreachable_backend_fails_planning_with_backend_error() {
    let server = MockServer::start().await;
    // No mocks mounted: every request 404s, so every candidate probe fails.
    let orchestrator = orchestrator(&server, Arc::new(MemoryKnowledgeBase::new()));

    let err = orchestrator
        .run("any query", &SecretString::from("test-key"))
        .await
        .unwrap_err();

    assert!(err.is_backend_unavailable());
    assert!(matches!(err, RunError::Plan(PlanError::Backend(_))));
}

#[tokio::test]
async fn unparseable_plan_is_a_schema_error_not_backend_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_body("pong")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("Master Orchestrator"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_text_body("I am unable to produce a plan.")),
        )
        .mount(&server)
        .await;

    let orchestrator = orchestrator(&server, Arc::new(MemoryKnowledgeBase::new()));
    let err = orchestrator
        .run("any query", &SecretString::from("test-key"))
        .await
        .unwrap_err();

    assert!(!err.is_backend_unavailable());
    assert!(matches!(err, RunError::Plan(PlanError::Schema { .. })));
}

#[tokio::test]
async fn backend_loss_after_execution_is_a_synthesis_error() {
    let server = MockServer::start().await;

    // The planning-stage probe succeeds exactly once; the synthesis-stage
    // probe then finds nothing and the resolver exhausts its candidates.
    Mock::given(method("POST"))
        .and(body_string_contains("ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_body("pong")))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("Master Orchestrator"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_body(METFORMIN_PLAN)))
        .mount(&server)
        .await;

    let orchestrator = orchestrator(&server, Arc::new(MemoryKnowledgeBase::new()));
    let err = orchestrator
        .run("any query", &SecretString::from("test-key"))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Synthesis(_)));
}

#[tokio::test]
async fn cancelled_control_aborts_before_planning() {
    let server = scripted_backend().await;
    let orchestrator = orchestrator(&server, Arc::new(MemoryKnowledgeBase::new()));

    let control = RunControl::new();
    control.cancel();

    let err = orchestrator
        .run_with_control("any query", &SecretString::from("test-key"), &control)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Cancelled));
}

#[tokio::test]
async fn not_found_sentinel_is_exact() {
    // Belt-and-braces check that the dispatcher's sentinel matches the wire
    // contract consumers grep for.
    assert_eq!(AGENT_NOT_FOUND, "Error: Agent not found.");
}
