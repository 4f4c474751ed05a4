//! Clinical trials worker
//!
//! Live variant queries the ClinicalTrials.gov API v2; simulated variant
//! produces a deterministic fixture pipeline for offline runs and tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use pharmos_protocol::AgentName;

use crate::capability::{AgentError, Capability, ContextSpec, TaskContext};
use crate::sim::stable_hash;

pub const DEFAULT_TRIALS_BASE_URL: &str = "https://clinicaltrials.gov";

const PAGE_SIZE: usize = 5;
const TRIALS_TIMEOUT_SECS: u64 = 10;
const NO_TRIALS_MESSAGE: &str =
    "No active clinical trials found for this specific combination.";

#[derive(Clone)]
pub enum TrialRegistry {
    Live(LiveTrialRegistry),
    Simulated,
}

impl TrialRegistry {
    pub fn live() -> Self {
        Self::Live(LiveTrialRegistry::new(DEFAULT_TRIALS_BASE_URL))
    }

    pub fn live_with_base_url(base_url: impl Into<String>) -> Self {
        Self::Live(LiveTrialRegistry::new(base_url))
    }
}

pub struct ClinicalTrialsCapability {
    registry: TrialRegistry,
}

impl ClinicalTrialsCapability {
    pub fn new(registry: TrialRegistry) -> Self {
        Self { registry }
    }

    fn simulated_pipeline(molecule: &str, indication: &str) -> String {
        let seed = stable_hash(&format!("{molecule}|{indication}"));
        let phases = ["PHASE1", "PHASE2", "PHASE3"];
        let statuses = ["RECRUITING", "ACTIVE_NOT_RECRUITING", "COMPLETED"];
        let sponsors = [
            "University Medical Center",
            "National Research Institute",
            "Horizon Therapeutics Group",
        ];

        (0..3)
            .map(|i| {
                let k = (seed as usize).wrapping_add(i * 7);
                format!(
                    "- [NCT{:08}] {} in {} (simulated)\n  Phase: {} | Status: {} | Sponsor: {}",
                    (seed.wrapping_mul(i as u64 + 1) % 100_000_000),
                    molecule,
                    indication,
                    phases[k % phases.len()],
                    statuses[(k / 3) % statuses.len()],
                    sponsors[(k / 9) % sponsors.len()],
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Capability for ClinicalTrialsCapability {
    fn name(&self) -> AgentName {
        AgentName::ClinicalTrialsAgent
    }

    fn context_spec(&self) -> ContextSpec {
        ContextSpec::molecule_and_indication()
    }

    async fn run(&self, ctx: &TaskContext) -> Result<String, AgentError> {
        let molecule = ctx.molecule_for(self.name())?;
        let indication = ctx.indication_for(self.name())?;

        match &self.registry {
            TrialRegistry::Simulated => Ok(Self::simulated_pipeline(molecule, indication)),
            TrialRegistry::Live(live) => {
                // Registry downtime degrades this section, never the run.
                match live.search(molecule, indication).await {
                    Ok(report) => Ok(report),
                    Err(AgentError::UpstreamStatus { status }) => {
                        Ok(format!("Error fetching trials: API returned {status}"))
                    }
                    Err(err) => Ok(format!(
                        "Connection failed to ClinicalTrials.gov: {err}"
                    )),
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct LiveTrialRegistry {
    client: Client,
    base_url: String,
}

impl LiveTrialRegistry {
    fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(TRIALS_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn search(&self, molecule: &str, indication: &str) -> Result<String, AgentError> {
        let url = format!("{}/api/v2/studies", self.base_url);
        let term = format!("{molecule} {indication}");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query.term", term.as_str()),
                ("pageSize", &PAGE_SIZE.to_string()),
                (
                    "fields",
                    "NCTId,BriefTitle,OverallStatus,Phase,LeadSponsorName",
                ),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AgentError::UpstreamStatus {
                status: response.status().as_u16(),
            });
        }

        let body: StudiesResponse = response.json().await?;
        if body.studies.is_empty() {
            return Ok(NO_TRIALS_MESSAGE.to_string());
        }

        let lines: Vec<String> = body
            .studies
            .iter()
            .map(|study| {
                let protocol = &study.protocol_section;
                let ident = &protocol.identification_module;
                let status = protocol
                    .status_module
                    .as_ref()
                    .map(|m| m.overall_status.as_str())
                    .unwrap_or("Unknown");
                let phases = protocol
                    .design_module
                    .as_ref()
                    .map(|m| m.phases.join(", "))
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| "N/A".to_string());
                let sponsor = ident
                    .organization
                    .as_ref()
                    .map(|o| o.full_name.as_str())
                    .unwrap_or("Unknown");

                format!(
                    "- [{}] {}\n  Phase: {} | Status: {} | Sponsor: {}",
                    ident.nct_id, ident.brief_title, phases, status, sponsor
                )
            })
            .collect();

        Ok(lines.join("\n"))
    }
}

#[derive(Debug, Deserialize)]
struct StudiesResponse {
    #[serde(default)]
    studies: Vec<Study>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Study {
    protocol_section: ProtocolSection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtocolSection {
    identification_module: IdentificationModule,
    #[serde(default)]
    status_module: Option<StatusModule>,
    #[serde(default)]
    design_module: Option<DesignModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentificationModule {
    #[serde(default)]
    nct_id: String,
    #[serde(default)]
    brief_title: String,
    #[serde(default)]
    organization: Option<Organization>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Organization {
    #[serde(default)]
    full_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusModule {
    #[serde(default)]
    overall_status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DesignModule {
    #[serde(default)]
    phases: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TaskContext {
        TaskContext {
            instruction: "map the competitive pipeline".to_string(),
            molecule: Some("Metformin".to_string()),
            indication: Some("Anti-Aging".to_string()),
            therapeutic_area: None,
        }
    }

    #[tokio::test]
    async fn simulated_pipeline_is_deterministic() {
        let capability = ClinicalTrialsCapability::new(TrialRegistry::Simulated);
        let first = capability.run(&ctx()).await.unwrap();
        let second = capability.run(&ctx()).await.unwrap();
        assert_eq!(first, second);
        assert!(first.contains("Metformin"));
        assert!(first.contains("NCT"));
    }

    #[tokio::test]
    async fn missing_molecule_is_context_error() {
        let capability = ClinicalTrialsCapability::new(TrialRegistry::Simulated);
        let result = capability.run(&TaskContext::new("go")).await;
        assert!(matches!(
            result,
            Err(AgentError::MissingContext {
                field: "molecule",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn live_registry_formats_studies() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/studies"))
            .and(query_param("query.term", "Metformin Anti-Aging"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "studies": [{
                    "protocolSection": {
                        "identificationModule": {
                            "nctId": "NCT04098406",
                            "briefTitle": "TAME Trial",
                            "organization": { "fullName": "AFAR" }
                        },
                        "statusModule": { "overallStatus": "RECRUITING" },
                        "designModule": { "phases": ["PHASE3"] }
                    }
                }]
            })))
            .mount(&server)
            .await;

        let capability = ClinicalTrialsCapability::new(TrialRegistry::live_with_base_url(
            server.uri(),
        ));
        let output = capability.run(&ctx()).await.unwrap();
        assert!(output.contains("[NCT04098406] TAME Trial"));
        assert!(output.contains("Phase: PHASE3 | Status: RECRUITING | Sponsor: AFAR"));
    }

    #[tokio::test]
    async fn live_registry_degrades_on_upstream_error() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let capability = ClinicalTrialsCapability::new(TrialRegistry::live_with_base_url(
            server.uri(),
        ));
        let output = capability.run(&ctx()).await.unwrap();
        assert_eq!(output, "Error fetching trials: API returned 500");
    }

    #[tokio::test]
    async fn live_registry_reports_empty_result() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "studies": [] })),
            )
            .mount(&server)
            .await;

        let capability = ClinicalTrialsCapability::new(TrialRegistry::live_with_base_url(
            server.uri(),
        ));
        let output = capability.run(&ctx()).await.unwrap();
        assert_eq!(output, NO_TRIALS_MESSAGE);
    }
}
