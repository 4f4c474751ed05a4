//! Pharmos - pharmaceutical research orchestration engine

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pharmos_agents::{CapabilityRegistry, DataMode};
use pharmos_config::{load_config, resolve_api_key, DataModeSetting, PharmosConfig};
use pharmos_orchestration::{CompletedRun, Dispatcher, Orchestrator, RunControl};
use pharmos_protocol::AgentName;
use pharmos_providers::ModelResolver;
use pharmos_retrieval::{KnowledgeBase, MemoryKnowledgeBase};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Research {
            query,
            output,
            ingest,
            simulated,
        } => run_research(&cli, query, output.as_deref(), ingest, *simulated).await,
        Commands::Agents => run_agents(),
    };

    if let Err(e) = result {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run_research(
    cli: &Cli,
    query: &str,
    output: Option<&Path>,
    ingest: &[PathBuf],
    simulated: bool,
) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let api_key = resolve_api_key(&config)?;

    let knowledge = Arc::new(MemoryKnowledgeBase::new());
    knowledge.setup().await?;
    for path in ingest {
        let chunks = knowledge.ingest(path).await?;
        println!(
            "{} {} ({} chunks)",
            "Ingested:".cyan().bold(),
            path.display(),
            chunks
        );
    }

    let orchestrator = build_orchestrator(&config, knowledge, simulated);

    // Ctrl-C flips the run control; the pipeline stops at the next
    // stage or task boundary.
    let control = RunControl::new();
    let interrupt = control.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupt received, cancelling run...");
            interrupt.cancel();
        }
    });

    println!("{} {}", "Researching:".cyan().bold(), query.dimmed());

    let run = orchestrator
        .run_with_control(query, &api_key, &control)
        .await?;

    print_run(&run);

    if let Some(path) = output {
        tokio::fs::write(path, &run.report)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("{} {}", "Report saved:".green().bold(), path.display());
    }

    Ok(())
}

fn build_orchestrator(
    config: &PharmosConfig,
    knowledge: Arc<dyn KnowledgeBase>,
    force_simulated: bool,
) -> Orchestrator {
    let data_mode = if force_simulated || config.workers.data_mode == DataModeSetting::Simulated {
        DataMode::Simulated
    } else {
        DataMode::Live
    };

    let resolver = ModelResolver::new(config.provider.model_candidates.iter().cloned())
        .with_probe_timeout(config.provider.probe_timeout_seconds);

    let dispatcher = Dispatcher::new(CapabilityRegistry::with_defaults(data_mode), knowledge)
        .with_task_timeout(Duration::from_secs(config.workers.task_timeout_seconds))
        .with_max_concurrency(config.workers.max_concurrency);

    Orchestrator::new(resolver, dispatcher)
}

fn print_run(run: &CompletedRun) {
    println!();
    println!("{}", "─".repeat(60).dimmed());
    println!("{}: {}", "Molecule".cyan(), run.plan.molecule.yellow());
    println!("{}: {}", "Indication".cyan(), run.plan.indication.yellow());
    println!(
        "{}: {}",
        "Therapeutic area".cyan(),
        run.plan.therapeutic_area.yellow()
    );
    println!("{}: {}", "Goal".cyan(), run.plan.research_goal.dimmed());
    println!("{}", "─".repeat(60).dimmed());

    for (name, output) in &run.outputs {
        println!();
        println!("{}", format!("## {name}").bold());
        println!("{output}");
    }

    println!();
    println!("{}", "═".repeat(60).dimmed());
    println!("{}", run.report);
    println!();
    println!(
        "{}",
        format!(
            "Run {} completed at {}",
            run.id,
            run.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .dimmed()
    );
}

fn run_agents() -> Result<()> {
    for name in AgentName::ALL {
        println!("{}  {}", name.to_string().cyan().bold(), name.purpose());
    }
    Ok(())
}
