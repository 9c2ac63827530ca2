// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::process::ExitCode;

use anyhow::Context;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use the_dag_scheduler::config::consts::DEFAULT_LOG_DIRECTIVE;
use the_dag_scheduler::config::{load_and_validate_config, RuntimeBuilder};
use the_dag_scheduler::engine::{ExecutionOutcome, RunReport, RunStatus};
use the_dag_scheduler::observability::init_tracing;

struct Args {
    config_file: String,
    json: bool,
}

fn parse_args() -> Option<Args> {
    let mut config_file = None;
    let mut json = false;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            _ if config_file.is_none() => config_file = Some(arg),
            _ => return None,
        }
    }

    config_file.map(|config_file| Args { config_file, json })
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(DEFAULT_LOG_DIRECTIVE);

    let Some(args) = parse_args() else {
        let program = env::args()
            .next()
            .unwrap_or_else(|| "the-dag-scheduler".to_string());
        eprintln!("Usage: {} <graph.yaml|graph.toml> [--json]", program);
        eprintln!("Example: {} graphs/diamond.yaml", program);
        return ExitCode::FAILURE;
    };

    match run(&args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let config = load_and_validate_config(&args.config_file)
        .with_context(|| format!("failed to load graph definition {}", args.config_file))?;

    let (orchestrator, graph) = RuntimeBuilder::from_config(&config);

    // Ctrl-C stops the run at the next layer boundary
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let report = orchestrator
        .run_with_cancellation(&graph, cancel)
        .await
        .context("scheduler run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("📋 Graph: {}", args.config_file);
        println!("⚙️  Max Concurrency: {}", orchestrator.max_concurrency());
        print_report(&report);
    }

    Ok(if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(report: &RunReport<Value>) {
    println!("\n📊 Execution Results:");
    println!("⏱️  Execution Time: {:?}", report.duration);
    println!("🔢 Layers: {}", report.layers.len());

    for (index, layer) in report.layers.iter().enumerate() {
        println!("\n  Layer {}:", index);
        for node in layer.iter() {
            match report.outcome(node) {
                Some(ExecutionOutcome::Succeeded(value)) => {
                    println!("    ✅ {} → {}", node, value)
                }
                Some(ExecutionOutcome::Failed(failure)) => {
                    println!("    ❌ {} → {}", node, failure)
                }
                None => println!("    ⏸️  {} → not started", node),
            }
        }
    }

    println!(
        "\n🎯 {} succeeded, {} failed",
        report.succeeded().count(),
        report.failed_count()
    );

    if let RunStatus::Cancelled {
        next_layer,
        total_layers,
        not_started,
    } = &report.status
    {
        println!(
            "🛑 Cancelled before layer {} of {}; {} node(s) not started",
            next_layer,
            total_layers,
            not_started.len()
        );
    }
}
