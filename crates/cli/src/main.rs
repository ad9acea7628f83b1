mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use presched_core::config::load_dotenv;
use presched_core::{reference_tasks, Config, TaskId};
use presched_scheduler::{RunReport, Scheduler, ScriptedArrivals};

use crate::cli::CliArgs;
use crate::config::{resolve_scheduler_config, Scenario};

fn main() -> Result<()> {
    load_dotenv();
    let args = CliArgs::parse();
    let env_config = Config::from_env();

    // --log-level > RUST_LOG > PRESCHED_LOG
    let filter = match &args.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&env_config.log_filter)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    env_config.log_summary();
    debug!(env = %env_config.summary(), "environment config");

    let scenario = args
        .scenario
        .as_deref()
        .map(Scenario::load)
        .transpose()
        .context("failed to load scenario")?;

    let config = resolve_scheduler_config(&env_config, scenario.as_ref(), &args);
    let specs = match &scenario {
        Some(scenario) => scenario.task_specs()?,
        None => reference_tasks(),
    };

    let scheduler = Scheduler::with_mark_tasks(config, specs).context("invalid task set")?;
    info!(tasks = scheduler.tasks().len(), "Scheduler ready");

    let report = match &args.arrival_order {
        Some(order) => scheduler.run(ScriptedArrivals::new(order.iter().copied().map(TaskId))),
        None => scheduler.run_random(),
    }
    .context("scheduler run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &RunReport) {
    let order: Vec<String> = report.arrival_order().iter().map(|t| t.0.to_string()).collect();
    println!("run:       {}", report.run_id);
    println!("arrivals:  {}", order.join(", "));
    println!("resource:  {}", report.trace());
    println!(
        "ticks:     {} ({} preemptions, {} early completions)",
        report.metrics.ticks, report.metrics.preemptions, report.metrics.early_completions
    );
    println!(
        "elapsed:   {}ms",
        (report.finished_at - report.started_at).num_milliseconds()
    );
}
