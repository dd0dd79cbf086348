mod cli;
mod logging;
mod names;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use swarm::{FinalState, LaunchMode, RunConfig, ShutdownSignal, WebDriverFactory};
use tracing::{error, info, warn};

use crate::cli::Cli;

/// Stagger between launches inside one batch.
const BATCH_STAGGER: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = run(cli).await {
		error!(target = "swarm.cli", error = %err, "run failed");
		std::process::exit(1);
	}
}

async fn run(cli: Cli) -> Result<()> {
	if cli.count == 0 {
		bail!("--count must be at least 1");
	}

	let shutdown = ShutdownSignal::new();
	install_interrupt_handler(shutdown.clone());

	info!(
		target = "swarm.cli",
		url = %cli.meeting_url,
		count = cli.count,
		duration_secs = cli.duration,
		"starting stress run"
	);
	let mode = if cli.parallel {
		info!(
			target = "swarm.cli",
			batch_size = cli.parallel_thread_count,
			batch_delay_secs = cli.parallel_thread_delay,
			"batched launch mode"
		);
		LaunchMode::Batched {
			size: cli.parallel_thread_count,
			stagger: BATCH_STAGGER,
			cooldown: Duration::from_secs(cli.parallel_thread_delay),
		}
	} else {
		info!(target = "swarm.cli", delay_secs = cli.delay, "staggered launch mode");
		LaunchMode::Staggered {
			delay: Duration::from_secs_f64(cli.delay),
		}
	};

	let config = RunConfig {
		target_url: cli.meeting_url,
		display_names: (0..cli.count).map(|_| names::full_name()).collect(),
		session_duration: Duration::from_secs(cli.duration),
		mode,
		headless: !cli.headful,
	};

	let factory = Arc::new(WebDriverFactory::new(cli.webdriver_url));
	let outcomes = swarm::run(config, factory, shutdown).await;

	let joined = outcomes.iter().filter(|o| o.state == FinalState::Joined).count();
	info!(target = "swarm.cli", joined, total = outcomes.len(), "stress run complete");
	if joined < outcomes.len() {
		warn!(
			target = "swarm.cli",
			not_joined = outcomes.len() - joined,
			"some participants did not join, see their outcome lines above"
		);
	}

	Ok(())
}

fn install_interrupt_handler(shutdown: ShutdownSignal) {
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_err() {
			warn!(target = "swarm.cli", "interrupt handler unavailable");
			return;
		}
		info!(
			target = "swarm.cli",
			"interrupt received, draining participants (press again to force quit)"
		);
		shutdown.trigger();

		if tokio::signal::ctrl_c().await.is_ok() {
			warn!(target = "swarm.cli", "second interrupt, exiting immediately");
			std::process::exit(130);
		}
	});
}
