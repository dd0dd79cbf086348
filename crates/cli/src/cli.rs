use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "swarm")]
#[command(about = "Simulate many participants joining a meeting through a WebDriver server")]
#[command(version)]
pub struct Cli {
	/// Join link for the target meeting (e.g. https://…/j/<id>?pwd=<code>)
	#[arg(long, value_name = "URL")]
	pub meeting_url: String,

	/// Number of simulated participants
	#[arg(long, default_value_t = 5)]
	pub count: u32,

	/// Seconds between participant launches (ignored with --parallel)
	#[arg(long, default_value_t = 2.0, value_name = "SECONDS")]
	pub delay: f64,

	/// Launch participants in fixed-size parallel batches
	#[arg(long)]
	pub parallel: bool,

	/// Participants launched per batch when using --parallel
	#[arg(long, default_value_t = 12, value_name = "N")]
	pub parallel_thread_count: usize,

	/// Seconds to wait between batches when using --parallel
	#[arg(long, default_value_t = 30, value_name = "SECONDS")]
	pub parallel_thread_delay: u64,

	/// Seconds each participant stays in the meeting after joining
	#[arg(long, default_value_t = 1800, value_name = "SECONDS")]
	pub duration: u64,

	/// Base URL of the WebDriver server sessions are created on
	#[arg(long, default_value = "http://127.0.0.1:9515", value_name = "URL")]
	pub webdriver_url: String,

	/// Run browsers with visible windows instead of headless
	#[arg(long)]
	pub headful: bool,

	/// Increase verbosity (-v debug, -vv trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_minimal_invocation_uses_defaults() {
		let cli = Cli::try_parse_from(["swarm", "--meeting-url", "https://example.com/j/1?pwd=x"]).unwrap();

		assert_eq!(cli.meeting_url, "https://example.com/j/1?pwd=x");
		assert_eq!(cli.count, 5);
		assert_eq!(cli.delay, 2.0);
		assert!(!cli.parallel);
		assert_eq!(cli.parallel_thread_count, 12);
		assert_eq!(cli.parallel_thread_delay, 30);
		assert_eq!(cli.duration, 1800);
		assert_eq!(cli.webdriver_url, "http://127.0.0.1:9515");
		assert!(!cli.headful);
		assert_eq!(cli.verbose, 0);
	}

	#[test]
	fn parse_parallel_run() {
		let cli = Cli::try_parse_from([
			"swarm",
			"--meeting-url",
			"https://example.com/j/1?pwd=x",
			"--count",
			"40",
			"--parallel",
			"--parallel-thread-count",
			"8",
			"--parallel-thread-delay",
			"15",
			"--duration",
			"120",
		])
		.unwrap();

		assert_eq!(cli.count, 40);
		assert!(cli.parallel);
		assert_eq!(cli.parallel_thread_count, 8);
		assert_eq!(cli.parallel_thread_delay, 15);
		assert_eq!(cli.duration, 120);
	}

	#[test]
	fn meeting_url_is_required() {
		assert!(Cli::try_parse_from(["swarm", "--count", "3"]).is_err());
	}

	#[test]
	fn verbose_flag_accumulates() {
		let cli = Cli::try_parse_from(["swarm", "-vv", "--meeting-url", "https://example.com/j/1?pwd=x"]).unwrap();
		assert_eq!(cli.verbose, 2);
	}

	#[test]
	fn fractional_delay_is_accepted() {
		let cli = Cli::try_parse_from([
			"swarm",
			"--meeting-url",
			"https://example.com/j/1?pwd=x",
			"--delay",
			"0.5",
		])
		.unwrap();
		assert_eq!(cli.delay, 0.5);
	}
}
