//! stakemod-sim: run scripted scenarios against the staking module.

mod runner;
mod scenario;

use anyhow::Context;
use clap::Parser;
use runner::Simulator;
use scenario::Scenario;
use stakemod_staking::StakingConfig;
use stakemod_utils::LogFormat;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stakemod-sim", about = "Staking module scenario simulator")]
struct Cli {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "STAKEMOD_LOG_LEVEL")]
    log_level: String,

    /// Log output format: "human" or "json". Logs go to stderr.
    #[arg(long, default_value = "human", env = "STAKEMOD_LOG_FORMAT")]
    log_format: LogFormat,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run a scenario and print one JSON line per step, then a summary.
    Run {
        /// Path to a TOML module configuration. Defaults apply when omitted.
        #[arg(long, env = "STAKEMOD_CONFIG")]
        config: Option<PathBuf>,

        /// Path to the JSON scenario.
        #[arg(long)]
        scenario: PathBuf,

        /// Stop at the first failing step.
        #[arg(long)]
        fail_fast: bool,
    },
    /// Print the default module configuration as TOML.
    DefaultConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    stakemod_utils::init_logging(cli.log_format, &cli.log_level);

    match cli.command {
        Command::Run {
            config,
            scenario,
            fail_fast,
        } => {
            let config = match config {
                Some(path) => {
                    let cfg = StakingConfig::from_toml_file(&path)
                        .with_context(|| format!("loading config {}", path.display()))?;
                    tracing::info!("Loaded config from {}", path.display());
                    cfg
                }
                None => StakingConfig::default(),
            };
            let raw = std::fs::read_to_string(&scenario)
                .with_context(|| format!("reading scenario {}", scenario.display()))?;
            let scenario: Scenario = serde_json::from_str(&raw).context("parsing scenario")?;

            let mut sim = Simulator::new(&scenario, &config)?;
            let reports = sim.run(&scenario.steps, fail_fast);

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for report in &reports {
                writeln!(out, "{}", serde_json::to_string(report)?)?;
            }
            let summary = sim.summary(&reports);
            writeln!(out, "{}", serde_json::to_string(&summary)?)?;

            tracing::info!(
                steps = summary.steps,
                failed = summary.failed,
                total_staked = summary.total_staked,
                "scenario finished"
            );
            if fail_fast && summary.failed > 0 {
                anyhow::bail!("scenario stopped at a failing step");
            }
        }
        Command::DefaultConfig => {
            print!("{}", StakingConfig::default().to_toml_string()?);
        }
    }

    Ok(())
}
