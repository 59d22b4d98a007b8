use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;

use super::{SimulatePayload, SimulateResponse, api_request_from_payload, execute};
use crate::core::SimulationError;
use crate::presenter::StatisticsPresenter;

#[derive(Parser, Debug)]
#[command(
    name = "growthsim",
    about = "Monte Carlo balance growth simulator (random annual returns, periodic contributions)"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log level for this crate; RUST_LOG overrides"
    )]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON simulation API over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run one ensemble and print its statistics
    Simulate(SimulateArgs),
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Starting balance [default: 1000]"
    )]
    pub initial_balance: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Contribution added every period [default: 1000]"
    )]
    pub periodic_contribution: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Expected return in percent [default: 7.5]"
    )]
    pub expected_return: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Return volatility in percent [default: 15]"
    )]
    pub volatility: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Number of periods [default: 30]"
    )]
    pub duration: Option<i64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Number of trajectories [default: 1000]"
    )]
    pub runs: Option<i64>,
    #[arg(long, help = "Seed for reproducible runs; random when omitted")]
    pub seed: Option<u64>,
    #[arg(long, help = "Spread runs across worker threads")]
    pub parallel: bool,
    #[arg(long, help = "Use both Box-Muller deviates per draw pair")]
    pub reuse_normal_pair: bool,
    #[arg(long, help = "Include the first run's trajectory")]
    pub trajectory: bool,
    #[arg(long, help = "Include every final balance (json output only)")]
    pub outcomes: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

impl From<&SimulateArgs> for SimulatePayload {
    fn from(args: &SimulateArgs) -> Self {
        SimulatePayload {
            initial_balance: args.initial_balance,
            periodic_contribution: args.periodic_contribution,
            expected_return_pct: args.expected_return,
            volatility_pct: args.volatility,
            duration_periods: args.duration,
            runs: args.runs,
            seed: args.seed,
            parallel: Some(args.parallel),
            reuse_normal_pair: Some(args.reuse_normal_pair),
            include_outcomes: Some(args.outcomes),
            include_trajectory: Some(args.trajectory),
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("failed to render JSON output: {0}")]
    Render(#[from] serde_json::Error),
}

/// Runs the `simulate` subcommand and renders its output.
pub fn run_simulate(args: &SimulateArgs) -> Result<String, CliError> {
    let request = api_request_from_payload(SimulatePayload::from(args))?;
    let response = execute(&request);
    Ok(match args.output {
        OutputFormat::Json => serde_json::to_string_pretty(&response)?,
        OutputFormat::Table => render_table(&response),
    })
}

fn render_table(response: &SimulateResponse) -> String {
    let presenter = StatisticsPresenter::new();
    let scenario = &response.scenario;
    let mut out = format!(
        "{} runs over {} periods (seed {})\n",
        response.runs.get(),
        scenario.duration_periods(),
        response.seed
    );
    out.push_str(&presenter.render_table(&response.statistics));

    if let Some(trajectory) = &response.trajectory {
        out.push_str("\nPeriod  Balance\n");
        for (period, balance) in trajectory.balances().iter().enumerate() {
            out.push_str(&format!(
                "{period:>6}  {}\n",
                presenter.format_value(*balance)
            ));
        }
    }
    out
}
