use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use dcx::core::log::init_logging;
use dcx::core::savings::AccrualGranularity;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Compare a strategy against a savings account
    Compare {
        /// Strategy key, see `dcx strategies`
        #[arg(short, long)]
        strategy: Option<String>,
        /// Savings annual rate in percent
        #[arg(short, long)]
        rate: Option<f64>,
        /// Monthly contribution in home currency
        #[arg(short, long)]
        amount: Option<f64>,
        /// First month, YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last month, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Savings compounding periods per year. Only changes the result with
        /// `--granularity compounding-period`
        #[arg(long)]
        compounding: Option<u32>,
        /// Savings accrual tick: contribution-period or compounding-period
        #[arg(long)]
        granularity: Option<AccrualGranularity>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List configured strategies
    Strategies,
}

impl From<Commands> for dcx::AppCommand {
    fn from(cmd: Commands) -> dcx::AppCommand {
        match cmd {
            Commands::Compare {
                strategy,
                rate,
                amount,
                start,
                end,
                compounding,
                granularity,
                json,
            } => dcx::AppCommand::Compare(dcx::CompareOptions {
                strategy,
                annual_rate: rate,
                contribution: amount,
                start,
                end,
                compounding,
                granularity,
                json,
            }),
            Commands::Strategies => dcx::AppCommand::Strategies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => dcx::cli::setup::setup(),
        Some(cmd) => dcx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
