mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::inflation::InflationArgs;
use commands::market_data::PricesArgs;
use commands::mortgage::{MaxAmountArgs, PaymentsArgs, PremiumArgs};

/// Canadian mortgage and household finance calculations
#[derive(Parser)]
#[command(
    name = "canfin",
    version,
    about = "Canadian mortgage and household finance calculations",
    long_about = "A CLI for Canadian mortgage and household finance calculations \
                  with decimal precision. Supports default-insurance premiums, \
                  amortization schedules under semi-annual compounding, \
                  stress-tested affordability, CPI inflation adjustment, and \
                  historical price downloads."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the mortgage default-insurance premium
    Premium(PremiumArgs),
    /// Generate an amortization schedule over the term
    Payments(PaymentsArgs),
    /// Estimate the maximum affordable purchase price
    MaxAmount(MaxAmountArgs),
    /// Adjust an amount between two CPI readings
    Inflation(InflationArgs),
    /// Download historical prices for a symbol
    Prices(PricesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.command);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Premium(args) => commands::mortgage::run_premium(args),
        Commands::Payments(args) => commands::mortgage::run_payments(args),
        Commands::MaxAmount(args) => commands::mortgage::run_max_amount(args),
        Commands::Inflation(args) => commands::inflation::run_inflation(args),
        Commands::Prices(args) => commands::market_data::run_prices(args),
        Commands::Version => {
            println!("canfin {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

/// RUST_LOG always wins; `payments --debug` raises the default filter so
/// per-period diagnostics reach stderr without extra environment setup.
fn init_logging(command: &Commands) {
    let default_filter = match command {
        Commands::Payments(args) if args.debug => "canfin=debug",
        _ => "error",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
