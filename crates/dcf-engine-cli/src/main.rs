mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::synergy::{BlendedWaccArgs, SynergyArgs};
use commands::valuation::{DcfArgs, ImpliedGrowthArgs};

/// Multi-stage DCF valuation with synergy adjustment
#[derive(Parser)]
#[command(
    name = "dcf",
    version,
    about = "Multi-stage DCF valuation with synergy adjustment",
    long_about = "A CLI for intrinsic valuation with decimal precision. Projects revenue, \
                  margin, and tax convergence paths, discounts at a year-varying WACC, and \
                  optionally layers ramp-weighted acquisition synergies discounted at the \
                  buyer's cost of capital."
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
    /// Run a standalone multi-stage DCF valuation
    Dcf(DcfArgs),
    /// Back-solve the growth rate implied by the market price
    ImpliedGrowth(ImpliedGrowthArgs),
    /// Run a synergy-adjusted valuation for an acquisition case
    Synergy(SynergyArgs),
    /// Value-weighted WACC of a combined post-merger entity
    BlendedWacc(BlendedWaccArgs),
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

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Dcf(args) => commands::valuation::run_dcf(args),
        Commands::ImpliedGrowth(args) => commands::valuation::run_implied_growth(args),
        Commands::Synergy(args) => commands::synergy::run_synergy(args),
        Commands::BlendedWacc(args) => commands::synergy::run_blended_wacc(args),
        Commands::Version => {
            println!("dcf {}", env!("CARGO_PKG_VERSION"));
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
