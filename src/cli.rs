use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Parser)]
#[command(name = "macdalert")]
#[command(about = "MACD zero-cross expansion alerts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one evaluation cycle over all configured symbols
    Check {
        /// Use deterministic synthetic candles instead of Binance
        #[arg(long)]
        offline: bool,
        /// Evaluate even outside the configured trading hours
        #[arg(long)]
        ignore_hours: bool,
        /// Comma-separated symbols, overrides SYMBOLS (e.g. BTCUSDT,ETHUSDT)
        #[arg(short, long)]
        symbols: Option<String>,
    },
    /// Create the alert tables and register configured symbols
    InitDb,
    /// Show the alert state of every tracked symbol
    Status,
    /// Show recent alert history
    History {
        /// Filter by symbol
        #[arg(short, long)]
        symbol: Option<String>,
        /// Maximum number of records
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            offline,
            ignore_hours,
            symbols,
        } => {
            commands::check::run(commands::check::CheckOptions {
                offline,
                ignore_hours,
                symbols,
            });
        }
        Commands::InitDb => {
            commands::init_db::run();
        }
        Commands::Status => {
            commands::status::run();
        }
        Commands::History { symbol, limit } => {
            commands::history::run(symbol, limit);
        }
    }
}
