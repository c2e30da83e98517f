//! Wallet CLI - player wallet ledger in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;
mod output;

use commands::{logs, player, transaction};

/// Wallet - player balances and transaction history
#[derive(Parser)]
#[command(name = "wallet", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new player
    Register {
        /// Unique, case-sensitive username
        username: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Initial balance (must be positive)
        #[arg(long)]
        balance: Decimal,
        /// Password (prompted when omitted)
        #[arg(short, long, env = "WALLET_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check credentials and show the current balance
    Login {
        username: String,
        /// Password (prompted when omitted)
        #[arg(short, long, env = "WALLET_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Debit a player's balance
    Purchase {
        /// Player ID
        player_id: String,
        /// Caller-supplied transaction ID
        transaction_id: String,
        /// Amount to debit
        amount: Decimal,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Credit a player's balance
    Win {
        /// Player ID
        player_id: String,
        /// Caller-supplied transaction ID
        transaction_id: String,
        /// Amount to credit
        amount: Decimal,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a player's transactions, oldest first
    History {
        /// Player ID
        player_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a player's account summary
    Account {
        /// Player ID
        player_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the operational event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Register { username, name, balance, password, json } => {
            player::register(username, name, balance, password, json)
        }
        Commands::Login { username, password, json } => player::login(username, password, json),
        Commands::Purchase { player_id, transaction_id, amount, json } => {
            transaction::purchase(player_id, transaction_id, amount, json)
        }
        Commands::Win { player_id, transaction_id, amount, json } => {
            transaction::win(player_id, transaction_id, amount, json)
        }
        Commands::History { player_id, json } => transaction::history(player_id, json),
        Commands::Account { player_id, json } => player::account(player_id, json),
        Commands::Logs { command } => logs::run(command),
    }
}
