//! Transaction commands - purchase, win and history

use anyhow::Result;
use colored::Colorize;
use rust_decimal::Decimal;
use wallet_core::{EntryKind, TransactionRequest};

use super::{finish, get_context};
use crate::output;

fn request(player_id: String, transaction_id: String, amount: Decimal) -> TransactionRequest {
    TransactionRequest {
        player_id,
        transaction_id,
        amount,
    }
}

pub fn purchase(player_id: String, transaction_id: String, amount: Decimal, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let result = ctx.purchase(&request(player_id, transaction_id, amount));

    finish("purchase", result, json, |view| {
        output::success(&format!("Debited {}", output::format_money(amount)));
        println!("  Balance: {}", output::format_money(view.balance).bold());
    })
}

pub fn win(player_id: String, transaction_id: String, amount: Decimal, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let result = ctx.win(&request(player_id, transaction_id, amount));

    finish("win", result, json, |view| {
        output::success(&format!("Credited {}", output::format_money(amount)));
        println!("  Balance: {}", output::format_money(view.balance).bold());
    })
}

pub fn history(player_id: String, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let result = ctx.history(&player_id);

    finish("history", result, json, |entries| {
        if entries.is_empty() {
            output::info("No transactions recorded.");
            return;
        }

        let mut table = output::create_table();
        table.set_header(vec!["Time", "Transaction", "Kind", "Amount"]);
        for entry in entries {
            let amount = match entry.kind {
                EntryKind::Purchase => format!("-{}", output::format_money(entry.amount)).red(),
                EntryKind::Win => format!("+{}", output::format_money(entry.amount)).green(),
            };
            table.add_row(vec![
                entry.applied_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.transaction_id.clone(),
                entry.kind.to_string(),
                amount.to_string(),
            ]);
        }
        println!("{}", table);
    })
}
