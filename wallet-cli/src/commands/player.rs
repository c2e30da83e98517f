//! Player commands - register, login and account summary

use anyhow::Result;
use colored::Colorize;
use rust_decimal::Decimal;
use wallet_core::{LoginRequest, RegisterRequest};

use super::{finish, get_context, get_password_or_prompt};
use crate::output;

pub fn register(
    username: String,
    name: String,
    balance: Decimal,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let password = get_password_or_prompt(password, "Choose a password")?;
    let ctx = get_context()?;

    let request = RegisterRequest {
        username,
        password,
        name,
        balance,
    };
    let result = ctx.register(&request);

    finish("register", result, json, |registered| {
        output::success("Player registered");
        println!("  Player ID: {}", registered.player_id);
    })
}

pub fn login(username: String, password: Option<String>, json: bool) -> Result<()> {
    let password = get_password_or_prompt(password, "Password")?;
    let ctx = get_context()?;

    let result = ctx.login(&LoginRequest { username, password });

    finish("login", result, json, |view| {
        output::success("Login successful");
        println!("  Player ID: {}", view.player_id);
        println!("  Balance:   {}", output::format_money(view.balance).bold());
    })
}

pub fn account(player_id: String, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let result = ctx.account(&player_id);

    finish("account", result, json, |summary| {
        let mut table = output::create_table();
        table.add_row(vec!["Player ID".to_string(), summary.id.to_string()]);
        table.add_row(vec!["Username".to_string(), summary.username.clone()]);
        table.add_row(vec!["Name".to_string(), summary.display_name.clone()]);
        table.add_row(vec!["Balance".to_string(), output::format_money(summary.balance)]);
        table.add_row(vec![
            "Created".to_string(),
            summary.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
        println!("{}", table);
    })
}
