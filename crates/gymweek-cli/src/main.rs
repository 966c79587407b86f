//! gymweek CLI - plan your training week from the terminal
//!
//! Local-first: every profile keeps its own database file. Profiles with a
//! Supabase project sync settings and workouts to the signed-in account.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::AppContext;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::day::run_day;
use crate::commands::home::run_home;
use crate::commands::quote::run_quote;
use crate::commands::remind::run_remind;
use crate::commands::reset::run_reset;
use crate::commands::settings::run_settings;
use crate::commands::sync::run_sync;
use crate::commands::week::run_week;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "gymweek=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();
    let data_dir = cli.data_dir.as_deref();

    match cli.command {
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
        Some(Commands::Config { command }) => run_config(command, profile),
        Some(Commands::Completions { shell, output }) => run_completions(shell, output.as_deref()),
        Some(command) => {
            let context = AppContext::resolve(profile, data_dir)?;
            match command {
                Commands::Home => run_home(context).await,
                Commands::Week { offset } => run_week(offset, context).await,
                Commands::Day { command } => run_day(command, context).await,
                Commands::Settings { command } => run_settings(command, context).await,
                Commands::Auth { command } => run_auth(command, context).await,
                Commands::Sync => run_sync(context).await,
                Commands::Quote => run_quote(context).await,
                Commands::Remind { once, no_notify } => run_remind(once, no_notify, context).await,
                Commands::Reset { yes } => run_reset(yes, context).await,
                Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests;
