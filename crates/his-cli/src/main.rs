mod cli;
mod commands;
mod config;
mod observability;
mod output;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, ConfigCommands};
use config::ConfigStore;
use output::{print_error, print_log_summary};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let recent = observability::init_tracing(&cli.log_level);

    let result = run(&cli).await;
    if cli.log_summary {
        print_log_summary(&recent.entries());
    }
    if let Err(e) = result {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let store = ConfigStore::open_default()?;
    let profile = cli.profile.as_str();
    let profile_cfg = store.load_profile(profile)?;
    let format = cli
        .format
        .or_else(|| profile_cfg.output_format())
        .unwrap_or_default();

    match &cli.command {
        Commands::Login(args) => commands::auth::login(&store, profile, args)?,
        Commands::Logout => commands::auth::logout(&store, profile)?,
        Commands::Whoami => commands::auth::whoami(&store, profile, format)?,
        Commands::Open(args) => {
            let server = store.resolve_server(cli.server.as_deref(), profile)?;
            let auth = profile_cfg.auth_config()?;
            commands::open::open(&store, profile, &server, &auth, &args.paths, format).await?;
        }
        Commands::Idcard(args) => commands::idcard::idcard(&args.numbers, format)?,
        Commands::Check(args) => commands::check::check(&args.field, format)?,
        Commands::Import(args) => commands::import::import(&args.file, format)?,
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => {
                let auth = profile_cfg.auth_config()?;
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "Server".cyan(),
                    profile_cfg.server.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    profile_cfg.format.as_deref().unwrap_or("table")
                );
                println!(
                    "{}: {}",
                    "Cache window".cyan(),
                    humantime_serde::re::humantime::format_duration(auth.guard.cache_window)
                );
                println!("{}: {}", "Login path".cyan(), auth.guard.login_path);
                for rule in &auth.guard.routes {
                    println!("  {} → {}", rule.prefix, rule.role);
                }
            }
            ConfigCommands::Set(set_args) => {
                let mut cfg = profile_cfg;
                match set_args.key.as_str() {
                    "server" => cfg.server = Some(set_args.value.clone()),
                    "format" => cfg.format = Some(set_args.value.clone()),
                    "cache_window" => {
                        let window: Duration =
                            humantime_serde::re::humantime::parse_duration(&set_args.value)
                                .with_context(|| format!("Invalid duration: {}", set_args.value))?;
                        cfg.auth.get_or_insert_with(Default::default).guard.cache_window = window;
                        cfg.auth_config()?;
                    }
                    other => anyhow::bail!(
                        "Unknown config key: {other}. Valid keys: server, format, cache_window"
                    ),
                }
                store.save_profile(profile, cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
    }

    Ok(())
}
