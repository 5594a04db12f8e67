// src/main.rs

use anyhow::Result;
use clap::Parser;
use repkg::logging::{self, LogSettings};
use repkg::{Config, Pacman, Privilege};
use std::process::ExitCode;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::Context;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_deref())?;

    logging::init(&LogSettings {
        level: config.log.level.clone(),
        verbose: cli.verbose,
        quiet: cli.quiet,
    });

    let ctx = Context::new(config, cli.db_path, Privilege::current());
    let backend = Pacman::new();

    match cli.command.unwrap_or(Commands::Rebuild) {
        Commands::Rebuild => commands::cmd_rebuild(&ctx, &backend),
        Commands::Update { packages, stdin } => {
            commands::cmd_update(&ctx, &backend, &packages, stdin)?;
            Ok(0)
        }
        Commands::Create {
            package,
            dependencies,
            auto,
        } => {
            commands::cmd_create(&ctx, &backend, &package, &dependencies, auto)?;
            Ok(0)
        }
        Commands::Remove { packages } => {
            commands::cmd_remove(&ctx, &backend, &packages)?;
            Ok(0)
        }
        Commands::List { detail } => {
            commands::cmd_list(&ctx, &backend, detail)?;
            Ok(0)
        }
        Commands::Rules { short, user } => {
            commands::cmd_rules(&ctx, &backend, short, user)?;
            Ok(0)
        }
        Commands::Clear { packages } => {
            commands::cmd_clear(&ctx, &backend, &packages)?;
            Ok(0)
        }
        Commands::Frontend {
            set,
            waved,
            reset,
            tool,
        } => {
            commands::cmd_frontend(&ctx, set, waved, reset, &tool)?;
            Ok(0)
        }
    }
}
