mod auth;
mod cli;
mod config;
mod history;
mod models;
mod store;
mod tracker;
mod ui;

#[cfg(test)]
mod tests;

use anyhow::Result;
use crate::config::settings::{Settings, StoreSettings, UserSettings};
use crate::ui::app::App;
use clap::{Arg, ArgAction, Command};
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("Neura Fit Tracker")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Track workout sessions and save them to your content store")
        .subcommand(
            Command::new("exercises")
                .about("List the exercise catalog")
                .arg(Arg::new("search").long("search").short('s').value_name("QUERY").help("Only show names containing QUERY"))
                .arg(
                    Arg::new("all")
                        .long("all")
                        .help("Include inactive exercises")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("history").about("Show your saved workouts").arg(
                Arg::new("limit")
                    .long("limit")
                    .short('n')
                    .value_name("N")
                    .value_parser(clap::value_parser!(usize))
                    .default_value("10"),
            ),
        )
        .subcommand(Command::new("stats").about("Show totals across your saved workouts"))
        .subcommand(
            Command::new("login")
                .about("Remember who you are for saving workouts")
                .arg(Arg::new("user-id").long("user-id").value_name("ID").required(true))
                .arg(Arg::new("name").long("name").value_name("NAME")),
        )
        .subcommand(Command::new("logout").about("Forget the stored sign-in"))
        .subcommand(
            Command::new("delete-workout")
                .about("Delete one saved workout")
                .arg(Arg::new("id").value_name("ID").required(true)),
        )
        .subcommand(
            Command::new("seed-exercises")
                .about("Load catalog exercises from a JSON file (Postgres store only)")
                .arg(
                    Arg::new("file")
                        .value_name("FILE")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

fn init_logging() -> bool {
    // Check if debug logging is enabled via .env
    let debug_enabled = env::var("DEBUG_LOGS_ENABLED")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    // The TUI owns the terminal, so logs only ever go to a file
    let log_file = if debug_enabled {
        OpenOptions::new().create(true).append(true).open("app.log").ok()
    } else {
        None
    };

    match log_file {
        Some(file) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("neura_fit_tracker=debug"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
            log::info!("=== DEBUG LOGGING ENABLED ===");
            log::info!("Writing logs to app.log");
            true
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    // Load .env file once, before logging and settings read it
    config::settings::load_env();
    let debug_enabled = init_logging();

    // Sign-in commands only need the local settings
    let user = UserSettings::new();
    match matches.subcommand() {
        Some(("login", sub)) => {
            let user_id = sub.get_one::<String>("user-id").cloned().unwrap_or_default();
            let name = sub.get_one::<String>("name").cloned();
            return cli::login(&user, user_id, name);
        }
        Some(("logout", _)) => return cli::logout(&user),
        _ => {}
    }

    let settings = match Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            eprintln!("  - Set SANITY_PROJECT_ID (and SANITY_TOKEN to save workouts), or");
            eprintln!("  - Set FIT_STORE=postgres and DATABASE_URL");
            std::process::exit(1);
        }
    };

    let identity = auth::identity::resolve(&settings.user);
    match &identity {
        Some(identity) => log::info!("Signed in as {}", identity.user_id),
        None => log::info!("No sign-in found, workouts can't be saved"),
    }

    if let Some(("seed-exercises", sub)) = matches.subcommand() {
        let StoreSettings::Postgres { database_url } = &settings.store else {
            anyhow::bail!("seed-exercises needs FIT_STORE=postgres");
        };
        let file = sub
            .get_one::<PathBuf>("file")
            .ok_or_else(|| anyhow::anyhow!("missing FILE argument"))?;
        let pg = store::postgres::PgStore::new(database_url).await?;
        return cli::seed_exercises(&pg, file).await;
    }

    log::info!("Connecting to content store...");
    let store = match store::connect(&settings.store).await {
        Ok(store) => store,
        Err(e) => {
            if debug_enabled {
                log::error!("Content store connection failed: {:?}", e);
            }
            eprintln!("❌ Failed to connect to the content store. Please check:");
            eprintln!("  - .env file has the right SANITY_* or DATABASE_URL values");
            eprintln!("  - The store is reachable from this machine");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match matches.subcommand() {
        Some(("exercises", sub)) => {
            let query = sub.get_one::<String>("search").map(String::as_str).unwrap_or("");
            cli::list_exercises(store.as_ref(), query, sub.get_flag("all")).await
        }
        Some(("history", sub)) => {
            let limit = sub.get_one::<usize>("limit").copied().unwrap_or(10);
            cli::show_history(store.as_ref(), identity.as_ref(), limit).await
        }
        Some(("stats", _)) => cli::show_stats(store.as_ref(), identity.as_ref()).await,
        Some(("delete-workout", sub)) => {
            let id = sub
                .get_one::<String>("id")
                .ok_or_else(|| anyhow::anyhow!("missing ID argument"))?;
            cli::delete_workout(store.as_ref(), id).await
        }
        _ => {
            log::info!("Starting Neura Fit Tracker ({} store)", store.name());
            let mut app = App::new(store, identity);
            app.run().await
        }
    }
}
