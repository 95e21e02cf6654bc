mod commands;
mod output;

use clap::{Parser, Subcommand};
use miette::Result;
use portrait_core::config::{self, DatabaseConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser)]
#[command(name = "portrait")]
#[command(about = "Portrait referral interview bot")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Database file path (overrides config)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Also write logs to daily files in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Telegram bot
    Run,
    /// Show how many friends have answered about a user
    Status { user_id: i64 },
    /// Print the portrait prompt built from a user's stored answers
    Prompt { user_id: i64 },
    /// Database inspection
    Db {
        #[command(subcommand)]
        cmd: DbCommands,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Show database stats
    Stats,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Save current configuration to file
    Save {
        /// Path to save configuration
        #[arg(default_value = "portrait.toml")]
        path: PathBuf,
    },
}

const CRATES: [&str; 3] = ["portrait_core", "portrait_telegram", "portrait_cli"];

fn init_tracing(debug: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    use tracing_subscriber::fmt::time::LocalTime;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if debug { "debug" } else { "info" };
    let default_filter = CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .chain(std::iter::once("warn".to_string()))
        .collect::<Vec<_>>()
        .join(",");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(LocalTime::rfc_3339())
        .compact();

    let (file, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "portrait.log"));
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(LocalTime::rfc_3339());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    // Flushes the log file on drop
    let _log_guard = init_tracing(cli.debug, cli.log_dir.as_deref());

    let mut config = if let Some(config_path) = &cli.config {
        info!("Loading config from: {:?}", config_path);
        config::load_config(config_path).await?
    } else {
        config::load_config_from_standard_locations().await?
    };
    config.apply_env_overrides();

    if let Some(db_path) = &cli.db_path {
        info!("Overriding database path with: {:?}", db_path);
        config.database = DatabaseConfig::Embedded {
            path: db_path.to_string_lossy().to_string(),
        };
    }

    tracing::debug!("Using database config: {:?}", config.database);

    match cli.command {
        Commands::Run => commands::run::run(&config).await?,
        Commands::Status { user_id } => commands::user::status(&config, user_id.into()).await?,
        Commands::Prompt { user_id } => commands::user::prompt(&config, user_id.into()).await?,
        Commands::Db { cmd } => match cmd {
            DbCommands::Stats => commands::db::stats(&config).await?,
        },
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => commands::config::show(&config)?,
            ConfigCommands::Save { path } => commands::config::save(&config, &path).await?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_and_subcommands() {
        let cli =
            Cli::try_parse_from(["portrait", "--debug", "--db-path", "/tmp/p.db", "status", "42"])
                .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/p.db")));
        assert!(matches!(cli.command, Commands::Status { user_id: 42 }));

        let cli = Cli::try_parse_from(["portrait", "config", "save"]).unwrap();
        match cli.command {
            Commands::Config {
                cmd: ConfigCommands::Save { path },
            } => assert_eq!(path, PathBuf::from("portrait.toml")),
            _ => panic!("expected config save"),
        }
    }
}
