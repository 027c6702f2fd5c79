//! Spectator fleet - CLI entry point
//!
//! This binary launches and supervises a fleet of external spectator client
//! processes, and exposes small maintenance commands for the fleet
//! configuration file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use spectator_fleet::config::FleetConfig;
use spectator_fleet::fleet::{FleetEvent, FleetManager, CONFIG_FILE};
use spectator_fleet::logging;

/// Spectator client fleet supervisor
#[derive(Parser)]
#[command(name = "sfleet")]
#[command(version, about = "Spectator client fleet supervisor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the sfleet CLI
#[derive(Subcommand)]
enum Commands {
    /// Launch the configured fleet and supervise it until interrupted
    Run {
        /// Game install directory (configuration and client executable)
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Directory holding the per-client IPC sockets
        #[arg(long, default_value = "/tmp/spectator-fleet")]
        socket_dir: PathBuf,

        /// Override the configured client count for this run
        #[arg(long)]
        count: Option<u32>,

        /// Override the configured team size for this run
        #[arg(long)]
        team_size: Option<u32>,
    },

    /// Manage the fleet configuration file
    Config {
        /// Game install directory containing the configuration file
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Actions for the `config` subcommand.
#[derive(Subcommand)]
enum ConfigAction {
    /// Print all configuration entries
    Show,
    /// Set one configuration value and save
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Show configuration file path
    Path,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            dir,
            socket_dir,
            count,
            team_size,
        } => {
            logging::init();

            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Error: failed to create tokio runtime: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            if let Err(e) = rt.block_on(run_fleet(dir, socket_dir, count, team_size)) {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        Commands::Config { dir, action } => {
            return run_config_command(&dir, action);
        }
    }

    ExitCode::SUCCESS
}

/// Brings the fleet up, logs join/quit events, and tears everything down on
/// Ctrl-C.
async fn run_fleet(
    dir: PathBuf,
    socket_dir: PathBuf,
    count: Option<u32>,
    team_size: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let manager = FleetManager::open(&dir, &socket_dir)?;

    if let Some(count) = count {
        manager.set_client_count(count);
    }
    if let Some(team_size) = team_size {
        manager.set_team_size(team_size);
    }

    let mut events = manager.subscribe();

    if let Err(e) = manager.start_missing().await {
        tracing::warn!(%e, "some clients failed to start");
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested, quitting fleet");
                manager.quit_all().await;
                return Ok(());
            }
            event = events.recv() => {
                match event {
                    Ok(FleetEvent::Joined(identity)) => {
                        tracing::info!(%identity, "client joined");
                    }
                    Ok(FleetEvent::Quit(identity)) => {
                        tracing::info!(%identity, "client quit");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "fleet event stream lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Handles `sfleet config` actions against the on-disk configuration.
fn run_config_command(dir: &std::path::Path, action: ConfigAction) -> ExitCode {
    let path = dir.join(CONFIG_FILE);

    if let ConfigAction::Path = action {
        println!("{}", path.display());
        return ExitCode::SUCCESS;
    }

    let mut config = match FleetConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match action {
        ConfigAction::Show => {
            for (key, value) in config.entries() {
                println!("{} = {}", key, value);
            }
            ExitCode::SUCCESS
        }
        ConfigAction::Set { key, value } => {
            config.set(key, value);
            if let Err(e) = config.save() {
                eprintln!("Config error: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        ConfigAction::Path => unreachable!("handled above"),
    }
}
