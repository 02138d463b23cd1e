//! Command-line interface for chess_play.

use crate::AppConfig;
use chess_play_game::{GameMode, TimeControl};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chess Play - terminal chess with clocks, a random bot and a game archive
#[derive(Parser, Debug)]
#[command(name = "chess_play")]
#[command(about = "Terminal chess with clocks and a game archive", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (defaults apply when it is missing)
    #[arg(long, global = true, default_value = "chess_play.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the terminal board
    Play {
        /// Who plays: human, bot or online
        #[arg(long, value_parser = parse_mode)]
        mode: Option<GameMode>,

        /// Starting clock: blitz, rapid, classical or a number of seconds
        #[arg(long, value_parser = parse_time_control)]
        time_control: Option<TimeControl>,

        /// Archive server URL used by the save key
        #[arg(long)]
        server_url: Option<String>,

        /// Seed for the bot, for reproducible games
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run the game archive REST server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Command {
    /// Lays this command's flags over `config`.
    pub fn apply_to(&self, config: AppConfig) -> AppConfig {
        match self {
            Command::Play {
                mode,
                time_control,
                server_url,
                seed,
            } => {
                let mut config = config;
                if let Some(mode) = mode {
                    config = config.with_mode(*mode);
                }
                if let Some(time_control) = time_control {
                    config = config.with_time_control(*time_control);
                }
                if let Some(url) = server_url {
                    config = config.with_server_url(url.clone());
                }
                if let Some(seed) = seed {
                    config = config.with_bot_seed(*seed);
                }
                config
            }
            Command::Serve { host, port } => {
                let mut server = config.server().clone();
                if let Some(host) = host {
                    server = server.with_host(host.clone());
                }
                if let Some(port) = port {
                    server = server.with_port(*port);
                }
                config.with_server(server)
            }
        }
    }
}

/// Parses a game mode name.
pub fn parse_mode(s: &str) -> Result<GameMode, String> {
    s.parse()
        .map_err(|_| format!("unknown mode '{}', expected human, bot or online", s))
}

/// Parses a preset name or a number of seconds.
pub fn parse_time_control(s: &str) -> Result<TimeControl, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "blitz" => Ok(TimeControl::Blitz),
        "rapid" => Ok(TimeControl::Rapid),
        "classical" => Ok(TimeControl::Classical),
        other => other.parse().map(TimeControl::Custom).map_err(|_| {
            format!(
                "unknown time control '{}', expected blitz, rapid, classical or seconds",
                s
            )
        }),
    }
}
