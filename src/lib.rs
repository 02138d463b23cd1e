//! Chess Play - terminal chess with clocks, a random bot and a game archive.
//!
//! # Architecture
//!
//! - **Game**: the session controller and rules oracle (`chess_play_game`)
//! - **Server**: the in-memory record store behind a REST API (`chess_play_server`)
//! - **TUI**: the terminal board that drives a session and saves it on request
//! - **Config**: TOML file, environment and command-line settings

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cli;
mod config;
mod tui;

pub use cli::{Cli, Command, parse_mode, parse_time_control};
pub use config::{AppConfig, ConfigError, PORT_VAR, SERVER_URL_VAR, ServerConfig};
pub use tui::{App, ArchiveClient, ArchiveSnapshot, Effect, format_move_log, move_cursor, run_tui};
