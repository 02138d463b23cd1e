//! Application configuration.
//!
//! Settings come from a TOML file, then the environment, then command-line
//! flags; each layer overrides the one before. A missing file is not an
//! error and yields the defaults.

use chess_play_game::{GameMode, SessionSettings, TimeControl, UndoStatusPolicy};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Environment variable naming the archive server.
pub const SERVER_URL_VAR: &str = "CHESS_PLAY_SERVER_URL";

/// Environment variable naming the port `serve` binds to.
pub const PORT_VAR: &str = "CHESS_PLAY_PORT";

/// Settings for the `serve` command.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct ServerConfig {
    /// Address to bind.
    host: String,
    /// Port to bind.
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Settings for a chess_play process.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[serde(default)]
#[setters(prefix = "with_")]
pub struct AppConfig {
    /// Mode the first game starts in.
    mode: GameMode,

    /// Starting clock for each side.
    time_control: TimeControl,

    /// Delay before the bot replies, in milliseconds.
    bot_delay_ms: u64,

    /// Fixed bot seed for reproducible games.
    #[setters(strip_option)]
    bot_seed: Option<u64>,

    /// Status reported after taking moves back.
    undo_policy: UndoStatusPolicy,

    /// Archive server base URL, e.g. `http://127.0.0.1:5000`.
    #[setters(strip_option)]
    server_url: Option<String>,

    /// Log destination while the terminal board is open.
    log_file: PathBuf,

    /// Settings for `serve`.
    server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            time_control: TimeControl::default(),
            bot_delay_ms: 500,
            bot_seed: None,
            undo_policy: UndoStatusPolicy::default(),
            server_url: None,
            log_file: PathBuf::from("chess_play.log"),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(
            mode = %config.mode,
            time_control = %config.time_control,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            debug!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable holds an invalid value.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `CHESS_PLAY_PORT` is not a port number.
    #[instrument(skip(self, lookup))]
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup(SERVER_URL_VAR).filter(|url| !url.trim().is_empty()) {
            debug!(url = %url, "Server URL from environment");
            self.server_url = Some(url);
        }
        if let Some(port) = lookup(PORT_VAR) {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid {} '{}': {}", PORT_VAR, port, e)))?;
            debug!(port, "Port from environment");
            self.server.port = port;
        }
        Ok(self)
    }

    /// Bot reply delay.
    pub fn bot_delay(&self) -> Duration {
        Duration::from_millis(self.bot_delay_ms)
    }

    /// Settings handed to each game session.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings::new(self.time_control, self.undo_policy, self.bot_delay())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(*config.mode(), GameMode::HumanVsHuman);
        assert_eq!(*config.time_control(), TimeControl::Rapid);
        assert_eq!(config.bot_delay(), Duration::from_millis(500));
        assert_eq!(config.server().port(), &5000);
        assert_eq!(config.server_url(), &None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
mode = "bot"
time_control = "blitz"
bot_seed = 9

[server]
port = 8080
"#,
        )
        .expect("valid toml");
        assert_eq!(*config.mode(), GameMode::HumanVsBot);
        assert_eq!(config.session_settings().time_control(), &TimeControl::Blitz);
        assert_eq!(config.bot_seed(), &Some(9));
        assert_eq!(config.server().port(), &8080);
        assert_eq!(config.server().host(), "127.0.0.1");
        assert_eq!(*config.bot_delay_ms(), 500);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::default()
            .with_overrides(|key| match key {
                SERVER_URL_VAR => Some("http://archive:5000".to_string()),
                PORT_VAR => Some("6001".to_string()),
                _ => None,
            })
            .expect("valid overrides");
        assert_eq!(config.server_url().as_deref(), Some("http://archive:5000"));
        assert_eq!(*config.server().port(), 6001);
    }

    #[test]
    fn test_bad_port_override() {
        let result = AppConfig::default().with_overrides(|key| {
            (key == PORT_VAR).then(|| "not-a-port".to_string())
        });
        let err = result.expect_err("port must be numeric");
        assert!(err.message.contains(PORT_VAR));
    }
}
