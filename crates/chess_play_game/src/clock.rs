//! Time controls and clock formatting.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// How much time each side starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum TimeControl {
    /// Five minutes.
    #[display("Blitz (5 min)")]
    Blitz,
    /// Ten minutes.
    #[default]
    #[display("Rapid (10 min)")]
    Rapid,
    /// Thirty minutes.
    #[display("Classical (30 min)")]
    Classical,
    /// Any number of seconds.
    #[display("Custom ({}s)", _0)]
    Custom(u32),
}

impl TimeControl {
    /// Starting clock value in seconds.
    pub fn seconds(self) -> u32 {
        match self {
            Self::Blitz => 300,
            Self::Rapid => 600,
            Self::Classical => 1800,
            Self::Custom(seconds) => seconds,
        }
    }

    /// Next preset in the settings cycle; custom controls go back to blitz.
    #[instrument]
    pub fn next(self) -> Self {
        match self {
            Self::Blitz => Self::Rapid,
            Self::Rapid => Self::Classical,
            Self::Classical | Self::Custom(_) => Self::Blitz,
        }
    }
}

/// Renders seconds as `MM:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(TimeControl::Blitz.seconds(), 300);
        assert_eq!(TimeControl::default().seconds(), 600);
        assert_eq!(TimeControl::Classical.seconds(), 1800);
        assert_eq!(TimeControl::Custom(42).seconds(), 42);
    }

    #[test]
    fn test_cycle() {
        assert_eq!(TimeControl::Blitz.next(), TimeControl::Rapid);
        assert_eq!(TimeControl::Classical.next(), TimeControl::Blitz);
        assert_eq!(TimeControl::Custom(5).next(), TimeControl::Blitz);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(0), "00:00");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&TimeControl::Blitz).expect("serialize");
        assert_eq!(json, "\"blitz\"");
    }
}
