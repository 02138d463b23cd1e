//! Stored records and the request bodies that create or change them.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Rating every new user starts with.
pub const DEFAULT_RATING: i32 = 1200;

/// Time control applied when a new record does not name one, in seconds.
pub const DEFAULT_TIME_CONTROL: u32 = 600;

/// A registered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: i32,
    username: String,
    rating: i32,
    games_played: u32,
    games_won: u32,
}

impl User {
    pub(crate) fn register(id: i32, new_user: NewUser) -> Self {
        Self {
            id,
            username: new_user.username,
            rating: DEFAULT_RATING,
            games_played: 0,
            games_won: 0,
        }
    }

    /// The public part of a user, as returned by the API.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            rating: self.rating,
        }
    }
}

/// Request body for registering a user. Any password sent along is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct NewUser {
    username: String,
}

/// Id, name and rating of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User id.
    pub id: i32,
    /// Unique name.
    pub username: String,
    /// Current rating.
    pub rating: i32,
}

/// Lifecycle of a stored game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Still being played.
    #[default]
    Active,
    /// Finished with a result.
    Completed,
    /// Left unfinished.
    Abandoned,
}

/// Result of a stored game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    /// White won.
    White,
    /// Black won.
    Black,
    /// Drawn.
    Draw,
}

/// A stored game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    id: i32,
    white_player_id: Option<i32>,
    black_player_id: Option<i32>,
    /// Position in FEN.
    game_state: String,
    /// Moves in SAN, separated by single spaces.
    moves: String,
    status: RecordStatus,
    winner: Option<Winner>,
    time_control: u32,
    white_time_remaining: u32,
    black_time_remaining: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GameRecord {
    pub(crate) fn create(id: i32, new_game: NewGameRecord, now: DateTime<Utc>) -> Self {
        let time_control = new_game
            .time_control
            .filter(|seconds| *seconds > 0)
            .unwrap_or(DEFAULT_TIME_CONTROL);
        Self {
            id,
            white_player_id: new_game.white_player_id,
            black_player_id: new_game.black_player_id,
            game_state: new_game.game_state,
            moves: new_game.moves.unwrap_or_default(),
            status: RecordStatus::Active,
            winner: None,
            time_control,
            white_time_remaining: time_control,
            black_time_remaining: time_control,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` plays either side.
    pub fn involves(&self, user_id: i32) -> bool {
        self.white_player_id == Some(user_id) || self.black_player_id == Some(user_id)
    }

    /// Overwrites every field the update names.
    #[instrument(skip(self, update), fields(id = self.id))]
    pub(crate) fn apply(&mut self, update: GameUpdate, now: DateTime<Utc>) {
        let GameUpdate {
            white_player_id,
            black_player_id,
            game_state,
            moves,
            status,
            winner,
            time_control,
            white_time_remaining,
            black_time_remaining,
        } = update;

        if let Some(id) = white_player_id {
            self.white_player_id = Some(id);
        }
        if let Some(id) = black_player_id {
            self.black_player_id = Some(id);
        }
        if let Some(fen) = game_state {
            self.game_state = fen;
        }
        if let Some(moves) = moves {
            self.moves = moves;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(winner) = winner {
            self.winner = Some(winner);
        }
        if let Some(seconds) = time_control {
            self.time_control = seconds;
        }
        if let Some(seconds) = white_time_remaining {
            self.white_time_remaining = seconds;
        }
        if let Some(seconds) = black_time_remaining {
            self.black_time_remaining = seconds;
        }
        self.updated_at = now;
    }

    /// Appends one move and takes over the submitted position and clocks.
    #[instrument(skip(self, submission), fields(id = self.id, mv = %submission.mv))]
    pub(crate) fn record(&mut self, submission: MoveSubmission, now: DateTime<Utc>) {
        if self.moves.is_empty() {
            self.moves = submission.mv;
        } else {
            self.moves.push(' ');
            self.moves.push_str(&submission.mv);
        }
        if let Some(fen) = submission.game_state {
            self.game_state = fen;
        }
        if let Some(remaining) = submission.time_remaining {
            if let Some(white) = remaining.white {
                self.white_time_remaining = white;
            }
            if let Some(black) = remaining.black {
                self.black_time_remaining = black;
            }
        }
        self.updated_at = now;
    }
}

/// Request body for creating a game record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct NewGameRecord {
    /// Starting position in FEN.
    pub game_state: String,
    /// White's user id.
    #[new(default)]
    #[serde(default)]
    pub white_player_id: Option<i32>,
    /// Black's user id.
    #[new(default)]
    #[serde(default)]
    pub black_player_id: Option<i32>,
    /// Moves already played.
    #[new(default)]
    #[serde(default)]
    pub moves: Option<String>,
    /// Starting clock in seconds.
    #[new(default)]
    #[serde(default)]
    pub time_control: Option<u32>,
}

/// Partial update of a game record. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Setters)]
#[serde(rename_all = "camelCase", default)]
#[setters(prefix = "with_", strip_option)]
pub struct GameUpdate {
    /// New white player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_player_id: Option<i32>,
    /// New black player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black_player_id: Option<i32>,
    /// New position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_state: Option<String>,
    /// Replacement move list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moves: Option<String>,
    /// New lifecycle status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    /// Result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    /// New time control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_control: Option<u32>,
    /// White's clock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_time_remaining: Option<u32>,
    /// Black's clock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black_time_remaining: Option<u32>,
}

/// Remaining clocks sent with a move. Either side may be omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct TimeRemaining {
    /// White's clock in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white: Option<u32>,
    /// Black's clock in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black: Option<u32>,
}

/// Request body for `POST /api/games/{id}/move`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct MoveSubmission {
    /// The move in SAN.
    #[serde(rename = "move")]
    pub mv: String,
    /// Position after the move.
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<String>,
    /// Clocks after the move.
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<TimeRemaining>,
}

impl MoveSubmission {
    /// Attaches the position after the move.
    pub fn with_game_state(mut self, fen: impl Into<String>) -> Self {
        self.game_state = Some(fen.into());
        self
    }

    /// Attaches the clocks after the move.
    pub fn with_time_remaining(mut self, remaining: TimeRemaining) -> Self {
        self.time_remaining = Some(remaining);
        self
    }
}

/// Query string of `GET /api/games`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamesQuery {
    /// List this user's games instead of the active ones.
    pub user_id: Option<i32>,
}
