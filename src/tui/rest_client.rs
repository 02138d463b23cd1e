//! Archive client: saves the session to the REST server on request.

use anyhow::{Context, Result};
use chess_play_game::{GameSession, RulesOracle, Side, Termination};
use chess_play_server::{
    GameRecord, GameUpdate, MoveSubmission, NewGameRecord, RecordStatus, TimeRemaining, Winner,
};
use derive_getters::Getters;
use tracing::{debug, info, instrument};

/// What gets archived from a session at the moment of saving.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ArchiveSnapshot {
    game_number: u32,
    fen: String,
    moves: Vec<String>,
    time_control: u32,
    white_clock: u32,
    black_clock: u32,
    termination: Option<Termination>,
}

impl ArchiveSnapshot {
    /// Captures a session. Returns `None` before the oracle is attached.
    pub fn capture<O: RulesOracle>(game_number: u32, session: &GameSession<O>) -> Option<Self> {
        Some(Self {
            game_number,
            fen: session.fen()?,
            moves: session.move_log().clone(),
            time_control: session.settings().time_control().seconds(),
            white_clock: session.clock(Side::White),
            black_clock: session.clock(Side::Black),
            termination: *session.termination(),
        })
    }

    /// Record status and winner for this snapshot.
    pub fn outcome(&self) -> (RecordStatus, Option<Winner>) {
        match self.termination {
            None => (RecordStatus::Active, None),
            Some(Termination::Draw) => (RecordStatus::Completed, Some(Winner::Draw)),
            Some(termination) => {
                let winner = match termination.winner() {
                    Some(Side::White) => Some(Winner::White),
                    Some(Side::Black) => Some(Winner::Black),
                    None => Some(Winner::Draw),
                };
                (RecordStatus::Completed, winner)
            }
        }
    }
}

/// HTTP client for the game archive.
///
/// The first save of a game creates its record; later saves post only the
/// moves played since, then bring status and clocks up to date.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    base_url: String,
    client: reqwest::Client,
    game_number: Option<u32>,
    record_id: Option<i32>,
    synced_moves: Vec<String>,
}

impl ArchiveClient {
    /// Creates a client for the server at `base_url`.
    #[instrument]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            game_number: None,
            record_id: None,
            synced_moves: Vec::new(),
        }
    }

    /// Server base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Saves a snapshot and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or refuses a request.
    #[instrument(
        skip(self, snapshot),
        fields(game_number = snapshot.game_number, moves = snapshot.moves.len())
    )]
    pub async fn save(&mut self, snapshot: &ArchiveSnapshot) -> Result<GameRecord> {
        if self.game_number != Some(snapshot.game_number) {
            debug!("New game, archive record will be created");
            self.game_number = Some(snapshot.game_number);
            self.record_id = None;
            self.synced_moves.clear();
        }

        let id = match self.record_id {
            Some(id) => {
                self.push_moves(id, snapshot).await?;
                id
            }
            None => {
                let record = self.create(snapshot).await?;
                *record.id()
            }
        };

        let (status, winner) = snapshot.outcome();
        let mut update = GameUpdate::default()
            .with_game_state(snapshot.fen.clone())
            .with_status(status)
            .with_white_time_remaining(snapshot.white_clock)
            .with_black_time_remaining(snapshot.black_clock);
        if let Some(winner) = winner {
            update = update.with_winner(winner);
        }
        let record: GameRecord = self
            .client
            .put(format!("{}/api/games/{}", self.base_url, id))
            .json(&update)
            .send()
            .await
            .context("Archive server unreachable")?
            .error_for_status()
            .context("Archive refused update")?
            .json()
            .await
            .context("Unexpected archive response")?;

        info!(record_id = id, moves = %record.moves(), "Game saved");
        Ok(record)
    }

    async fn create(&mut self, snapshot: &ArchiveSnapshot) -> Result<GameRecord> {
        let mut new_game = NewGameRecord::new(snapshot.fen.clone());
        new_game.moves = Some(snapshot.moves.join(" "));
        new_game.time_control = Some(snapshot.time_control);

        let record: GameRecord = self
            .client
            .post(format!("{}/api/games", self.base_url))
            .json(&new_game)
            .send()
            .await
            .context("Archive server unreachable")?
            .error_for_status()
            .context("Archive refused new game")?
            .json()
            .await
            .context("Unexpected archive response")?;

        debug!(record_id = record.id(), "Archive record created");
        self.record_id = Some(*record.id());
        self.synced_moves = snapshot.moves.clone();
        Ok(record)
    }

    /// Posts moves played since the last save. If moves were taken back in
    /// between, the stored list is replaced instead.
    async fn push_moves(&mut self, id: i32, snapshot: &ArchiveSnapshot) -> Result<()> {
        let extends = snapshot.moves.starts_with(&self.synced_moves);
        if !extends {
            debug!("Move list diverged, replacing stored moves");
            self.client
                .put(format!("{}/api/games/{}", self.base_url, id))
                .json(&GameUpdate::default().with_moves(snapshot.moves.join(" ")))
                .send()
                .await
                .context("Archive server unreachable")?
                .error_for_status()
                .context("Archive refused move list")?;
            self.synced_moves = snapshot.moves.clone();
            return Ok(());
        }

        let pending = snapshot.moves[self.synced_moves.len()..].to_vec();
        for san in pending {
            let submission = MoveSubmission::new(san.clone()).with_time_remaining(
                TimeRemaining::new(Some(snapshot.white_clock), Some(snapshot.black_clock)),
            );
            self.client
                .post(format!("{}/api/games/{}/move", self.base_url, id))
                .json(&submission)
                .send()
                .await
                .context("Archive server unreachable")?
                .error_for_status()
                .context("Archive refused move")?;
            self.synced_moves.push(san);
        }
        Ok(())
    }
}
