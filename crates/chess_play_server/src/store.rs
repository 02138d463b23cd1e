//! In-memory record store for users and games.

use crate::{
    GameRecord, GameUpdate, MoveSubmission, NewGameRecord, NewUser, RecordStatus, StoreError,
    StoreErrorKind, User,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

#[derive(Debug, Default)]
struct Records {
    users: BTreeMap<i32, User>,
    games: BTreeMap<i32, GameRecord>,
    last_user_id: i32,
    last_game_id: i32,
}

/// Users and games held for the lifetime of the process.
///
/// Cloning is cheap; clones share the same records. Ids start at 1 and
/// increase by one per record. Lists come back ordered by id.
#[derive(Debug, Clone, Default)]
pub struct GameStore {
    records: Arc<Mutex<Records>>,
}

impl GameStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory game store");
        Self::default()
    }

    #[track_caller]
    fn lock(&self) -> Result<MutexGuard<'_, Records>, StoreError> {
        self.records
            .lock()
            .map_err(|e| StoreError::new(StoreErrorKind::LockPoisoned, e.to_string()))
    }

    /// Registers a user with the default rating.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the username is taken.
    #[instrument(skip(self, new_user), fields(username = %new_user.username()))]
    pub fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut records = self.lock()?;
        if records
            .users
            .values()
            .any(|user| user.username() == new_user.username())
        {
            return Err(StoreError::new(
                StoreErrorKind::DuplicateUsername,
                format!("Username '{}' already exists", new_user.username()),
            ));
        }

        records.last_user_id += 1;
        let user = User::register(records.last_user_id, new_user);
        records.users.insert(*user.id(), user.clone());

        info!(user_id = user.id(), "User created");
        Ok(user)
    }

    /// Looks up a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable.
    #[instrument(skip(self))]
    pub fn get_user(&self, id: i32) -> Result<Option<User>, StoreError> {
        let user = self.lock()?.users.get(&id).cloned();
        debug!(found = user.is_some(), "User lookup");
        Ok(user)
    }

    /// Looks up a user by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable.
    #[instrument(skip(self))]
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = self
            .lock()?
            .users
            .values()
            .find(|user| user.username() == username)
            .cloned();
        debug!(found = user.is_some(), "User lookup by name");
        Ok(user)
    }

    /// Creates an active game with both clocks at the time control.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable.
    #[instrument(skip(self, new_game), fields(time_control = ?new_game.time_control))]
    pub fn create_game(&self, new_game: NewGameRecord) -> Result<GameRecord, StoreError> {
        let mut records = self.lock()?;
        records.last_game_id += 1;
        let game = GameRecord::create(records.last_game_id, new_game, Utc::now());
        records.games.insert(*game.id(), game.clone());

        info!(game_id = game.id(), "Game created");
        Ok(game)
    }

    /// Looks up a game by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable.
    #[instrument(skip(self))]
    pub fn get_game(&self, id: i32) -> Result<Option<GameRecord>, StoreError> {
        let game = self.lock()?.games.get(&id).cloned();
        debug!(found = game.is_some(), "Game lookup");
        Ok(game)
    }

    /// Merges `update` into a game. Returns `None` when the game does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable.
    #[instrument(skip(self, update))]
    pub fn update_game(
        &self,
        id: i32,
        update: GameUpdate,
    ) -> Result<Option<GameRecord>, StoreError> {
        let mut records = self.lock()?;
        let Some(game) = records.games.get_mut(&id) else {
            debug!("Game not found");
            return Ok(None);
        };
        game.apply(update, Utc::now());

        info!(game_id = id, status = ?game.status(), "Game updated");
        Ok(Some(game.clone()))
    }

    /// Appends a move to a game. Returns `None` when the game does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable.
    #[instrument(skip(self, submission), fields(mv = %submission.mv))]
    pub fn record_move(
        &self,
        id: i32,
        submission: MoveSubmission,
    ) -> Result<Option<GameRecord>, StoreError> {
        let mut records = self.lock()?;
        let Some(game) = records.games.get_mut(&id) else {
            debug!("Game not found");
            return Ok(None);
        };
        game.record(submission, Utc::now());

        info!(game_id = id, moves = %game.moves(), "Move recorded");
        Ok(Some(game.clone()))
    }

    /// Games whose status is active.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable.
    #[instrument(skip(self))]
    pub fn list_active_games(&self) -> Result<Vec<GameRecord>, StoreError> {
        let games: Vec<GameRecord> = self
            .lock()?
            .games
            .values()
            .filter(|game| *game.status() == RecordStatus::Active)
            .cloned()
            .collect();
        debug!(count = games.len(), "Active games listed");
        Ok(games)
    }

    /// Games in which the user plays either side.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unavailable.
    #[instrument(skip(self))]
    pub fn list_user_games(&self, user_id: i32) -> Result<Vec<GameRecord>, StoreError> {
        let games: Vec<GameRecord> = self
            .lock()?
            .games
            .values()
            .filter(|game| game.involves(user_id))
            .cloned()
            .collect();
        debug!(count = games.len(), "User games listed");
        Ok(games)
    }
}
