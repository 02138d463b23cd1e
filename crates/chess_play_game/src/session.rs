//! Game session controller.
//!
//! [`GameSession`] owns every piece of mutable session state (selection,
//! turn, clocks, status, move log) and routes every question about the
//! position through a [`RulesOracle`]. It is driven by three kinds of
//! event: a square being picked, a one-second clock tick, and a deferred
//! bot move. Each call runs to completion; the session holds no locks and
//! expects a single owner to serialize those events.

use crate::board::{MoveSpec, Piece, Side, Square};
use crate::bot::RandomBot;
use crate::clock::TimeControl;
use crate::oracle::RulesOracle;
use derive_getters::Getters;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{EnumIter, EnumString};
use tracing::{debug, info, instrument, warn};

/// Delay between a human move and the bot's reply.
pub const DEFAULT_BOT_DELAY: Duration = Duration::from_millis(500);

/// Status of the game as last derived from the oracle or the clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Play continues, side to move is not in check.
    #[display("active")]
    Active,
    /// Side to move is in check.
    #[display("check")]
    Check,
    /// Side to move is mated, or a clock ran out.
    #[display("checkmate")]
    Checkmate,
    /// Drawn position.
    #[display("draw")]
    Draw,
}

impl GameStatus {
    /// Checkmate and draw accept no further moves until a new game.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Checkmate | Self::Draw)
    }
}

/// Who is playing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum GameMode {
    /// Two humans sharing the board.
    #[default]
    #[serde(rename = "human")]
    #[strum(serialize = "human", serialize = "human-vs-human")]
    #[display("Human vs Human")]
    HumanVsHuman,
    /// A human against the random bot.
    #[serde(rename = "bot")]
    #[strum(serialize = "bot", serialize = "human-vs-bot")]
    #[display("Human vs Bot")]
    HumanVsBot,
    /// Advertised online play; there is no transport, so it plays as
    /// human vs human.
    #[serde(rename = "online")]
    #[strum(serialize = "online")]
    #[display("Online")]
    Online,
}

impl GameMode {
    /// Next mode in the selector cycle.
    pub fn next(self) -> Self {
        match self {
            Self::HumanVsHuman => Self::HumanVsBot,
            Self::HumanVsBot => Self::Online,
            Self::Online => Self::HumanVsHuman,
        }
    }
}

/// Why play ended.
///
/// A timeout reports [`GameStatus::Checkmate`] as its status; this keeps the
/// actual cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Termination {
    /// The winner mated the other side.
    #[display("{} wins by checkmate", winner)]
    Checkmate {
        /// Winning side.
        winner: Side,
    },
    /// The flagged side ran out of time.
    #[display("{} ran out of time", flagged)]
    Timeout {
        /// Side whose clock reached zero.
        flagged: Side,
    },
    /// The position is drawn.
    #[display("draw")]
    Draw,
}

impl Termination {
    /// Winning side, if any.
    pub fn winner(self) -> Option<Side> {
        match self {
            Self::Checkmate { winner } => Some(winner),
            Self::Timeout { flagged } => Some(flagged.opponent()),
            Self::Draw => None,
        }
    }
}

/// What `undo_move` reports as the status afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndoStatusPolicy {
    /// Always `Active`, even when the restored position is a check.
    #[default]
    ResetToActive,
    /// Ask the oracle about the restored position.
    Recompute,
}

/// Session-wide settings that survive `new_game`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct SessionSettings {
    time_control: TimeControl,
    undo_policy: UndoStatusPolicy,
    bot_delay: Duration,
}

impl SessionSettings {
    /// Creates settings.
    pub fn new(
        time_control: TimeControl,
        undo_policy: UndoStatusPolicy,
        bot_delay: Duration,
    ) -> Self {
        Self {
            time_control,
            undo_policy,
            bot_delay,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::new(
            TimeControl::default(),
            UndoStatusPolicy::default(),
            DEFAULT_BOT_DELAY,
        )
    }
}

/// A single-shot request to play the bot's reply after `delay`.
///
/// The ticket belongs to the position it was issued for; once anything
/// else changes the position it is stale and playing it does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct BotTicket {
    epoch: u64,
    delay: Duration,
}

/// A move the session accepted.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct MoveApplied {
    san: String,
    mover: Side,
    status: GameStatus,
    bot_reply: Option<BotTicket>,
}

/// Result of [`GameSession::select_square`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Nothing happened: no oracle yet, or the game is over.
    Ignored,
    /// The selected square was picked again and is no longer selected.
    Deselected,
    /// A piece of the side to move is now selected.
    Selected {
        /// The selected square.
        square: Square,
        /// Where that piece may go.
        targets: Vec<Square>,
    },
    /// The pick completed a move.
    Moved(MoveApplied),
    /// The pick named a target the oracle refused.
    Rejected,
    /// The pick was not a piece of the side to move; selection cleared.
    Cleared,
}

/// Result of [`GameSession::submit_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The move was played.
    Applied(MoveApplied),
    /// The oracle refused the move; nothing changed.
    Rejected,
    /// No oracle yet, or the game is over.
    Ignored,
}

/// Result of [`GameSession::play_bot_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotOutcome {
    /// The bot played a move.
    Played(MoveApplied),
    /// The ticket was issued for a position that no longer exists.
    Stale,
    /// No legal move, or the game is already over.
    GameOver,
    /// No oracle yet.
    Ignored,
}

/// Result of [`GameSession::clock_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Clocks are not running.
    Idle,
    /// One second came off `side`'s clock.
    Ticked {
        /// Side that was charged.
        side: Side,
        /// Seconds left on that clock.
        remaining: u32,
    },
    /// A clock reached zero and play stopped.
    Expired {
        /// Side whose clock reached zero.
        flagged: Side,
    },
}

/// The game session state machine.
#[derive(Debug, Getters)]
pub struct GameSession<O> {
    #[getter(skip)]
    oracle: Option<O>,
    #[getter(skip)]
    bot: RandomBot,
    selected_square: Option<Square>,
    legal_targets: Vec<Square>,
    side_to_move: Side,
    status: GameStatus,
    white_clock: u32,
    black_clock: u32,
    clock_running: bool,
    move_log: Vec<String>,
    mode: GameMode,
    termination: Option<Termination>,
    epoch: u64,
    settings: SessionSettings,
}

impl<O: RulesOracle> GameSession<O> {
    /// Creates a session around an initialized oracle.
    ///
    /// Clocks are set from the time control but do not run until the first
    /// move is played or a new game is started.
    #[instrument(skip(oracle))]
    pub fn new(oracle: O, settings: SessionSettings) -> Self {
        let mut session = Self::detached(settings);
        session.initialize(oracle);
        session
    }

    /// Creates a session whose oracle is not available yet. Every operation
    /// is a no-op until [`GameSession::initialize`] is called.
    #[instrument]
    pub fn detached(settings: SessionSettings) -> Self {
        let seconds = settings.time_control.seconds();
        Self {
            oracle: None,
            bot: RandomBot::from_entropy(),
            selected_square: None,
            legal_targets: Vec::new(),
            side_to_move: Side::White,
            status: GameStatus::Active,
            white_clock: seconds,
            black_clock: seconds,
            clock_running: false,
            move_log: Vec::new(),
            mode: GameMode::default(),
            termination: None,
            epoch: 0,
            settings,
        }
    }

    /// Replaces the bot, typically with a seeded one.
    pub fn with_bot(mut self, bot: RandomBot) -> Self {
        self.bot = bot;
        self
    }

    /// Starts in the given mode.
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Attaches the oracle and mirrors its turn and history.
    #[instrument(skip(self, oracle))]
    pub fn initialize(&mut self, oracle: O) {
        self.side_to_move = oracle.current_turn();
        self.move_log = oracle.move_history();
        self.status = derive_status(&oracle);
        self.termination = derive_termination(self.status, self.side_to_move);
        self.oracle = Some(oracle);
        info!(side_to_move = %self.side_to_move, "Session initialized");
    }

    /// Read access to the oracle, for rendering and persistence.
    pub fn oracle(&self) -> Option<&O> {
        self.oracle.as_ref()
    }

    /// Piece on `square`, if the oracle is available.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.oracle.as_ref()?.piece_at(square)
    }

    /// Position notation, if the oracle is available.
    pub fn fen(&self) -> Option<String> {
        self.oracle.as_ref().map(RulesOracle::fen)
    }

    /// Remaining seconds on `side`'s clock.
    pub fn clock(&self, side: Side) -> u32 {
        match side {
            Side::White => self.white_clock,
            Side::Black => self.black_clock,
        }
    }

    /// Handles a player picking a square.
    ///
    /// In priority order: picking the selected square deselects it; picking
    /// one of its legal targets plays the move; picking a piece of the side
    /// to move selects it; anything else clears the selection.
    #[instrument(skip(self, square), fields(square = %square, selected = ?self.selected_square))]
    pub fn select_square(&mut self, square: Square) -> Selection {
        let Some(oracle) = self.oracle.as_ref() else {
            debug!("No oracle, ignoring selection");
            return Selection::Ignored;
        };

        if self.status.is_terminal() {
            debug!(status = %self.status, "Game is over, ignoring selection");
            self.clear_selection();
            return Selection::Ignored;
        }

        if self.selected_square == Some(square) {
            self.clear_selection();
            debug!("Deselected");
            return Selection::Deselected;
        }

        if let Some(from) = self.selected_square {
            if self.legal_targets.contains(&square) {
                return match self.submit_move(from, square) {
                    SubmitOutcome::Applied(applied) => Selection::Moved(applied),
                    SubmitOutcome::Rejected => Selection::Rejected,
                    SubmitOutcome::Ignored => Selection::Ignored,
                };
            }
        }

        let owns_piece = oracle
            .piece_at(square)
            .is_some_and(|piece| piece.side == self.side_to_move);

        if owns_piece {
            let targets = oracle.legal_moves_from(square);
            debug!(targets = targets.len(), "Selected piece");
            self.selected_square = Some(square);
            self.legal_targets = targets.clone();
            Selection::Selected { square, targets }
        } else {
            self.clear_selection();
            Selection::Cleared
        }
    }

    /// Plays `from` → `to` for the side to move, promoting to a queen.
    ///
    /// A refused move leaves the session untouched. In human-vs-bot mode an
    /// accepted move that does not end the game carries a [`BotTicket`] for
    /// the reply.
    #[instrument(skip(self, from, to), fields(from = %from, to = %to))]
    pub fn submit_move(&mut self, from: Square, to: Square) -> SubmitOutcome {
        if self.status.is_terminal() {
            debug!(status = %self.status, "Game is over, ignoring move");
            return SubmitOutcome::Ignored;
        }
        let mover = self.side_to_move;
        let Some(oracle) = self.oracle.as_mut() else {
            debug!("No oracle, ignoring move");
            return SubmitOutcome::Ignored;
        };

        match oracle.apply_move(MoveSpec::new(from, to)) {
            Ok(san) => {
                self.clear_selection();
                let mut applied = self.record_move(san, mover);
                if self.mode == GameMode::HumanVsBot && !self.status.is_terminal() {
                    let ticket = BotTicket {
                        epoch: self.epoch,
                        delay: self.settings.bot_delay,
                    };
                    debug!(epoch = ticket.epoch, delay = ?ticket.delay, "Bot reply scheduled");
                    applied.bot_reply = Some(ticket);
                }
                SubmitOutcome::Applied(applied)
            }
            Err(e) => {
                debug!(error = %e, "Move rejected");
                SubmitOutcome::Rejected
            }
        }
    }

    /// Plays the bot's reply for a ticket issued by [`GameSession::submit_move`].
    #[instrument(skip(self, ticket), fields(ticket_epoch = ticket.epoch, epoch = self.epoch))]
    pub fn play_bot_move(&mut self, ticket: BotTicket) -> BotOutcome {
        if self.oracle.is_none() {
            return BotOutcome::Ignored;
        }
        if ticket.epoch != self.epoch {
            debug!("Stale bot ticket ignored");
            return BotOutcome::Stale;
        }
        if self.status.is_terminal() {
            return BotOutcome::GameOver;
        }

        let mover = self.side_to_move;
        let Some(oracle) = self.oracle.as_mut() else {
            return BotOutcome::Ignored;
        };
        let moves = oracle.legal_moves();
        let Some(choice) = self.bot.choose(&moves) else {
            debug!("Bot has no legal move");
            return BotOutcome::GameOver;
        };

        match oracle.apply_move(choice) {
            Ok(san) => {
                let applied = self.record_move(san, mover);
                self.drop_foreign_selection();
                BotOutcome::Played(applied)
            }
            Err(e) => {
                warn!(error = %e, mv = %choice, "Oracle refused its own legal move");
                BotOutcome::GameOver
            }
        }
    }

    /// Charges one second to the side to move.
    ///
    /// When either clock reaches zero the clocks stop, the status becomes
    /// [`GameStatus::Checkmate`] and the termination records the timeout.
    #[instrument(skip(self))]
    pub fn clock_tick(&mut self) -> ClockTick {
        if self.oracle.is_none() || !self.clock_running {
            return ClockTick::Idle;
        }

        let side = self.side_to_move;
        let clock = match side {
            Side::White => &mut self.white_clock,
            Side::Black => &mut self.black_clock,
        };
        *clock = clock.saturating_sub(1);
        let remaining = *clock;

        if self.white_clock == 0 || self.black_clock == 0 {
            let flagged = if remaining == 0 { side } else { side.opponent() };
            self.clock_running = false;
            self.status = GameStatus::Checkmate;
            self.termination = Some(Termination::Timeout { flagged });
            self.clear_selection();
            info!(flagged = %flagged, "Clock expired");
            return ClockTick::Expired { flagged };
        }

        ClockTick::Ticked { side, remaining }
    }

    /// Resets the position and every field except the mode and settings.
    /// The clocks start running immediately.
    #[instrument(skip(self))]
    pub fn new_game(&mut self) {
        let Some(oracle) = self.oracle.as_mut() else {
            debug!("No oracle, ignoring new game");
            return;
        };
        oracle.reset();
        self.side_to_move = oracle.current_turn();
        self.move_log = oracle.move_history();

        let seconds = self.settings.time_control.seconds();
        self.clear_selection();
        self.status = GameStatus::Active;
        self.termination = None;
        self.white_clock = seconds;
        self.black_clock = seconds;
        self.clock_running = true;
        self.epoch += 1;

        info!(mode = %self.mode, seconds, "New game started");
    }

    /// Takes back the last move, or the last two in human-vs-bot mode so
    /// the human is to move again. Clocks keep their current values.
    ///
    /// Returns the notation of the moves taken back, most recent first.
    #[instrument(skip(self))]
    pub fn undo_move(&mut self) -> Vec<String> {
        let Some(oracle) = self.oracle.as_mut() else {
            debug!("No oracle, ignoring undo");
            return Vec::new();
        };

        let plies = if self.mode == GameMode::HumanVsBot { 2 } else { 1 };
        let undone: Vec<String> = (0..plies).filter_map(|_| oracle.undo()).collect();

        self.side_to_move = oracle.current_turn();
        self.move_log = oracle.move_history();
        self.status = match self.settings.undo_policy {
            UndoStatusPolicy::ResetToActive => GameStatus::Active,
            UndoStatusPolicy::Recompute => derive_status(oracle),
        };
        self.termination = derive_termination(self.status, self.side_to_move);
        if self.status != GameStatus::Active {
            self.clock_running = false;
        }
        self.clear_selection();
        self.epoch += 1;

        info!(undone = ?undone, status = %self.status, "Moves taken back");
        undone
    }

    /// Switches who is playing. Takes effect immediately.
    #[instrument(skip(self))]
    pub fn set_mode(&mut self, mode: GameMode) {
        info!(from = %self.mode, to = %mode, "Game mode changed");
        self.mode = mode;
    }

    /// Changes the time control used by the next [`GameSession::new_game`].
    #[instrument(skip(self))]
    pub fn set_time_control(&mut self, time_control: TimeControl) {
        info!(time_control = %time_control, "Time control changed");
        self.settings.time_control = time_control;
    }

    /// Pauses or resumes the clocks. Clocks only resume while the status is
    /// `Active`. Returns whether they are running afterwards.
    #[instrument(skip(self))]
    pub fn toggle_clock(&mut self) -> bool {
        if self.oracle.is_none() {
            return false;
        }
        self.clock_running = !self.clock_running && self.status == GameStatus::Active;
        debug!(running = self.clock_running, "Clock toggled");
        self.clock_running
    }

    /// Re-derives turn, status and log after the oracle accepted a move.
    fn record_move(&mut self, san: String, mover: Side) -> MoveApplied {
        if let Some(oracle) = self.oracle.as_ref() {
            self.side_to_move = oracle.current_turn();
            self.move_log = oracle.move_history();
            self.status = derive_status(oracle);
        }
        self.termination = derive_termination(self.status, self.side_to_move);
        self.clock_running = self.status == GameStatus::Active;
        self.epoch += 1;

        info!(
            san = %san,
            mover = %mover,
            status = %self.status,
            moves = self.move_log.len(),
            "Move played"
        );

        MoveApplied {
            san,
            mover,
            status: self.status,
            bot_reply: None,
        }
    }

    fn clear_selection(&mut self) {
        self.selected_square = None;
        self.legal_targets.clear();
    }

    /// A selection may only hold a piece of the side to move.
    fn drop_foreign_selection(&mut self) {
        let Some(square) = self.selected_square else {
            return;
        };
        let still_ours = self
            .piece_at(square)
            .is_some_and(|piece| piece.side == self.side_to_move);
        if !still_ours {
            self.clear_selection();
        }
    }
}

/// Checkmate, then draw, then check; the first that holds wins.
fn derive_status<O: RulesOracle>(oracle: &O) -> GameStatus {
    if oracle.is_checkmate() {
        GameStatus::Checkmate
    } else if oracle.is_draw() {
        GameStatus::Draw
    } else if oracle.is_in_check() {
        GameStatus::Check
    } else {
        GameStatus::Active
    }
}

fn derive_termination(status: GameStatus, side_to_move: Side) -> Option<Termination> {
    match status {
        GameStatus::Checkmate => Some(Termination::Checkmate {
            winner: side_to_move.opponent(),
        }),
        GameStatus::Draw => Some(Termination::Draw),
        GameStatus::Active | GameStatus::Check => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ShakmatyOracle;

    #[test]
    fn test_mode_parse() {
        assert_eq!("bot".parse::<GameMode>().ok(), Some(GameMode::HumanVsBot));
        assert_eq!("human-vs-human".parse::<GameMode>().ok(), Some(GameMode::HumanVsHuman));
        assert_eq!("online".parse::<GameMode>().ok(), Some(GameMode::Online));
        assert!("chess960".parse::<GameMode>().is_err());
    }

    #[test]
    fn test_mode_cycle_visits_all() {
        let mut mode = GameMode::HumanVsHuman;
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(mode);
            mode = mode.next();
        }
        assert_eq!(mode, GameMode::HumanVsHuman);
        assert_eq!(seen.len(), <GameMode as strum::IntoEnumIterator>::iter().count());
    }

    #[test]
    fn test_termination_winner() {
        assert_eq!(Termination::Timeout { flagged: Side::White }.winner(), Some(Side::Black));
        assert_eq!(Termination::Checkmate { winner: Side::White }.winner(), Some(Side::White));
        assert_eq!(Termination::Draw.winner(), None);
    }

    #[test]
    fn test_toggle_clock_only_resumes_when_active() {
        let mut session = GameSession::new(ShakmatyOracle::new(), SessionSettings::default());
        assert!(!session.clock_running());
        assert!(session.toggle_clock());
        assert!(!session.toggle_clock());

        session.status = GameStatus::Check;
        assert!(!session.toggle_clock());
    }

    #[test]
    fn test_initial_clocks_follow_time_control() {
        let settings = SessionSettings::new(
            TimeControl::Blitz,
            UndoStatusPolicy::default(),
            DEFAULT_BOT_DELAY,
        );
        let session = GameSession::new(ShakmatyOracle::new(), settings);
        assert_eq!(session.clock(Side::White), 300);
        assert_eq!(session.clock(Side::Black), 300);
    }
}
