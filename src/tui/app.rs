//! Application state and key handling.

use super::input::move_cursor;
use super::rest_client::ArchiveSnapshot;
use chess_play_game::{
    BotOutcome, BotTicket, ClockTick, GameSession, MoveApplied, Selection, ShakmatyOracle, Square,
};
use crossterm::event::KeyCode;
use tracing::{debug, info};

/// Work the event loop must do after a key or event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Leave the application.
    Quit,
    /// Play the bot's reply after the ticket's delay.
    ScheduleBot(BotTicket),
    /// Drop any pending bot reply.
    CancelBot,
    /// Save the game to the archive server.
    Save,
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    session: GameSession<ShakmatyOracle>,
    cursor: Square,
    status_message: String,
    game_number: u32,
}

impl App {
    /// Creates the application around a session. Play starts with a new
    /// game so the clocks run from the first second.
    pub fn new(mut session: GameSession<ShakmatyOracle>) -> Self {
        session.new_game();
        Self {
            session,
            cursor: Square::new(4, 1).unwrap_or_default(),
            status_message: "White to move".to_string(),
            game_number: 1,
        }
    }

    /// The game session.
    pub fn session(&self) -> &GameSession<ShakmatyOracle> {
        &self.session
    }

    /// Square under the cursor.
    pub fn cursor(&self) -> Square {
        self.cursor
    }

    /// Last status message.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Replaces the status message.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    /// Captures the session for the archive.
    pub fn snapshot(&self) -> Option<ArchiveSnapshot> {
        ArchiveSnapshot::capture(self.game_number, &self.session)
    }

    /// Handles one key press.
    pub fn handle_key(&mut self, code: KeyCode) -> Option<Effect> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                info!("User quit");
                Some(Effect::Quit)
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.pick(),
            KeyCode::Char('n') => {
                self.session.new_game();
                self.game_number += 1;
                self.status_message = format!("New game ({})", self.session.mode());
                Some(Effect::CancelBot)
            }
            KeyCode::Char('u') => {
                let undone = self.session.undo_move();
                self.status_message = if undone.is_empty() {
                    "Nothing to take back".to_string()
                } else {
                    format!("Took back {}", undone.join(", "))
                };
                Some(Effect::CancelBot)
            }
            KeyCode::Char('m') => {
                let mode = self.session.mode().next();
                self.session.set_mode(mode);
                self.status_message = format!("Mode: {}", mode);
                None
            }
            KeyCode::Char('t') => {
                let time_control = self.session.settings().time_control().next();
                self.session.set_time_control(time_control);
                self.status_message = format!("{} from the next game", time_control);
                None
            }
            KeyCode::Char('p') => {
                self.status_message = if self.session.toggle_clock() {
                    "Clock running".to_string()
                } else {
                    "Clock paused".to_string()
                };
                None
            }
            KeyCode::Char('s') => Some(Effect::Save),
            other => {
                self.cursor = move_cursor(self.cursor, other);
                None
            }
        }
    }

    fn pick(&mut self) -> Option<Effect> {
        match self.session.select_square(self.cursor) {
            Selection::Moved(applied) => {
                self.announce(&applied);
                (*applied.bot_reply()).map(Effect::ScheduleBot)
            }
            Selection::Selected { square, targets } => {
                self.status_message = format!("{} selected, {} moves", square, targets.len());
                None
            }
            Selection::Rejected => {
                self.status_message = "Illegal move".to_string();
                None
            }
            Selection::Deselected | Selection::Cleared => {
                self.status_message = format!("{} to move", self.session.side_to_move());
                None
            }
            Selection::Ignored => {
                self.status_message = "Game over - press n for a new game".to_string();
                None
            }
        }
    }

    /// Plays a bot reply whose delay has elapsed.
    pub fn play_bot(&mut self, ticket: BotTicket) {
        match self.session.play_bot_move(ticket) {
            BotOutcome::Played(applied) => self.announce(&applied),
            outcome => debug!(?outcome, "Bot reply dropped"),
        }
    }

    /// Handles one elapsed second.
    pub fn tick(&mut self) {
        if let ClockTick::Expired { flagged } = self.session.clock_tick() {
            self.status_message = format!("{} ran out of time", flagged);
        }
    }

    fn announce(&mut self, applied: &MoveApplied) {
        self.status_message = match self.session.termination() {
            Some(termination) => format!("{} {} - {}", applied.mover(), applied.san(), termination),
            None => format!("{} played {}", applied.mover(), applied.san()),
        };
    }
}
