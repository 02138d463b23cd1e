//! Chess game session logic.
//!
//! # Architecture
//!
//! - **Board**: squares, pieces and moves shared by every layer
//! - **Oracle**: the [`RulesOracle`] capability and its `shakmaty` backend
//! - **Session**: the [`GameSession`] state machine driven by selections,
//!   clock ticks and deferred bot moves
//! - **Bot**: a uniformly random opponent
//!
//! # Example
//!
//! ```
//! use chess_play_game::{GameSession, SessionSettings, ShakmatyOracle, Square};
//!
//! let mut session = GameSession::new(ShakmatyOracle::new(), SessionSettings::default());
//! let e2: Square = "e2".parse().expect("valid square");
//! let e4: Square = "e4".parse().expect("valid square");
//! session.select_square(e2);
//! session.select_square(e4);
//! assert_eq!(session.move_log(), &vec!["e4".to_string()]);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod bot;
mod clock;
mod oracle;
mod session;

pub use board::{MoveSpec, Piece, PieceKind, Side, Square, SquareParseError};
pub use bot::RandomBot;
pub use clock::{TimeControl, format_clock};
pub use oracle::{MoveError, RulesOracle, ShakmatyOracle};
pub use session::{
    BotOutcome, BotTicket, ClockTick, DEFAULT_BOT_DELAY, GameMode, GameSession, GameStatus,
    MoveApplied, Selection, SessionSettings, SubmitOutcome, Termination, UndoStatusPolicy,
};
