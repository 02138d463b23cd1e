//! The rules oracle: the capability that knows chess legality.
//!
//! The session controller never inlines chess rules. Everything it needs to
//! know about a position goes through [`RulesOracle`], and any conforming
//! implementation can stand behind it. [`ShakmatyOracle`] is the one shipped
//! here, backed by the `shakmaty` crate.

use crate::board::{MoveSpec, Piece, PieceKind, Side, Square};
use derive_more::{Display, Error};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, File, Move, Position, Role};
use tracing::{debug, instrument, trace};

/// Half-moves without capture or pawn move after which the game is drawn.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Occurrences of one position that make a repetition draw.
const REPETITION_LIMIT: usize = 3;

/// Error returned when the oracle refuses to change the position.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// The move is not legal in the current position.
    #[display("Illegal move {}", _0)]
    Illegal(#[error(not(source))] MoveSpec),

    /// The position is terminal; no move is legal.
    #[display("Game is already over")]
    GameOver,

    /// A position could not be set up from notation.
    #[display("Invalid position: {}", _0)]
    InvalidPosition(#[error(not(source))] String),
}

/// Capability interface over a chess rules engine.
///
/// Queries are synchronous and return immediately.
pub trait RulesOracle {
    /// Distinct destination squares of the legal moves starting on `from`.
    fn legal_moves_from(&self, from: Square) -> Vec<Square>;

    /// Every legal move in the current position.
    fn legal_moves(&self) -> Vec<MoveSpec>;

    /// Applies a move and returns its notation.
    ///
    /// When the move is a promotion and `promotion` is `None`, the pawn
    /// promotes to a queen.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] if the move is not legal; the position is then
    /// unchanged.
    fn apply_move(&mut self, mv: MoveSpec) -> Result<String, MoveError>;

    /// Side to move is checkmated.
    fn is_checkmate(&self) -> bool;

    /// Position is drawn.
    fn is_draw(&self) -> bool;

    /// Side to move is in check.
    fn is_in_check(&self) -> bool;

    /// Checkmate or draw.
    fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }

    /// Side to move.
    fn current_turn(&self) -> Side;

    /// Notation of every move applied since the last reset, oldest first.
    fn move_history(&self) -> Vec<String>;

    /// Returns to the starting position with an empty history.
    fn reset(&mut self);

    /// Takes back the last move, returning its notation, or `None` when
    /// there is nothing to take back.
    fn undo(&mut self) -> Option<String>;

    /// Piece standing on `square`.
    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// Position in Forsyth–Edwards Notation.
    fn fen(&self) -> String;
}

/// [`RulesOracle`] backed by `shakmaty`'s standard chess rules.
#[derive(Debug, Clone)]
pub struct ShakmatyOracle {
    start: Chess,
    position: Chess,
    undo_stack: Vec<Chess>,
    history: Vec<String>,
    repetition_keys: Vec<String>,
}

impl ShakmatyOracle {
    /// Creates an oracle at the standard starting position.
    #[instrument]
    pub fn new() -> Self {
        Self::from_start(Chess::default())
    }

    /// Creates an oracle starting from a FEN position; `reset` returns here.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::InvalidPosition`] if the FEN does not parse or
    /// describes an illegal position.
    #[instrument]
    pub fn from_fen(fen: &str) -> Result<Self, MoveError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|e| MoveError::InvalidPosition(format!("{}: {}", fen, e)))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| MoveError::InvalidPosition(format!("{}: {}", fen, e)))?;
        debug!(fen, "Oracle set up from FEN");
        Ok(Self::from_start(position))
    }

    fn from_start(start: Chess) -> Self {
        let key = repetition_key(&start);
        Self {
            position: start.clone(),
            start,
            undo_stack: Vec::new(),
            history: Vec::new(),
            repetition_keys: vec![key],
        }
    }

    /// Finds the library move matching a requested move, applying the
    /// queen default for unspecified promotions.
    fn find_move(&self, mv: MoveSpec) -> Option<Move> {
        let wanted_promotion = mv.promotion.unwrap_or(PieceKind::Queen);
        self.position.legal_moves().into_iter().find(|m| {
            m.from().map(from_shakmaty_square) == Some(mv.from)
                && destination(m) == mv.to
                && m.promotion()
                    .is_none_or(|role| from_role(role) == wanted_promotion)
        })
    }

    fn repetition_count(&self) -> usize {
        match self.repetition_keys.last() {
            Some(current) => self
                .repetition_keys
                .iter()
                .filter(|key| *key == current)
                .count(),
            None => 0,
        }
    }
}

impl Default for ShakmatyOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesOracle for ShakmatyOracle {
    #[instrument(skip(self, from), fields(from = %from))]
    fn legal_moves_from(&self, from: Square) -> Vec<Square> {
        let mut targets: Vec<Square> = self
            .position
            .legal_moves()
            .iter()
            .filter(|m| m.from().map(from_shakmaty_square) == Some(from))
            .map(destination)
            .collect();
        targets.sort();
        targets.dedup();
        trace!(count = targets.len(), "Legal targets computed");
        targets
    }

    #[instrument(skip(self))]
    fn legal_moves(&self) -> Vec<MoveSpec> {
        self.position
            .legal_moves()
            .iter()
            .filter_map(|m| {
                let from = m.from().map(from_shakmaty_square)?;
                Some(MoveSpec {
                    from,
                    to: destination(m),
                    promotion: m.promotion().map(from_role),
                })
            })
            .collect()
    }

    #[instrument(skip(self, mv), fields(mv = %mv))]
    fn apply_move(&mut self, mv: MoveSpec) -> Result<String, MoveError> {
        if self.is_game_over() {
            debug!("Move refused, position is terminal");
            return Err(MoveError::GameOver);
        }

        let Some(m) = self.find_move(mv) else {
            debug!("Move is not legal here");
            return Err(MoveError::Illegal(mv));
        };

        self.undo_stack.push(self.position.clone());
        let san = SanPlus::from_move_and_play_unchecked(&mut self.position, &m).to_string();
        self.history.push(san.clone());
        self.repetition_keys.push(repetition_key(&self.position));

        debug!(san = %san, "Move applied");
        Ok(san)
    }

    fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    fn is_draw(&self) -> bool {
        self.position.is_stalemate()
            || self.position.is_insufficient_material()
            || self.position.halfmoves() >= FIFTY_MOVE_HALFMOVES
            || self.repetition_count() >= REPETITION_LIMIT
    }

    fn is_in_check(&self) -> bool {
        self.position.is_check()
    }

    fn current_turn(&self) -> Side {
        from_color(self.position.turn())
    }

    fn move_history(&self) -> Vec<String> {
        self.history.clone()
    }

    #[instrument(skip(self))]
    fn reset(&mut self) {
        *self = Self::from_start(self.start.clone());
        debug!("Oracle reset to starting position");
    }

    #[instrument(skip(self))]
    fn undo(&mut self) -> Option<String> {
        let previous = self.undo_stack.pop()?;
        self.position = previous;
        self.repetition_keys.pop();
        let san = self.history.pop();
        debug!(san = ?san, "Move taken back");
        san
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position
            .board()
            .piece_at(to_shakmaty_square(square))
            .map(|p| Piece::new(from_color(p.color), from_role(p.role)))
    }

    fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }
}

/// Placement, side to move, castling rights and en passant: the FEN fields
/// that identify a position for repetition purposes.
fn repetition_key(position: &Chess) -> String {
    Fen::from_position(position.clone(), EnPassantMode::Legal)
        .to_string()
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Where the moving piece ends up. For castling shakmaty reports the rook
/// square; the king's landing square is what a player clicks.
fn destination(m: &Move) -> Square {
    match m {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            from_shakmaty_square(shakmaty::Square::from_coords(file, king.rank()))
        }
        other => from_shakmaty_square(other.to()),
    }
}

fn to_shakmaty_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::new(u32::from(square.index()))
}

fn from_shakmaty_square(square: shakmaty::Square) -> Square {
    Square::from_masked_index(square as u8)
}

fn from_color(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

fn from_role(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().expect("valid square")
    }

    #[test]
    fn test_starting_position() {
        let oracle = ShakmatyOracle::new();
        assert_eq!(oracle.current_turn(), Side::White);
        assert_eq!(oracle.legal_moves().len(), 20);
        assert!(!oracle.is_in_check());
        assert!(!oracle.is_game_over());
        assert_eq!(
            oracle.piece_at(sq("e1")),
            Some(Piece::new(Side::White, PieceKind::King))
        );
        assert_eq!(oracle.piece_at(sq("e4")), None);
    }

    #[test]
    fn test_legal_moves_from_pawn() {
        let oracle = ShakmatyOracle::new();
        assert_eq!(oracle.legal_moves_from(sq("e2")), vec![sq("e3"), sq("e4")]);
        assert!(oracle.legal_moves_from(sq("e1")).is_empty());
    }

    #[test]
    fn test_apply_and_undo() {
        let mut oracle = ShakmatyOracle::new();
        let san = oracle
            .apply_move(MoveSpec::new(sq("g1"), sq("f3")))
            .expect("legal move");
        assert_eq!(san, "Nf3");
        assert_eq!(oracle.current_turn(), Side::Black);
        assert_eq!(oracle.move_history(), vec!["Nf3".to_string()]);

        assert_eq!(oracle.undo(), Some("Nf3".to_string()));
        assert_eq!(oracle.current_turn(), Side::White);
        assert!(oracle.move_history().is_empty());
        assert_eq!(oracle.undo(), None);
    }

    #[test]
    fn test_illegal_move_leaves_position() {
        let mut oracle = ShakmatyOracle::new();
        let before = oracle.fen();
        let result = oracle.apply_move(MoveSpec::new(sq("e2"), sq("e5")));
        assert!(matches!(result, Err(MoveError::Illegal(_))));
        assert_eq!(oracle.fen(), before);

        let err = result.expect_err("illegal move");
        assert_eq!(err.to_string(), "Illegal move e2e5");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let mut oracle =
            ShakmatyOracle::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").expect("valid fen");
        let san = oracle
            .apply_move(MoveSpec::new(sq("a7"), sq("a8")))
            .expect("legal promotion");
        assert!(san.starts_with("a8=Q"), "unexpected notation {san}");
        assert_eq!(
            oracle.piece_at(sq("a8")),
            Some(Piece::new(Side::White, PieceKind::Queen))
        );
    }

    #[test]
    fn test_castling_reported_as_king_destination() {
        let oracle = ShakmatyOracle::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1")
            .expect("valid fen");
        let targets = oracle.legal_moves_from(sq("e1"));
        assert!(targets.contains(&sq("g1")));
        assert!(targets.contains(&sq("c1")));
    }

    #[test]
    fn test_checkmate_detection() {
        let mut oracle = ShakmatyOracle::new();
        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            oracle
                .apply_move(MoveSpec::new(sq(from), sq(to)))
                .expect("legal move");
        }
        assert!(oracle.is_checkmate());
        assert!(oracle.is_in_check());
        assert!(oracle.is_game_over());
        assert_eq!(oracle.move_history().last().map(String::as_str), Some("Qh4#"));
        assert!(oracle.legal_moves().is_empty());
    }

    #[test]
    fn test_stalemate_is_draw() {
        let oracle = ShakmatyOracle::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").expect("valid fen");
        assert!(oracle.is_draw());
        assert!(!oracle.is_checkmate());
    }

    #[test]
    fn test_threefold_repetition_is_draw() {
        let mut oracle = ShakmatyOracle::new();
        let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
        for _ in 0..2 {
            for (from, to) in shuffle {
                assert!(!oracle.is_draw());
                oracle
                    .apply_move(MoveSpec::new(sq(from), sq(to)))
                    .expect("legal move");
            }
        }
        assert!(oracle.is_draw());
    }

    #[test]
    fn test_reset_returns_to_start() {
        let mut oracle = ShakmatyOracle::new();
        let start = oracle.fen();
        oracle
            .apply_move(MoveSpec::new(sq("d2"), sq("d4")))
            .expect("legal move");
        oracle.reset();
        assert_eq!(oracle.fen(), start);
        assert!(oracle.move_history().is_empty());
    }
}
