//! Board vocabulary shared by the oracle, the session controller and the UI.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::EnumIter;
use tracing::instrument;

/// One of the two sides.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// White moves first.
    #[display("white")]
    White,
    /// Black.
    #[display("black")]
    Black,
}

impl Side {
    /// Returns the other side.
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

/// Kind of chess piece, independent of side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    /// Pawn.
    #[display("pawn")]
    Pawn,
    /// Knight.
    #[display("knight")]
    Knight,
    /// Bishop.
    #[display("bishop")]
    Bishop,
    /// Rook.
    #[display("rook")]
    Rook,
    /// Queen.
    #[display("queen")]
    Queen,
    /// King.
    #[display("king")]
    King,
}

/// A piece standing on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    /// Owner of the piece.
    pub side: Side,
    /// What the piece is.
    pub kind: PieceKind,
}

impl Piece {
    /// Creates a piece.
    pub fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }

    /// Unicode chess glyph for this piece.
    pub fn glyph(&self) -> char {
        match (self.side, self.kind) {
            (Side::White, PieceKind::King) => '♔',
            (Side::White, PieceKind::Queen) => '♕',
            (Side::White, PieceKind::Rook) => '♖',
            (Side::White, PieceKind::Bishop) => '♗',
            (Side::White, PieceKind::Knight) => '♘',
            (Side::White, PieceKind::Pawn) => '♙',
            (Side::Black, PieceKind::King) => '♚',
            (Side::Black, PieceKind::Queen) => '♛',
            (Side::Black, PieceKind::Rook) => '♜',
            (Side::Black, PieceKind::Bishop) => '♝',
            (Side::Black, PieceKind::Knight) => '♞',
            (Side::Black, PieceKind::Pawn) => '♟',
        }
    }
}

/// A board square, file `a..h` and rank `1..8`, stored zero-based.
/// Defaults to a1.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Creates a square from zero-based file and rank, `None` when off the board.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    /// Zero-based file (0 = a).
    pub fn file(&self) -> u8 {
        self.file
    }

    /// Zero-based rank (0 = rank 1).
    pub fn rank(&self) -> u8 {
        self.rank
    }

    /// Index in `0..64`, a1 = 0, h8 = 63.
    pub fn index(&self) -> u8 {
        self.rank * 8 + self.file
    }

    /// Square for an index in `0..64`.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::new(index % 8, index / 8)
    }

    /// Square for an index masked into `0..64`; for conversions from board
    /// libraries whose squares are always in range.
    pub(crate) fn from_masked_index(index: u8) -> Self {
        Self {
            file: index & 7,
            rank: (index >> 3) & 7,
        }
    }

    /// Steps by the given file/rank deltas, `None` when leaving the board.
    pub fn offset(&self, files: i8, ranks: i8) -> Option<Self> {
        let file = self.file as i8 + files;
        let rank = self.rank as i8 + ranks;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Self::new(file as u8, rank as u8)
        } else {
            None
        }
    }

    /// All 64 squares, a1 first.
    pub fn all() -> impl Iterator<Item = Square> {
        (0u8..64).filter_map(Square::from_index)
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

/// Error returned when a string is not an algebraic square.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid square: '{}'", input)]
pub struct SquareParseError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Square {
    type Err = SquareParseError;

    #[instrument(level = "trace")]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SquareParseError {
            input: s.to_string(),
        };
        match s.trim().as_bytes() {
            [file @ b'a'..=b'h', rank @ b'1'..=b'8'] => {
                Square::new(file - b'a', rank - b'1').ok_or_else(err)
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Square {
    type Error = SquareParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

/// A move as the oracle enumerates it.
///
/// For castling, `to` is the square the king lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveSpec {
    /// Origin square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
    /// Promotion piece, if the move promotes.
    pub promotion: Option<PieceKind>,
}

impl MoveSpec {
    /// Creates a non-promoting move.
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Creates a move with an explicit promotion piece.
    pub fn with_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }
}

impl std::fmt::Display for MoveSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            let letter = match kind {
                PieceKind::Knight => 'n',
                PieceKind::Bishop => 'b',
                PieceKind::Rook => 'r',
                _ => 'q',
            };
            write!(f, "{}", letter)?;
        }
        Ok(())
    }
}
