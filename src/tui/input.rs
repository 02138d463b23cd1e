//! Cursor movement for keyboard navigation.

use chess_play_game::Square;
use crossterm::event::KeyCode;

/// Moves the cursor one square. White sits at the bottom, so up is towards
/// rank 8. The cursor stops at the board edge.
pub fn move_cursor(cursor: Square, key: KeyCode) -> Square {
    let (files, ranks) = match key {
        KeyCode::Up | KeyCode::Char('k') => (0, 1),
        KeyCode::Down | KeyCode::Char('j') => (0, -1),
        KeyCode::Left | KeyCode::Char('h') => (-1, 0),
        KeyCode::Right | KeyCode::Char('l') => (1, 0),
        _ => return cursor,
    };
    cursor.offset(files, ranks).unwrap_or(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().expect("valid square")
    }

    #[test]
    fn test_arrows_and_vim_keys() {
        assert_eq!(move_cursor(sq("e2"), KeyCode::Up), sq("e3"));
        assert_eq!(move_cursor(sq("e2"), KeyCode::Char('j')), sq("e1"));
        assert_eq!(move_cursor(sq("e2"), KeyCode::Char('h')), sq("d2"));
        assert_eq!(move_cursor(sq("e2"), KeyCode::Right), sq("f2"));
    }

    #[test]
    fn test_edges_hold() {
        assert_eq!(move_cursor(sq("a1"), KeyCode::Left), sq("a1"));
        assert_eq!(move_cursor(sq("a1"), KeyCode::Down), sq("a1"));
        assert_eq!(move_cursor(sq("h8"), KeyCode::Up), sq("h8"));
        assert_eq!(move_cursor(sq("h8"), KeyCode::Right), sq("h8"));
    }

    #[test]
    fn test_other_keys_ignored() {
        assert_eq!(move_cursor(sq("d4"), KeyCode::Enter), sq("d4"));
    }
}
