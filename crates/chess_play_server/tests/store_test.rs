//! Tests for the in-memory game store.

use chess_play_server::{
    DEFAULT_RATING, GameStore, GameUpdate, MoveSubmission, NewGameRecord, NewUser, RecordStatus,
    StoreErrorKind, TimeRemaining, Winner,
};

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn game_between(white: Option<i32>, black: Option<i32>) -> NewGameRecord {
    let mut new_game = NewGameRecord::new(START_FEN.to_string());
    new_game.white_player_id = white;
    new_game.black_player_id = black;
    new_game
}

#[test]
fn test_create_user_defaults() {
    let store = GameStore::new();
    let user = store
        .create_user(NewUser::new("alice".to_string()))
        .expect("Failed to create user");

    assert_eq!(*user.id(), 1);
    assert_eq!(user.username(), "alice");
    assert_eq!(*user.rating(), DEFAULT_RATING);
    assert_eq!(*user.games_played(), 0);
    assert_eq!(*user.games_won(), 0);
}

#[test]
fn test_user_ids_increase_from_one() {
    let store = GameStore::new();
    let ids: Vec<i32> = ["a", "b", "c"]
        .iter()
        .map(|name| {
            *store
                .create_user(NewUser::new(name.to_string()))
                .expect("Failed to create user")
                .id()
        })
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_duplicate_username_rejected() {
    let store = GameStore::new();
    store
        .create_user(NewUser::new("bob".to_string()))
        .expect("Failed to create user");
    let err = store
        .create_user(NewUser::new("bob".to_string()))
        .expect_err("Duplicate should fail");
    assert_eq!(err.kind, StoreErrorKind::DuplicateUsername);
}

#[test]
fn test_user_lookup() {
    let store = GameStore::new();
    let user = store
        .create_user(NewUser::new("carol".to_string()))
        .expect("Failed to create user");

    let by_id = store.get_user(*user.id()).expect("lookup");
    assert_eq!(by_id.as_ref(), Some(&user));
    let by_name = store.get_user_by_username("carol").expect("lookup");
    assert_eq!(by_name, Some(user));

    assert_eq!(store.get_user(99).expect("lookup"), None);
    assert_eq!(store.get_user_by_username("nobody").expect("lookup"), None);
}

#[test]
fn test_create_game_defaults() {
    let store = GameStore::new();
    let game = store
        .create_game(game_between(Some(1), Some(2)))
        .expect("Failed to create game");

    assert_eq!(*game.id(), 1);
    assert_eq!(*game.status(), RecordStatus::Active);
    assert_eq!(*game.winner(), None);
    assert_eq!(*game.time_control(), 600);
    assert_eq!(*game.white_time_remaining(), 600);
    assert_eq!(*game.black_time_remaining(), 600);
    assert_eq!(game.moves(), "");
    assert_eq!(game.created_at(), game.updated_at());
}

#[test]
fn test_create_game_with_time_control() {
    let store = GameStore::new();
    let mut new_game = game_between(None, None);
    new_game.time_control = Some(300);
    let game = store.create_game(new_game).expect("Failed to create game");
    assert_eq!(*game.time_control(), 300);
    assert_eq!(*game.white_time_remaining(), 300);
    assert_eq!(*game.black_time_remaining(), 300);
}

#[test]
fn test_update_game_merges_fields() {
    let store = GameStore::new();
    let game = store
        .create_game(game_between(Some(1), None))
        .expect("Failed to create game");

    let updated = store
        .update_game(
            *game.id(),
            GameUpdate::default()
                .with_status(RecordStatus::Completed)
                .with_winner(Winner::White),
        )
        .expect("update")
        .expect("game exists");

    assert_eq!(*updated.status(), RecordStatus::Completed);
    assert_eq!(*updated.winner(), Some(Winner::White));
    assert_eq!(*updated.white_player_id(), Some(1));
    assert_eq!(updated.game_state(), START_FEN);
    assert!(updated.updated_at() >= game.updated_at());
    assert_eq!(updated.created_at(), game.created_at());

    let stored = store.get_game(*game.id()).expect("lookup");
    assert_eq!(stored, Some(updated));
}

#[test]
fn test_update_missing_game_returns_none() {
    let store = GameStore::new();
    let result = store
        .update_game(7, GameUpdate::default().with_moves("e4".to_string()))
        .expect("update");
    assert_eq!(result, None);
}

#[test]
fn test_record_move_joins_with_spaces() {
    let store = GameStore::new();
    let id = *store
        .create_game(game_between(None, None))
        .expect("Failed to create game")
        .id();

    store
        .record_move(id, MoveSubmission::new("e4".to_string()).with_game_state("fen-1"))
        .expect("record")
        .expect("game exists");
    let game = store
        .record_move(
            id,
            MoveSubmission::new("e5".to_string())
                .with_game_state("fen-2")
                .with_time_remaining(TimeRemaining::new(None, Some(580))),
        )
        .expect("record")
        .expect("game exists");

    assert_eq!(game.moves(), "e4 e5");
    assert_eq!(game.game_state(), "fen-2");
    assert_eq!(*game.white_time_remaining(), 600);
    assert_eq!(*game.black_time_remaining(), 580);

    assert_eq!(
        store
            .record_move(99, MoveSubmission::new("e4".to_string()))
            .expect("record"),
        None
    );
}

#[test]
fn test_list_active_and_user_games() {
    let store = GameStore::new();
    let first = store.create_game(game_between(Some(1), Some(2))).expect("create");
    let second = store.create_game(game_between(Some(2), Some(3))).expect("create");
    let third = store.create_game(game_between(Some(3), Some(1))).expect("create");

    store
        .update_game(
            *second.id(),
            GameUpdate::default().with_status(RecordStatus::Abandoned),
        )
        .expect("update");

    let active: Vec<i32> = store
        .list_active_games()
        .expect("list")
        .iter()
        .map(|game| *game.id())
        .collect();
    assert_eq!(active, vec![*first.id(), *third.id()]);

    let user_one: Vec<i32> = store
        .list_user_games(1)
        .expect("list")
        .iter()
        .map(|game| *game.id())
        .collect();
    assert_eq!(user_one, vec![*first.id(), *third.id()]);

    assert!(store.list_user_games(42).expect("list").is_empty());
}

#[test]
fn test_clones_share_records() {
    let store = GameStore::new();
    let handle = store.clone();
    handle
        .create_user(NewUser::new("dave".to_string()))
        .expect("Failed to create user");
    assert!(store.get_user_by_username("dave").expect("lookup").is_some());
}
