//! Game record persistence.
//!
//! A [`GameStore`] holds users and games in memory for the life of the
//! process and [`router`] exposes it over REST. The store is an explicit
//! value: build one at startup and hand it to the router.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod api;
mod error;
mod models;
mod store;

pub use api::router;
pub use error::{ApiError, ErrorBody, StoreError, StoreErrorKind};
pub use models::{
    DEFAULT_RATING, DEFAULT_TIME_CONTROL, GameRecord, GameUpdate, GamesQuery, MoveSubmission,
    NewGameRecord, NewUser, RecordStatus, TimeRemaining, User, UserSummary, Winner,
};
pub use store::GameStore;
