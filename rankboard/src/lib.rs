//! # rankboard
//!
//! Ordered Kanban boards kept in order with LexoRank keys.
//!
//! Every list and card carries a [`Rank`]: a string key that sorts
//! lexicographically into display order. Moving or inserting an entity only ever
//! assigns a new key to that entity, never to its siblings.
//!
//! ## Layout
//!
//! - [`lexorank`]: allocation of ranks between neighbours
//! - [`collection`]: rank-sorted sequences of cards or lists
//! - [`state`]: the copy-on-write board snapshot and its mutations
//! - [`controller`]: optimistic moves with rollback, and server-confirmed creates
//! - [`remote`]: the authoritative-store boundary, with [`authority`] as an
//!   in-memory implementation
//! - [`notify`]: user-visible success and failure notifications
//! - [`config`]: figment-backed runtime settings
//!
//! ## Example
//!
//! ```
//! use rankboard::{lexorank, Rank};
//!
//! let first = lexorank::initial_rank();
//! let second = lexorank::rank_after(&first);
//! let middle = lexorank::between(Some(&first), Some(&second));
//! assert!(first < middle && middle < second);
//! assert_eq!(Rank::parse("0|hzzzzz:").unwrap(), first);
//! ```

pub mod authority;
pub mod collection;
pub mod config;
pub mod controller;
mod error;
pub mod lexorank;
pub mod notify;
pub mod remote;
pub mod state;
pub mod types;

pub use authority::MemoryAuthority;
pub use collection::{OrderedCollection, Ranked};
pub use config::RankBoardConfig;
pub use controller::{
    MoveGesture, MoveOutcome, MovePhase, OptimisticMoveController, PendingMove, Restored,
};
pub use error::{BoardError, Result};
pub use notify::{
    Notification, NotificationBus, NotificationEvent, NotificationId, NotificationKind,
    Subscription,
};
pub use remote::{BoardRemote, CreateCardRequest, CreateListRequest, MoveCardRequest};
pub use state::{BoardSnapshot, BoardState};
pub use types::{Board, BoardDetail, BoardId, Card, CardId, List, ListId, Rank};
