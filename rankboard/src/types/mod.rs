//! Core types for ranked boards

mod board;
mod card;
mod ids;
mod list;
mod rank;

// Re-export all types
pub use board::{Board, BoardDetail};
pub use card::Card;
pub use ids::{BoardId, CardId, ListId};
pub use list::List;
pub use rank::Rank;
