//! Boundary with the authoritative store

use crate::error::Result;
use crate::types::{BoardDetail, BoardId, Card, CardId, List, ListId, Rank};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request to move a card next to the given anchors.
///
/// Carries the neighbour ranks rather than the rank computed locally, so the
/// authoritative side recomputes it against its own data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCardRequest {
    pub card_id: CardId,
    pub list_id: ListId,
    pub before_rank: Option<Rank>,
    pub after_rank: Option<Rank>,
}

/// Request to create a card in a list, after `after_rank` or at the end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCardRequest {
    pub title: String,
    pub board_id: BoardId,
    pub list_id: ListId,
    #[serde(default)]
    pub after_rank: Option<Rank>,
}

/// Request to create a list on a board, after `after_rank` or at the end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateListRequest {
    pub title: String,
    pub board_id: BoardId,
    #[serde(default)]
    pub after_rank: Option<Rank>,
}

/// The authoritative store a board client confirms its changes against
#[async_trait]
pub trait BoardRemote: Send + Sync {
    /// Load a full board snapshot
    async fn load_board(&self, board_id: &BoardId) -> Result<BoardDetail>;

    /// Move a card and return it with its final rank and list
    async fn move_card(&self, request: MoveCardRequest) -> Result<Card>;

    /// Create a card and return it with its assigned rank
    async fn create_card(&self, request: CreateCardRequest) -> Result<Card>;

    /// Create a list and return it with its assigned rank
    async fn create_list(&self, request: CreateListRequest) -> Result<List>;
}
