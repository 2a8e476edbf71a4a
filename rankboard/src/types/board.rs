//! Board types: Board and the full BoardDetail snapshot

use super::card::Card;
use super::ids::{BoardId, CardId, ListId};
use super::list::List;
use crate::collection::OrderedCollection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Board metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Board {
    /// Create a new board
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: BoardId::new(),
            title: title.into(),
            description: None,
            created_at: Utc::now(),
        }
    }

    /// Set the id
    pub fn with_id(mut self, id: impl Into<BoardId>) -> Self {
        self.id = id.into();
        self
    }
}

/// A board with all of its lists and cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    #[serde(default)]
    pub lists: OrderedCollection<List>,
}

impl BoardDetail {
    /// Create a board detail from a board and its lists
    pub fn new(board: Board, lists: Vec<List>) -> Self {
        Self {
            board,
            lists: lists.into(),
        }
    }

    pub fn id(&self) -> &BoardId {
        &self.board.id
    }

    pub fn list(&self, id: &ListId) -> Option<&List> {
        self.lists.find(id)
    }

    /// Find a card anywhere on the board
    pub fn find_card(&self, id: &CardId) -> Option<&Card> {
        self.lists.iter().find_map(|list| list.cards.find(id))
    }

    /// Id of the list currently holding a card
    pub fn card_location(&self, id: &CardId) -> Option<&ListId> {
        self.lists
            .iter()
            .find(|list| list.cards.contains(id))
            .map(|list| &list.id)
    }

    /// Ids of a list's cards in display order (empty if the list is unknown)
    pub fn card_ids(&self, list_id: &ListId) -> Vec<CardId> {
        self.list(list_id)
            .map(|list| list.cards.iter().map(|card| card.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Total number of cards across all lists
    pub fn card_count(&self) -> usize {
        self.lists.iter().map(|list| list.cards.len()).sum()
    }

    /// True when every list and the board itself are strictly rank ordered
    pub fn is_ordered(&self) -> bool {
        self.lists.is_ordered() && self.lists.iter().all(|list| list.cards.is_ordered())
    }
}
