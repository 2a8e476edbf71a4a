//! List type: a ranked column of cards

use super::card::Card;
use super::ids::{BoardId, ListId};
use super::rank::Rank;
use crate::collection::{OrderedCollection, Ranked};
use serde::{Deserialize, Serialize};

/// A list on a board, holding its cards in rank order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub board_id: BoardId,
    pub title: String,
    pub rank: Rank,
    #[serde(default)]
    pub cards: OrderedCollection<Card>,
}

impl List {
    /// Create an empty list on a board at the given rank
    pub fn new(title: impl Into<String>, board_id: BoardId, rank: Rank) -> Self {
        Self {
            id: ListId::new(),
            board_id,
            title: title.into(),
            rank,
            cards: OrderedCollection::new(),
        }
    }

    /// Set the id
    pub fn with_id(mut self, id: impl Into<ListId>) -> Self {
        self.id = id.into();
        self
    }

    /// Replace the cards
    pub fn with_cards(mut self, cards: Vec<Card>) -> Self {
        self.cards = cards.into();
        self
    }
}

impl Ranked for List {
    type Id = ListId;
    type ContainerId = BoardId;

    fn id(&self) -> &ListId {
        &self.id
    }

    fn rank(&self) -> &Rank {
        &self.rank
    }

    fn set_rank(&mut self, rank: Rank) {
        self.rank = rank;
    }

    fn container_id(&self) -> &BoardId {
        &self.board_id
    }

    fn set_container_id(&mut self, container: BoardId) {
        self.board_id = container;
    }
}
