//! Card type

use super::ids::{CardId, ListId};
use super::rank::Rank;
use crate::collection::Ranked;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A card inside a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub list_id: ListId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub rank: Rank,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// Create a new card in a list at the given rank
    pub fn new(title: impl Into<String>, list_id: ListId, rank: Rank) -> Self {
        Self {
            id: CardId::new(),
            list_id,
            title: title.into(),
            description: None,
            rank,
            created_at: Utc::now(),
        }
    }

    /// Set the id
    pub fn with_id(mut self, id: impl Into<CardId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Ranked for Card {
    type Id = CardId;
    type ContainerId = ListId;

    fn id(&self) -> &CardId {
        &self.id
    }

    fn rank(&self) -> &Rank {
        &self.rank
    }

    fn set_rank(&mut self, rank: Rank) {
        self.rank = rank;
    }

    fn container_id(&self) -> &ListId {
        &self.list_id
    }

    fn set_container_id(&mut self, container: ListId) {
        self.list_id = container;
    }
}
