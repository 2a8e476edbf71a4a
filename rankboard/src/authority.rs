//! In-memory authoritative store
//!
//! [`MemoryAuthority`] applies the same rank rules a server would: move ranks are
//! recomputed from the anchors in the request, a rank that collides with another
//! card in the target list is extended, and new entities are placed after the
//! requested anchor or at the end of their container.

use crate::collection::{OrderedCollection, Ranked};
use crate::error::{BoardError, Result};
use crate::lexorank::{self, TIE_BREAK};
use crate::remote::{BoardRemote, CreateCardRequest, CreateListRequest, MoveCardRequest};
use crate::types::{Board, BoardDetail, BoardId, Card, List, Rank};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Authoritative board store held in memory
#[derive(Debug, Default)]
pub struct MemoryAuthority {
    boards: Mutex<HashMap<BoardId, BoardDetail>>,
}

impl MemoryAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a board
    pub async fn insert_board(&self, detail: BoardDetail) {
        self.boards
            .lock()
            .await
            .insert(detail.id().clone(), detail);
    }

    /// Create a board whose lists are spread evenly across the rank space
    pub async fn seed_board(&self, title: &str, list_titles: &[&str]) -> BoardDetail {
        let board = Board::new(title);
        let lists = list_titles
            .iter()
            .zip(lexorank::generate_n_ranks(list_titles.len()))
            .map(|(list_title, rank)| List::new(*list_title, board.id.clone(), rank))
            .collect();
        let detail = BoardDetail::new(board, lists);
        info!(board_id = %detail.id(), lists = list_titles.len(), "seeded board");
        self.insert_board(detail.clone()).await;
        detail
    }

    /// Current authoritative copy of a board
    pub async fn board(&self, board_id: &BoardId) -> Option<BoardDetail> {
        self.boards.lock().await.get(board_id).cloned()
    }
}

/// Rank for an entity created after `after` (or at the end when `after` is absent
/// or no longer present)
fn rank_following<T: Ranked>(collection: &OrderedCollection<T>, after: Option<&Rank>) -> Rank {
    let Some(last) = collection.last_rank() else {
        return lexorank::initial_rank();
    };
    let Some(anchor) = after else {
        return lexorank::rank_after(last);
    };
    match collection.iter().position(|item| item.rank() == anchor) {
        Some(index) => lexorank::between(
            Some(anchor),
            collection.get(index + 1).map(Ranked::rank),
        ),
        None => lexorank::rank_after(last),
    }
}

#[async_trait]
impl BoardRemote for MemoryAuthority {
    async fn load_board(&self, board_id: &BoardId) -> Result<BoardDetail> {
        self.board(board_id)
            .await
            .ok_or_else(|| BoardError::BoardNotFound {
                id: board_id.to_string(),
            })
    }

    async fn move_card(&self, request: MoveCardRequest) -> Result<Card> {
        let mut boards = self.boards.lock().await;
        let detail = boards
            .values_mut()
            .find(|detail| detail.find_card(&request.card_id).is_some())
            .ok_or_else(|| BoardError::CardNotFound {
                id: request.card_id.to_string(),
            })?;
        let target = detail
            .list(&request.list_id)
            .ok_or_else(|| BoardError::ListNotFound {
                id: request.list_id.to_string(),
            })?;

        let mut rank =
            lexorank::between(request.before_rank.as_ref(), request.after_rank.as_ref());
        let collides = target
            .cards
            .iter()
            .any(|card| card.rank == rank && card.id != request.card_id);
        if collides {
            debug!(card_id = %request.card_id, %rank, "rank collision, extending");
            let extended = format!("{}{}", rank.payload(), TIE_BREAK);
            rank = Rank::from_parts(rank.bucket(), &extended);
        }

        let source = detail
            .card_location(&request.card_id)
            .cloned()
            .ok_or_else(|| BoardError::CardNotFound {
                id: request.card_id.to_string(),
            })?;
        let mut card = detail
            .lists
            .modify(&source, |list| list.cards.take(&request.card_id))
            .flatten()
            .ok_or_else(|| BoardError::CardNotFound {
                id: request.card_id.to_string(),
            })?;
        card.set_rank(rank);
        card.set_container_id(request.list_id.clone());
        detail
            .lists
            .modify(&request.list_id, |list| list.cards.add(card.clone()));

        info!(card_id = %card.id, list_id = %card.list_id, rank = %card.rank, "card moved");
        Ok(card)
    }

    async fn create_card(&self, request: CreateCardRequest) -> Result<Card> {
        let mut boards = self.boards.lock().await;
        let detail = boards
            .get_mut(&request.board_id)
            .ok_or_else(|| BoardError::BoardNotFound {
                id: request.board_id.to_string(),
            })?;
        let list = detail
            .list(&request.list_id)
            .ok_or_else(|| BoardError::ListNotFound {
                id: request.list_id.to_string(),
            })?;

        let rank = rank_following(&list.cards, request.after_rank.as_ref());
        let card = Card::new(request.title, request.list_id.clone(), rank);
        detail
            .lists
            .modify(&request.list_id, |list| list.cards.add(card.clone()));

        info!(card_id = %card.id, list_id = %card.list_id, rank = %card.rank, "card created");
        Ok(card)
    }

    async fn create_list(&self, request: CreateListRequest) -> Result<List> {
        let mut boards = self.boards.lock().await;
        let detail = boards
            .get_mut(&request.board_id)
            .ok_or_else(|| BoardError::BoardNotFound {
                id: request.board_id.to_string(),
            })?;

        let rank = rank_following(&detail.lists, request.after_rank.as_ref());
        let list = List::new(request.title, request.board_id.clone(), rank);
        detail.lists.add(list.clone());

        info!(list_id = %list.id, rank = %list.rank, "list created");
        Ok(list)
    }
}
