//! BoardState - the single owner of the in-memory board snapshot
//!
//! The snapshot is held behind an `Arc`. Every mutation clones the current value,
//! edits the private copy, and installs it as the new snapshot only if the edit
//! succeeded, so no half-applied change is ever observable. A captured
//! [`BoardSnapshot`] is a reference to one of those values; restoring it is a
//! pointer swap.
//!
//! Operations that name an entity or container that is not present return `false`
//! (or `None`) and leave the state untouched. The snapshot may be stale relative to
//! the authoritative store, so a missing id is expected, not an error.

use crate::collection::Ranked;
use crate::error::Result;
use crate::types::{BoardDetail, Card, CardId, List, ListId, Rank};
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// An immutable, versioned capture of the board
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    detail: Arc<BoardDetail>,
    version: u64,
}

impl BoardSnapshot {
    /// Version of the state this snapshot was taken from
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn detail(&self) -> &BoardDetail {
        &self.detail
    }

    /// True when both snapshots point at the same stored value
    pub fn same_as(&self, other: &BoardSnapshot) -> bool {
        Arc::ptr_eq(&self.detail, &other.detail)
    }
}

impl Deref for BoardSnapshot {
    type Target = BoardDetail;

    fn deref(&self) -> &BoardDetail {
        &self.detail
    }
}

/// Owner of the current board snapshot
#[derive(Debug, Clone)]
pub struct BoardState {
    current: Arc<BoardDetail>,
    version: u64,
}

impl BoardState {
    /// Seed the state from a full board load
    pub fn load(detail: BoardDetail) -> Self {
        debug!(
            board_id = %detail.id(),
            lists = detail.lists.len(),
            cards = detail.card_count(),
            "loaded board state"
        );
        Self {
            current: Arc::new(detail),
            version: 0,
        }
    }

    /// Seed the state from a board-detail JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::load(serde_json::from_str(json)?))
    }

    /// Seed the state from a board-detail JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Serialize the current snapshot as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.current.as_ref())?)
    }

    pub fn current(&self) -> &BoardDetail {
        &self.current
    }

    /// Incremented on every committed change, including restores
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Capture the current snapshot
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            detail: Arc::clone(&self.current),
            version: self.version,
        }
    }

    /// Install a previously captured snapshot verbatim
    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        debug!(
            from_version = self.version,
            snapshot_version = snapshot.version,
            "restoring board snapshot"
        );
        self.current = snapshot.detail;
        self.version += 1;
    }

    /// Replace the whole board with a freshly loaded one
    pub fn reset(&mut self, detail: BoardDetail) {
        self.current = Arc::new(detail);
        self.version += 1;
    }

    fn commit<R>(&mut self, edit: impl FnOnce(&mut BoardDetail) -> Option<R>) -> Option<R> {
        let mut next = BoardDetail::clone(&self.current);
        let result = edit(&mut next)?;
        self.current = Arc::new(next);
        self.version += 1;
        Some(result)
    }

    /// Insert a new card into its list at `index`, allocating its rank from the
    /// neighbours it lands between. Returns the assigned rank.
    pub fn insert_card(&mut self, card: Card, index: usize) -> Option<Rank> {
        let list_id = card.list_id.clone();
        let card_id = card.id.clone();
        let rank = self.commit(|detail| {
            detail
                .lists
                .modify(&list_id, |list| list.cards.insert(card, index))
        });
        match &rank {
            Some(rank) => debug!(%card_id, %list_id, %rank, index, "inserted card"),
            None => debug!(%card_id, %list_id, "insert skipped, list not present"),
        }
        rank
    }

    /// Insert a new list at `index`, allocating its rank. Returns the assigned rank.
    pub fn insert_list(&mut self, list: List, index: usize) -> Rank {
        let list_id = list.id.clone();
        let rank = self
            .commit(|detail| Some(detail.lists.insert(list, index)))
            .unwrap_or_else(crate::lexorank::initial_rank);
        debug!(%list_id, %rank, index, "inserted list");
        rank
    }

    /// Move a card between lists (or within one), giving it `new_rank` and splicing
    /// it in at `dest_index` of the destination.
    pub fn move_card(
        &mut self,
        card_id: &CardId,
        source_list_id: &ListId,
        dest_list_id: &ListId,
        new_rank: Rank,
        dest_index: usize,
    ) -> bool {
        let moved = self
            .commit(|detail| {
                if !detail.lists.contains(dest_list_id) {
                    return None;
                }
                let mut card = detail
                    .lists
                    .modify(source_list_id, |list| list.cards.take(card_id))??;
                card.set_rank(new_rank.clone());
                card.set_container_id(dest_list_id.clone());
                detail
                    .lists
                    .modify(dest_list_id, |list| list.cards.place(card, dest_index))
            })
            .is_some();
        if moved {
            debug!(
                %card_id,
                %source_list_id,
                %dest_list_id,
                rank = %new_rank,
                dest_index,
                "moved card"
            );
        } else {
            debug!(
                %card_id,
                %source_list_id,
                %dest_list_id,
                "move skipped, card or list not present"
            );
        }
        moved
    }

    /// Merge the authoritative rank and list of a card into the snapshot.
    ///
    /// Only `rank` and `list_id` are taken from `authoritative`; other local
    /// fields are kept.
    pub fn sync_card(&mut self, authoritative: &Card) -> bool {
        let card_id = &authoritative.id;
        let target = &authoritative.list_id;
        let synced = self
            .commit(|detail| {
                let current = detail.card_location(card_id)?.clone();
                if &current == target {
                    return detail.lists.modify(&current, |list| {
                        list.cards.modify(card_id, |card| {
                            card.set_rank(authoritative.rank.clone());
                        })
                    })?;
                }
                if !detail.lists.contains(target) {
                    return None;
                }
                let mut card = detail
                    .lists
                    .modify(&current, |list| list.cards.take(card_id))??;
                card.set_rank(authoritative.rank.clone());
                card.set_container_id(target.clone());
                detail.lists.modify(target, |list| list.cards.add(card))
            })
            .is_some();
        if synced {
            debug!(%card_id, list_id = %target, rank = %authoritative.rank, "synced card");
        } else {
            debug!(%card_id, "sync skipped, card or list not present");
        }
        synced
    }

    /// Add a card that already carries its authoritative rank
    pub fn add_card(&mut self, card: Card) -> bool {
        let card_id = card.id.clone();
        let list_id = card.list_id.clone();
        let added = self
            .commit(|detail| {
                if detail.find_card(&card_id).is_some() {
                    return None;
                }
                detail.lists.modify(&list_id, |list| list.cards.add(card))
            })
            .is_some();
        debug!(%card_id, %list_id, added, "add card");
        added
    }

    /// Add a list that already carries its authoritative rank
    pub fn add_list(&mut self, list: List) -> bool {
        let list_id = list.id.clone();
        let added = self
            .commit(|detail| {
                if detail.lists.contains(&list.id) {
                    return None;
                }
                detail.lists.add(list);
                Some(())
            })
            .is_some();
        debug!(%list_id, added, "add list");
        added
    }

    /// Remove a card from a list; sibling ranks are left untouched
    pub fn remove_card(&mut self, card_id: &CardId, list_id: &ListId) -> bool {
        let removed = self
            .commit(|detail| {
                detail
                    .lists
                    .modify(list_id, |list| list.cards.remove(card_id))
                    .filter(|removed| *removed)
            })
            .is_some();
        debug!(%card_id, %list_id, removed, "remove card");
        removed
    }

    /// Remove a list and every card in it
    pub fn remove_list(&mut self, list_id: &ListId) -> bool {
        let removed = self
            .commit(|detail| detail.lists.remove(list_id).then_some(()))
            .is_some();
        debug!(%list_id, removed, "remove list");
        removed
    }
}
