//! Optimistic move protocol
//!
//! A move is applied to the local [`BoardState`] before the authoritative store
//! has seen it, then reconciled:
//!
//! ```text
//! Idle --begin_move--> Applied --settle(Ok)--> Confirmed --> Idle
//!                              \--settle(Err)-> RolledBack -> Idle
//! ```
//!
//! [`OptimisticMoveController::begin_move`] and [`OptimisticMoveController::settle`]
//! can be called separately so several moves may be in flight at once;
//! [`OptimisticMoveController::move_card`] drives both halves for a single move.
//!
//! Overlapping moves: a failed move restores its full pre-move snapshot only if
//! nothing else has changed the board since the move was applied. Otherwise only
//! the moved card is put back at its previous list and rank, so later edits are
//! not undone.

use crate::collection::Ranked;
use crate::error::{BoardError, Result};
use crate::lexorank;
use crate::notify::NotificationBus;
use crate::remote::{BoardRemote, CreateCardRequest, CreateListRequest, MoveCardRequest};
use crate::state::{BoardSnapshot, BoardState};
use crate::types::{Card, CardId, List, ListId, Rank};
use tracing::{debug, info, warn};

const MOVE_FAILED: &str = "Failed to move card. Changes reverted.";

/// A requested visual move: put `card_id` at `dest_index` of `dest_list_id`
#[derive(Debug, Clone, PartialEq)]
pub struct MoveGesture {
    pub card_id: CardId,
    pub source_list_id: ListId,
    pub dest_list_id: ListId,
    pub dest_index: usize,
}

impl MoveGesture {
    pub fn new(
        card_id: impl Into<CardId>,
        source_list_id: impl Into<ListId>,
        dest_list_id: impl Into<ListId>,
        dest_index: usize,
    ) -> Self {
        Self {
            card_id: card_id.into(),
            source_list_id: source_list_id.into(),
            dest_list_id: dest_list_id.into(),
            dest_index,
        }
    }
}

/// Where a move stands in the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePhase {
    Idle,
    Applied,
    Confirmed,
    RolledBack,
}

/// How a failed move was undone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restored {
    /// The full pre-move snapshot was reinstalled
    Snapshot,
    /// Later changes were kept; only the moved card went back
    Card,
    /// The card no longer exists locally, nothing to undo
    Nothing,
}

/// A move that has been applied locally and awaits confirmation.
///
/// Owns the pre-move snapshot until the move is settled.
#[derive(Debug)]
pub struct PendingMove {
    id: u64,
    gesture: MoveGesture,
    request: MoveCardRequest,
    optimistic_rank: Rank,
    previous_rank: Rank,
    pre_image: BoardSnapshot,
    applied_version: u64,
}

impl PendingMove {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn gesture(&self) -> &MoveGesture {
        &self.gesture
    }

    /// The request to send to the authoritative store
    pub fn request(&self) -> &MoveCardRequest {
        &self.request
    }

    /// Rank applied locally while the move is in flight
    pub fn optimistic_rank(&self) -> &Rank {
        &self.optimistic_rank
    }

    pub fn pre_image(&self) -> &BoardSnapshot {
        &self.pre_image
    }

    pub fn phase(&self) -> MovePhase {
        MovePhase::Applied
    }
}

/// Result of settling a move
#[derive(Debug)]
pub enum MoveOutcome {
    /// The authoritative card was merged into the board
    Confirmed(Card),
    /// The move failed and was undone
    RolledBack { error: BoardError, restored: Restored },
}

impl MoveOutcome {
    pub fn phase(&self) -> MovePhase {
        match self {
            Self::Confirmed(_) => MovePhase::Confirmed,
            Self::RolledBack { .. } => MovePhase::RolledBack,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

/// Drives optimistic moves and non-optimistic creates against a [`BoardRemote`]
#[derive(Debug)]
pub struct OptimisticMoveController {
    notifications: NotificationBus,
    in_flight: usize,
    next_move_id: u64,
}

impl OptimisticMoveController {
    pub fn new(notifications: NotificationBus) -> Self {
        Self {
            notifications,
            in_flight: 0,
            next_move_id: 0,
        }
    }

    pub fn notifications(&self) -> &NotificationBus {
        &self.notifications
    }

    /// `Applied` while any move awaits confirmation, otherwise `Idle`
    pub fn phase(&self) -> MovePhase {
        if self.in_flight > 0 {
            MovePhase::Applied
        } else {
            MovePhase::Idle
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply a move locally and return the pending move to confirm.
    ///
    /// Returns `None` without touching the board when the card or either list is
    /// not present, or when the gesture leaves the card where it already is.
    pub fn begin_move(
        &mut self,
        state: &mut BoardState,
        gesture: MoveGesture,
    ) -> Option<PendingMove> {
        let detail = state.current();
        let source = detail.list(&gesture.source_list_id)?;
        let card = source.cards.find(&gesture.card_id)?;
        let dest = detail.list(&gesture.dest_list_id)?;

        if source.id == dest.id
            && source.cards.position(&gesture.card_id)
                == Some(gesture.dest_index.min(source.cards.len().saturating_sub(1)))
        {
            debug!(card_id = %gesture.card_id, "move leaves card in place");
            return None;
        }

        let exclude = dest
            .cards
            .contains(&gesture.card_id)
            .then_some(&gesture.card_id);
        let (before, after) = dest.cards.neighbors(gesture.dest_index, exclude);
        let (before_rank, after_rank) = (before.cloned(), after.cloned());
        let optimistic_rank = lexorank::between(before_rank.as_ref(), after_rank.as_ref());
        let previous_rank = card.rank().clone();

        let pre_image = state.snapshot();
        if !state.move_card(
            &gesture.card_id,
            &gesture.source_list_id,
            &gesture.dest_list_id,
            optimistic_rank.clone(),
            gesture.dest_index,
        ) {
            return None;
        }

        let id = self.next_move_id;
        self.next_move_id += 1;
        self.in_flight += 1;
        info!(
            move_id = id,
            card_id = %gesture.card_id,
            from = %gesture.source_list_id,
            to = %gesture.dest_list_id,
            rank = %optimistic_rank,
            "applied optimistic move"
        );

        Some(PendingMove {
            id,
            request: MoveCardRequest {
                card_id: gesture.card_id.clone(),
                list_id: gesture.dest_list_id.clone(),
                before_rank,
                after_rank,
            },
            gesture,
            optimistic_rank,
            previous_rank,
            pre_image,
            applied_version: state.version(),
        })
    }

    /// Reconcile a pending move with the authoritative response
    pub fn settle(
        &mut self,
        state: &mut BoardState,
        pending: PendingMove,
        response: Result<Card>,
    ) -> MoveOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        match response {
            Ok(card) => {
                state.sync_card(&card);
                info!(
                    move_id = pending.id,
                    card_id = %card.id,
                    rank = %card.rank,
                    "move confirmed"
                );
                MoveOutcome::Confirmed(card)
            }
            Err(error) => {
                warn!(
                    move_id = pending.id,
                    card_id = %pending.gesture.card_id,
                    %error,
                    "move failed, rolling back"
                );
                let restored = Self::roll_back(state, pending);
                self.notifications.error(MOVE_FAILED);
                MoveOutcome::RolledBack { error, restored }
            }
        }
    }

    fn roll_back(state: &mut BoardState, pending: PendingMove) -> Restored {
        if state.version() == pending.applied_version {
            state.restore(pending.pre_image);
            return Restored::Snapshot;
        }

        let card_id = &pending.gesture.card_id;
        let Some(current_list) = state.current().card_location(card_id).cloned() else {
            debug!(%card_id, "card gone before rollback, nothing to restore");
            return Restored::Nothing;
        };
        let source = &pending.gesture.source_list_id;
        let index = state
            .current()
            .list(source)
            .map(|list| list.cards.len())
            .unwrap_or(0);
        if state.move_card(card_id, &current_list, source, pending.previous_rank, index) {
            Restored::Card
        } else {
            Restored::Nothing
        }
    }

    /// Apply a move, confirm it with `remote`, and reconcile.
    ///
    /// Returns `None` if the gesture was a no-op.
    pub async fn move_card<R: BoardRemote + ?Sized>(
        &mut self,
        state: &mut BoardState,
        remote: &R,
        gesture: MoveGesture,
    ) -> Option<MoveOutcome> {
        let pending = self.begin_move(state, gesture)?;
        let response = remote.move_card(pending.request().clone()).await;
        Some(self.settle(state, pending, response))
    }

    /// Create a card at the end of a list once the authoritative store accepts it
    pub async fn create_card<R: BoardRemote + ?Sized>(
        &mut self,
        state: &mut BoardState,
        remote: &R,
        list_id: &ListId,
        title: impl Into<String>,
    ) -> Result<Card> {
        let Some(list) = state.current().list(list_id) else {
            self.notifications.error("Failed to create card");
            return Err(BoardError::ListNotFound {
                id: list_id.to_string(),
            });
        };
        let request = CreateCardRequest {
            title: title.into(),
            board_id: state.current().id().clone(),
            list_id: list_id.clone(),
            after_rank: list.cards.last_rank().cloned(),
        };

        match remote.create_card(request).await {
            Ok(card) => {
                state.add_card(card.clone());
                info!(card_id = %card.id, %list_id, rank = %card.rank, "card created");
                self.notifications.success("Card created!");
                Ok(card)
            }
            Err(error) => {
                warn!(%list_id, %error, "card creation failed");
                self.notifications.error("Failed to create card");
                Err(error)
            }
        }
    }

    /// Create a list after `after_rank` (or at the end) once the authoritative
    /// store accepts it
    pub async fn create_list<R: BoardRemote + ?Sized>(
        &mut self,
        state: &mut BoardState,
        remote: &R,
        title: impl Into<String>,
        after_rank: Option<Rank>,
    ) -> Result<List> {
        let request = CreateListRequest {
            title: title.into(),
            board_id: state.current().id().clone(),
            after_rank,
        };

        match remote.create_list(request).await {
            Ok(list) => {
                state.add_list(list.clone());
                info!(list_id = %list.id, rank = %list.rank, "list created");
                self.notifications.success("List created!");
                Ok(list)
            }
            Err(error) => {
                warn!(%error, "list creation failed");
                self.notifications.error("Failed to create list");
                Err(error)
            }
        }
    }

    /// Replace the local board with a fresh authoritative load
    pub async fn refresh<R: BoardRemote + ?Sized>(
        &mut self,
        state: &mut BoardState,
        remote: &R,
    ) -> Result<()> {
        let board_id = state.current().id().clone();
        match remote.load_board(&board_id).await {
            Ok(detail) => {
                state.reset(detail);
                Ok(())
            }
            Err(error) => {
                warn!(%board_id, %error, "board refresh failed");
                self.notifications.error("Failed to load board");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::MemoryAuthority;
    use crate::notify::NotificationKind;
    use crate::types::{Board, BoardDetail, BoardId};
    use async_trait::async_trait;
    use chrono::Duration;

    struct OfflineRemote;

    #[async_trait]
    impl BoardRemote for OfflineRemote {
        async fn load_board(&self, _board_id: &BoardId) -> Result<BoardDetail> {
            Err(BoardError::remote("offline"))
        }

        async fn move_card(&self, _request: MoveCardRequest) -> Result<Card> {
            Err(BoardError::remote("offline"))
        }

        async fn create_card(&self, _request: CreateCardRequest) -> Result<Card> {
            Err(BoardError::remote("offline"))
        }

        async fn create_list(&self, _request: CreateListRequest) -> Result<List> {
            Err(BoardError::remote("offline"))
        }
    }

    fn rank(s: &str) -> Rank {
        Rank::parse(s).unwrap()
    }

    fn card(id: &str, list: &str, r: &str) -> Card {
        Card::new(id, ListId::from(list), rank(r)).with_id(id)
    }

    fn detail() -> BoardDetail {
        BoardDetail::new(
            Board::new("Test").with_id("b1"),
            vec![
                List::new("Todo", BoardId::from("b1"), rank("0|a:"))
                    .with_id("l1")
                    .with_cards(vec![card("c1", "l1", "0|m:"), card("c2", "l1", "0|t:")]),
                List::new("Done", BoardId::from("b1"), rank("0|b:"))
                    .with_id("l2")
                    .with_cards(vec![card("c3", "l2", "0|m:")]),
            ],
        )
    }

    fn controller() -> OptimisticMoveController {
        OptimisticMoveController::new(NotificationBus::new(16, Duration::milliseconds(3000)))
    }

    fn card_ids(state: &BoardState, list_id: &str) -> Vec<String> {
        state
            .current()
            .list(&ListId::from(list_id))
            .map(|l| l.cards.iter().map(|c| c.id.to_string()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_begin_move_applies_locally() {
        let mut state = BoardState::load(detail());
        let mut controller = controller();

        let pending = controller
            .begin_move(&mut state, MoveGesture::new("c1", "l1", "l2", 0))
            .unwrap();

        assert_eq!(controller.phase(), MovePhase::Applied);
        assert_eq!(pending.phase(), MovePhase::Applied);
        assert_eq!(card_ids(&state, "l1"), vec!["c2"]);
        assert_eq!(card_ids(&state, "l2"), vec!["c1", "c3"]);
        assert!(*pending.optimistic_rank() < rank("0|m:"));
        assert_eq!(pending.request().before_rank, None);
        assert_eq!(pending.request().after_rank, Some(rank("0|m:")));
        assert_eq!(
            pending.pre_image().card_location(&CardId::from("c1")),
            Some(&ListId::from("l1"))
        );
    }

    #[test]
    fn test_gesture_in_place_is_noop() {
        let mut state = BoardState::load(detail());
        let mut controller = controller();
        let version = state.version();

        assert!(controller
            .begin_move(&mut state, MoveGesture::new("c1", "l1", "l1", 0))
            .is_none());
        assert!(controller
            .begin_move(&mut state, MoveGesture::new("c2", "l1", "l1", 9))
            .is_none());
        assert!(controller
            .begin_move(&mut state, MoveGesture::new("ghost", "l1", "l2", 0))
            .is_none());
        assert_eq!(state.version(), version);
        assert_eq!(controller.phase(), MovePhase::Idle);
    }

    #[test]
    fn test_reorder_within_list() {
        let mut state = BoardState::load(detail());
        let mut controller = controller();

        let pending = controller
            .begin_move(&mut state, MoveGesture::new("c1", "l1", "l1", 1))
            .unwrap();
        assert_eq!(pending.request().before_rank, Some(rank("0|t:")));
        assert_eq!(pending.request().after_rank, None);
        assert_eq!(card_ids(&state, "l1"), vec!["c2", "c1"]);
    }

    #[test]
    fn test_settle_ok_merges_authoritative_rank() {
        let mut state = BoardState::load(detail());
        let mut controller = controller();
        let pending = controller
            .begin_move(&mut state, MoveGesture::new("c1", "l1", "l2", 1))
            .unwrap();

        let outcome = controller.settle(&mut state, pending, Ok(card("c1", "l2", "0|n:")));
        assert!(outcome.is_confirmed());
        assert_eq!(controller.phase(), MovePhase::Idle);
        let synced = state.current().find_card(&CardId::from("c1")).unwrap();
        assert_eq!(synced.rank, rank("0|n:"));
        assert!(controller.notifications().active().is_empty());
    }

    #[test]
    fn test_settle_err_restores_snapshot() {
        let mut state = BoardState::load(detail());
        let mut controller = controller();
        let pending = controller
            .begin_move(&mut state, MoveGesture::new("c1", "l1", "l2", 0))
            .unwrap();
        let pre_image = pending.pre_image().clone();

        let outcome = controller.settle(&mut state, pending, Err(BoardError::remote("500")));
        match outcome {
            MoveOutcome::RolledBack { restored, .. } => assert_eq!(restored, Restored::Snapshot),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(state.snapshot().same_as(&pre_image));

        let notes = controller.notifications().active();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert_eq!(notes[0].message, MOVE_FAILED);
    }

    #[test]
    fn test_overlapping_failure_keeps_later_move() {
        let mut state = BoardState::load(detail());
        let mut controller = controller();
        let first = controller
            .begin_move(&mut state, MoveGesture::new("c1", "l1", "l2", 0))
            .unwrap();
        let second = controller
            .begin_move(&mut state, MoveGesture::new("c2", "l1", "l2", 9))
            .unwrap();
        assert_eq!(controller.in_flight(), 2);

        let outcome = controller.settle(&mut state, first, Err(BoardError::remote("timeout")));
        assert!(matches!(
            outcome,
            MoveOutcome::RolledBack {
                restored: Restored::Card,
                ..
            }
        ));
        assert_eq!(card_ids(&state, "l1"), vec!["c1"]);
        assert_eq!(card_ids(&state, "l2"), vec!["c3", "c2"]);
        let restored = state.current().find_card(&CardId::from("c1")).unwrap();
        assert_eq!(restored.rank, rank("0|m:"));

        let rank = second.optimistic_rank().clone();
        let confirmed = Card::new("c2", ListId::from("l2"), rank).with_id("c2");
        assert!(controller.settle(&mut state, second, Ok(confirmed)).is_confirmed());
        assert_eq!(controller.phase(), MovePhase::Idle);
        assert!(state.current().is_ordered());
    }

    #[test]
    fn test_rollback_after_card_removed_is_noop() {
        let mut state = BoardState::load(detail());
        let mut controller = controller();
        let pending = controller
            .begin_move(&mut state, MoveGesture::new("c1", "l1", "l2", 0))
            .unwrap();
        state.remove_card(&CardId::from("c1"), &ListId::from("l2"));

        let outcome = controller.settle(&mut state, pending, Err(BoardError::remote("gone")));
        assert!(matches!(
            outcome,
            MoveOutcome::RolledBack {
                restored: Restored::Nothing,
                ..
            }
        ));
        assert!(state.current().find_card(&CardId::from("c1")).is_none());
    }

    #[tokio::test]
    async fn test_move_card_round_trip_with_authority() {
        let authority = MemoryAuthority::new();
        authority.insert_board(detail()).await;
        let mut state = BoardState::load(detail());
        let mut controller = controller();

        let outcome = controller
            .move_card(&mut state, &authority, MoveGesture::new("c2", "l1", "l2", 0))
            .await
            .unwrap();
        let MoveOutcome::Confirmed(card) = outcome else {
            panic!("move was not confirmed");
        };
        let local = state.current().find_card(&card.id).unwrap();
        assert_eq!(local.rank, card.rank);
        assert_eq!(local.list_id, ListId::from("l2"));

        let server = authority.board(&BoardId::from("b1")).await.unwrap();
        assert_eq!(server.find_card(&card.id).map(|c| &c.rank), Some(&card.rank));
    }

    #[tokio::test]
    async fn test_create_flows_post_notifications() {
        let authority = MemoryAuthority::new();
        authority.insert_board(detail()).await;
        let mut state = BoardState::load(detail());
        let mut controller = controller();

        let card = controller
            .create_card(&mut state, &authority, &ListId::from("l1"), "New")
            .await
            .unwrap();
        assert!(card.rank > rank("0|t:"));
        assert_eq!(
            card_ids(&state, "l1").last().map(String::as_str),
            Some(card.id.as_str())
        );

        let list = controller
            .create_list(&mut state, &authority, "Review", Some(rank("0|a:")))
            .await
            .unwrap();
        assert_eq!(state.current().lists.position(&list.id), Some(1));

        let messages: Vec<&str> = controller
            .notifications()
            .active()
            .iter()
            .map(|n| n.message.as_str())
            .collect();
        assert_eq!(messages, vec!["Card created!", "List created!"]);
    }

    #[tokio::test]
    async fn test_failed_creates_and_refresh_leave_state() {
        let mut state = BoardState::load(detail());
        let mut controller = controller();
        let version = state.version();

        assert!(controller
            .create_card(&mut state, &OfflineRemote, &ListId::from("l1"), "x")
            .await
            .is_err());
        assert!(controller
            .create_list(&mut state, &OfflineRemote, "x", None)
            .await
            .is_err());
        assert!(controller.refresh(&mut state, &OfflineRemote).await.is_err());
        assert_eq!(state.version(), version);

        let messages: Vec<&str> = controller
            .notifications()
            .active()
            .iter()
            .map(|n| n.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec!["Failed to create card", "Failed to create list", "Failed to load board"]
        );
    }
}
