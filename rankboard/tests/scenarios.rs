//! End-to-end board scenarios: insertion, optimistic moves, rollback and creates

use async_trait::async_trait;
use chrono::Duration;
use rankboard::{
    lexorank, Board, BoardDetail, BoardError, BoardId, BoardRemote, BoardState, Card, CardId,
    CreateCardRequest, CreateListRequest, List, ListId, MemoryAuthority, MoveCardRequest,
    MoveGesture, MoveOutcome, NotificationBus, NotificationEvent, NotificationKind,
    OptimisticMoveController, Rank, Restored, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A remote whose moves always fail, counting the attempts
#[derive(Default)]
struct FailingRemote {
    attempts: AtomicUsize,
}

#[async_trait]
impl BoardRemote for FailingRemote {
    async fn load_board(&self, board_id: &BoardId) -> Result<BoardDetail> {
        Err(BoardError::BoardNotFound {
            id: board_id.to_string(),
        })
    }

    async fn move_card(&self, _request: MoveCardRequest) -> Result<Card> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(BoardError::remote("connection reset"))
    }

    async fn create_card(&self, _request: CreateCardRequest) -> Result<Card> {
        Err(BoardError::remote("connection reset"))
    }

    async fn create_list(&self, _request: CreateListRequest) -> Result<List> {
        Err(BoardError::remote("connection reset"))
    }
}

fn rank(payload: &str) -> Rank {
    Rank::from_payload(payload).unwrap()
}

fn card(id: &str, list: &str, payload: &str) -> Card {
    Card::new(id.to_uppercase(), ListId::from(list), rank(payload)).with_id(id)
}

/// L1 = [C1(m), C2(t)], L2 = [C3(m)]
fn two_list_board() -> BoardDetail {
    BoardDetail::new(
        Board::new("Scenarios").with_id("board"),
        vec![
            List::new("L1", BoardId::from("board"), rank("a"))
                .with_id("l1")
                .with_cards(vec![card("c1", "l1", "m"), card("c2", "l1", "t")]),
            List::new("L2", BoardId::from("board"), rank("b"))
                .with_id("l2")
                .with_cards(vec![card("c3", "l2", "m")]),
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

#[test_log::test]
fn scenario_a_insert_between_two_cards() {
    let mut state = BoardState::load(two_list_board());
    let new_card = Card::new("New", ListId::from("l1"), lexorank::initial_rank()).with_id("cnew");

    let assigned = state.insert_card(new_card, 1).unwrap();

    assert!(rank("m") < assigned && assigned < rank("t"));
    assert_eq!(card_ids(&state, "l1"), vec!["c1", "cnew", "c2"]);
}

#[test_log::test]
fn scenario_b_optimistic_move_is_visible_immediately() {
    let mut state = BoardState::load(two_list_board());
    let mut controller = controller();

    let pending = controller
        .begin_move(&mut state, MoveGesture::new("c1", "l1", "l2", 0))
        .unwrap();

    assert_eq!(card_ids(&state, "l1"), vec!["c2"]);
    assert_eq!(card_ids(&state, "l2"), vec!["c1", "c3"]);
    assert_eq!(pending.request().list_id, ListId::from("l2"));
    assert_eq!(pending.request().after_rank, Some(rank("m")));
}

#[test_log::test(tokio::test)]
async fn scenario_c_failed_move_reverts_to_pre_move_snapshot() {
    let mut state = BoardState::load(two_list_board());
    let pre_move = state.current().clone();
    let mut controller = controller();
    let mut events = controller.notifications().subscribe();
    let remote = FailingRemote::default();

    let outcome = controller
        .move_card(&mut state, &remote, MoveGesture::new("c1", "l1", "l2", 0))
        .await
        .unwrap();

    match outcome {
        MoveOutcome::RolledBack { error, restored } => {
            assert!(error.is_remote());
            assert_eq!(restored, Restored::Snapshot);
        }
        other => panic!("expected rollback, got {:?}", other),
    }
    assert_eq!(remote.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(state.current(), &pre_move);
    assert_eq!(card_ids(&state, "l1"), vec!["c1", "c2"]);
    assert_eq!(card_ids(&state, "l2"), vec!["c3"]);

    match events.recv().await {
        Some(NotificationEvent::Posted(notification)) => {
            assert_eq!(notification.kind, NotificationKind::Error);
            assert_eq!(notification.message, "Failed to move card. Changes reverted.");
        }
        other => panic!("expected a notification, got {:?}", other),
    }
}

#[test_log::test(tokio::test)]
async fn scenario_d_lists_on_an_empty_board() {
    let authority = MemoryAuthority::new();
    let detail = authority.seed_board("Empty", &[]).await;
    let mut state = BoardState::load(detail);
    let mut controller = controller();

    let first = controller
        .create_list(&mut state, &authority, "First", None)
        .await
        .unwrap();
    assert_eq!(first.rank, lexorank::initial_rank());

    let before_first = lexorank::between(None, Some(&first.rank));
    assert!(before_first < first.rank);

    let second = List::new("Second", state.current().id().clone(), lexorank::initial_rank());
    let assigned = state.insert_list(second, 0);
    assert_eq!(assigned, before_first);
    let titles: Vec<&str> = state.current().lists.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[test_log::test(tokio::test)]
async fn confirmed_move_matches_authority() {
    let board = two_list_board();
    let authority = MemoryAuthority::new();
    authority.insert_board(board.clone()).await;
    let mut state = BoardState::load(board);
    let mut controller = controller();

    for (card_id, source, dest, index) in [
        ("c1", "l1", "l2", 1),
        ("c3", "l2", "l1", 0),
        ("c2", "l1", "l1", 0),
        ("c1", "l2", "l1", 2),
    ] {
        let outcome = controller
            .move_card(&mut state, &authority, MoveGesture::new(card_id, source, dest, index))
            .await
            .unwrap();
        assert!(outcome.is_confirmed());
    }

    let server = authority.board(&BoardId::from("board")).await.unwrap();
    assert_eq!(state.current(), &server);
    assert!(state.current().is_ordered());
    assert_eq!(card_ids(&state, "l1"), vec!["c2", "c3", "c1"]);
    assert!(controller.notifications().active().is_empty());
}

#[test_log::test(tokio::test)]
async fn overlapping_moves_keep_the_later_confirmed_change() {
    let board = two_list_board();
    let authority = MemoryAuthority::new();
    authority.insert_board(board.clone()).await;
    let failing = FailingRemote::default();
    let mut state = BoardState::load(board);
    let mut controller = controller();

    let doomed = controller
        .begin_move(&mut state, MoveGesture::new("c1", "l1", "l2", 0))
        .unwrap();
    let kept = controller
        .begin_move(&mut state, MoveGesture::new("c2", "l1", "l2", 2))
        .unwrap();

    let response = authority.move_card(kept.request().clone()).await;
    assert!(controller.settle(&mut state, kept, response).is_confirmed());

    let response = failing.move_card(doomed.request().clone()).await;
    let outcome = controller.settle(&mut state, doomed, response);
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
    assert_eq!(restored.rank, rank("m"));
    assert!(state.current().is_ordered());
}

#[test_log::test(tokio::test)]
async fn created_cards_append_to_their_list() {
    let board = two_list_board();
    let authority = MemoryAuthority::new();
    authority.insert_board(board.clone()).await;
    let mut state = BoardState::load(board);
    let mut controller = controller();

    for title in ["one", "two", "three"] {
        controller
            .create_card(&mut state, &authority, &ListId::from("l2"), title)
            .await
            .unwrap();
    }

    let titles: Vec<String> = state
        .current()
        .list(&ListId::from("l2"))
        .unwrap()
        .cards
        .iter()
        .map(|c| c.title.clone())
        .collect();
    assert_eq!(titles, vec!["C3", "one", "two", "three"]);
    assert!(state.current().is_ordered());

    let kinds: Vec<NotificationKind> = controller
        .notifications()
        .active()
        .iter()
        .map(|n| n.kind)
        .collect();
    assert_eq!(kinds, vec![NotificationKind::Success; 3]);
}

#[test_log::test(tokio::test)]
async fn refresh_replaces_local_state() {
    let board = two_list_board();
    let authority = MemoryAuthority::new();
    authority.insert_board(board.clone()).await;
    let mut state = BoardState::load(board);
    state.remove_list(&ListId::from("l2"));
    let mut controller = controller();

    controller.refresh(&mut state, &authority).await.unwrap();
    let server = authority.board(&BoardId::from("board")).await.unwrap();
    assert_eq!(state.current(), &server);
    assert_eq!(card_ids(&state, "l2"), vec!["c3"]);
}
