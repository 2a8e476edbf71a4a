//! Command implementations

use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use rankboard::{
    lexorank, BoardDetail, BoardError, BoardId, BoardRemote, BoardState, Card, CardId,
    CreateCardRequest, CreateListRequest, List, ListId, MemoryAuthority, MoveCardRequest,
    MoveGesture, MoveOutcome, NotificationBus, OptimisticMoveController, Rank, RankBoardConfig,
};
use tracing::info;

/// Authoritative store that rejects every request
struct RejectingRemote;

#[async_trait]
impl BoardRemote for RejectingRemote {
    async fn load_board(&self, _board_id: &BoardId) -> rankboard::Result<BoardDetail> {
        Err(BoardError::remote("rejected"))
    }

    async fn move_card(&self, _request: MoveCardRequest) -> rankboard::Result<Card> {
        Err(BoardError::remote("rejected"))
    }

    async fn create_card(&self, _request: CreateCardRequest) -> rankboard::Result<Card> {
        Err(BoardError::remote("rejected"))
    }

    async fn create_list(&self, _request: CreateListRequest) -> rankboard::Result<List> {
        Err(BoardError::remote("rejected"))
    }
}

fn parse_rank(value: Option<&str>) -> Result<Option<Rank>> {
    value
        .map(|s| Rank::parse(s).with_context(|| format!("invalid rank '{}'", s)))
        .transpose()
}

/// Rank between two optional neighbours
pub fn between(before: Option<&str>, after: Option<&str>) -> Result<Rank> {
    let before = parse_rank(before)?;
    let after = parse_rank(after)?;
    Ok(lexorank::between(before.as_ref(), after.as_ref()))
}

/// `count` evenly spaced ranks, one per line
pub fn seed(count: usize) -> String {
    lexorank::generate_n_ranks(count)
        .iter()
        .map(Rank::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replay a move against a board file and return the resulting board JSON
pub async fn simulate(
    board: &Path,
    card: &str,
    to: &str,
    index: usize,
    fail: bool,
    config: Option<&Path>,
) -> Result<String> {
    let config = RankBoardConfig::load_from(config).context("loading configuration")?;
    let mut state = BoardState::from_file(board)
        .with_context(|| format!("loading board file {}", board.display()))?;

    let card_id = CardId::from(card);
    let Some(source) = state.current().card_location(&card_id).cloned() else {
        bail!("card '{}' is not on the board", card);
    };
    let dest = ListId::from(to);
    if state.current().list(&dest).is_none() {
        bail!("list '{}' is not on the board", to);
    }

    let mut controller = OptimisticMoveController::new(NotificationBus::from_config(&config));
    let gesture = MoveGesture::new(card_id, source, dest, index);
    let outcome = if fail {
        controller.move_card(&mut state, &RejectingRemote, gesture).await
    } else {
        let authority = MemoryAuthority::new();
        authority.insert_board(state.current().clone()).await;
        controller.move_card(&mut state, &authority, gesture).await
    };

    match outcome {
        None => info!("move leaves the card in place"),
        Some(MoveOutcome::Confirmed(card)) => {
            info!(card_id = %card.id, list_id = %card.list_id, rank = %card.rank, "move confirmed")
        }
        Some(MoveOutcome::RolledBack { error, restored }) => {
            info!(%error, ?restored, "move rolled back")
        }
    }
    for notification in controller.notifications().active() {
        eprintln!("{}", notification.message);
    }

    Ok(state.to_json()?)
}
