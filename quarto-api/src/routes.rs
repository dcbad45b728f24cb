//! HTTP routes and JSON models.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use quarto_core::{Action, Cell, Game, GameSnapshot, Outcome, Piece};

use crate::error::ApiError;
use crate::session::GameSession;

/// Shared application state
#[derive(Default)]
pub struct AppStateInner {
    pub session: Mutex<GameSession>,
}

pub type AppState = Arc<AppStateInner>;

// =============================================================================
// JSON Models
// =============================================================================

#[derive(Serialize)]
pub struct GameStateModel {
    #[serde(flatten)]
    pub state: GameSnapshot,
    pub available_pieces: Vec<u8>,
    pub move_index: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Serialize)]
pub struct LegalActionModel {
    pub notation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piece: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<u8>,
    /// 1 = wins immediately, -1 = hands the opponent a winning placement, 0 = neither
    pub evaluation: i8,
}

#[derive(Deserialize)]
pub struct SelectRequest {
    pub piece: u8,
}

#[derive(Deserialize)]
pub struct PlaceRequest {
    pub cell: u8,
}

#[derive(Serialize)]
pub struct HistoryEntryModel {
    pub index: usize,
    pub notation: String,
    pub player: u8,
}

#[derive(Serialize)]
pub struct HistoryModel {
    pub moves: Vec<HistoryEntryModel>,
    pub current_index: usize,
    pub total_moves: usize,
}

#[derive(Serialize, Deserialize)]
pub struct NotationModel {
    pub notation: String,
}

#[derive(Serialize)]
pub struct HealthModel {
    pub status: String,
}

// =============================================================================
// Conversion Functions
// =============================================================================

fn session_to_model(session: &GameSession) -> GameStateModel {
    let game = session.current();
    GameStateModel {
        state: game.snapshot(),
        available_pieces: game.available_pieces().into_iter().map(|p| p.0).collect(),
        move_index: session.current_index(),
        can_undo: session.can_undo(),
        can_redo: session.can_redo(),
    }
}

/// Evaluate an action from the point of view of the player taking it.
fn evaluate(game: &Game, action: Action) -> i8 {
    match action {
        Action::Place(_) => {
            let mut child = *game;
            match child.apply(action) {
                Ok(Outcome::Win(_)) => 1,
                _ => 0,
            }
        }
        Action::Select(piece) => {
            if game.board().winning_cells(piece).is_empty() {
                0
            } else {
                -1
            }
        }
    }
}

fn action_to_model(game: &Game, action: Action) -> LegalActionModel {
    let (piece, cell) = match action {
        Action::Select(Piece(p)) => (Some(p), None),
        Action::Place(Cell(c)) => (None, Some(c)),
    };
    LegalActionModel {
        notation: action.to_string(),
        piece,
        cell,
        evaluation: evaluate(game, action),
    }
}

// =============================================================================
// API Endpoints
// =============================================================================

pub async fn get_game(State(state): State<AppState>) -> Json<GameStateModel> {
    let session = state.session.lock().await;
    Json(session_to_model(&session))
}

pub async fn get_actions(State(state): State<AppState>) -> Json<Vec<LegalActionModel>> {
    let game = *state.session.lock().await.current();
    let actions = game
        .legal_actions()
        .into_iter()
        .map(|action| action_to_model(&game, action))
        .collect();
    Json(actions)
}

async fn apply_action(state: &AppState, action: Action) -> Result<Json<GameStateModel>, ApiError> {
    let mut session = state.session.lock().await;
    let outcome = session
        .apply(action)
        .inspect_err(|err| debug!(%action, %err, "action rejected"))?
        .outcome();
    if outcome != Outcome::Ongoing {
        info!(%action, result = outcome.as_str(), "game finished");
    }
    Ok(Json(session_to_model(&session)))
}

pub async fn select_piece(
    State(state): State<AppState>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<GameStateModel>, ApiError> {
    apply_action(&state, Action::Select(Piece(req.piece))).await
}

pub async fn place_piece(
    State(state): State<AppState>,
    Json(req): Json<PlaceRequest>,
) -> Result<Json<GameStateModel>, ApiError> {
    apply_action(&state, Action::Place(Cell(req.cell))).await
}

pub async fn reset_game(State(state): State<AppState>) -> Json<GameStateModel> {
    let mut session = state.session.lock().await;
    session.reset();
    info!("game reset");
    Json(session_to_model(&session))
}

pub async fn get_history(State(state): State<AppState>) -> Json<HistoryModel> {
    let session = state.session.lock().await;

    let moves: Vec<HistoryEntryModel> = session
        .history()
        .enumerate()
        .map(|(i, (action, before))| HistoryEntryModel {
            index: i + 1,
            notation: action.to_string(),
            player: before.current_player() as u8,
        })
        .collect();

    Json(HistoryModel {
        total_moves: session.total_actions(),
        current_index: session.current_index(),
        moves,
    })
}

pub async fn undo(State(state): State<AppState>) -> Result<Json<GameStateModel>, ApiError> {
    let mut session = state.session.lock().await;
    session.undo()?;
    Ok(Json(session_to_model(&session)))
}

pub async fn redo(State(state): State<AppState>) -> Result<Json<GameStateModel>, ApiError> {
    let mut session = state.session.lock().await;
    session.redo()?;
    Ok(Json(session_to_model(&session)))
}

pub async fn goto_move(
    State(state): State<AppState>,
    Path(move_index): Path<usize>,
) -> Result<Json<GameStateModel>, ApiError> {
    let mut session = state.session.lock().await;
    session.goto(move_index)?;
    Ok(Json(session_to_model(&session)))
}

pub async fn export_game(State(state): State<AppState>) -> Json<NotationModel> {
    let session = state.session.lock().await;
    Json(NotationModel {
        notation: session.export(),
    })
}

pub async fn import_game(
    State(state): State<AppState>,
    Json(req): Json<NotationModel>,
) -> Result<Json<GameStateModel>, ApiError> {
    let imported = GameSession::import(&req.notation)?;
    let mut session = state.session.lock().await;
    *session = imported;
    info!(actions = session.total_actions(), "game imported");
    Ok(Json(session_to_model(&session)))
}

pub async fn health() -> Json<HealthModel> {
    Json(HealthModel {
        status: "ok".to_string(),
    })
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/game", get(get_game))
        .route("/actions", get(get_actions))
        .route("/select", post(select_piece))
        .route("/place", post(place_piece))
        .route("/reset", post(reset_game))
        .route("/history", get(get_history))
        .route("/undo", post(undo))
        .route("/redo", post(redo))
        .route("/goto/{move_index}", post(goto_move))
        .route("/export", get(export_game))
        .route("/import", post(import_game))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}
