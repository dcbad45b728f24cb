//! WASM bindings for quarto-core
//!
//! Provides a JavaScript-friendly API for the game logic.

use wasm_bindgen::prelude::*;
use crate::{Action, Game};

/// WASM-friendly wrapper around Game
#[wasm_bindgen]
pub struct WasmGame {
    inner: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGame {
        WasmGame { inner: Game::new() }
    }

    /// Select a piece (0-15) for the opponent. Returns true if accepted.
    #[wasm_bindgen(js_name = selectPiece)]
    pub fn select_piece(&mut self, piece: u8) -> bool {
        self.inner.try_select(piece).is_ok()
    }

    /// Place the selected piece on a cell (0-15). Returns true if accepted.
    #[wasm_bindgen(js_name = placePiece)]
    pub fn place_piece(&mut self, cell: u8) -> bool {
        self.inner.try_place(cell).is_ok()
    }

    /// Start over
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Current player (1 or 2)
    #[wasm_bindgen(js_name = currentPlayer)]
    pub fn current_player(&self) -> u8 {
        self.inner.current_player() as u8
    }

    /// Full state snapshot as a JS object
    /// { board, current_player, selected_piece, game_over, phase, result, winner, winning_line? }
    pub fn state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.snapshot()).map_err(JsValue::from)
    }

    /// Legal actions in notation form ("S3", "P10", ...)
    #[wasm_bindgen(js_name = legalActions)]
    pub fn legal_actions(&self) -> Vec<String> {
        self.inner
            .legal_actions()
            .into_iter()
            .map(|action| action.to_string())
            .collect()
    }

    /// Pieces that do not let the opponent win on their next placement
    #[wasm_bindgen(js_name = safePieces)]
    pub fn safe_pieces(&self) -> Vec<u8> {
        self.inner.safe_pieces().into_iter().map(|piece| piece.0).collect()
    }

    /// Cells of the winning line, or an empty array
    #[wasm_bindgen(js_name = winningLine)]
    pub fn winning_line(&self) -> Vec<u8> {
        self.inner
            .winning_line()
            .map(|line| line.iter().map(|cell| cell.0).collect())
            .unwrap_or_default()
    }

    /// Apply an action written in notation. Returns true if accepted.
    #[wasm_bindgen(js_name = applyNotation)]
    pub fn apply_notation(&mut self, notation: &str) -> bool {
        match notation.parse::<Action>() {
            Ok(action) => self.inner.apply(action).is_ok(),
            Err(_) => false,
        }
    }

    /// Check if game is over (win or full board)
    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.inner.is_game_over()
    }

    /// Get game result: "ongoing", "player_one_wins", "player_two_wins", or "draw"
    pub fn result(&self) -> String {
        self.inner.outcome().as_str().to_string()
    }

    /// Clone the game
    #[wasm_bindgen(js_name = clone)]
    pub fn clone_game(&self) -> WasmGame {
        WasmGame { inner: self.inner }
    }
}

impl Default for WasmGame {
    fn default() -> Self {
        Self::new()
    }
}
