//! Quarto game logic with bit-packed board representation.
//!
//! # Piece Encoding (4-bit)
//!
//! ```text
//! Bit 3: height (0 = short,  1 = tall)
//! Bit 2: color  (0 = light,  1 = dark)
//! Bit 1: shape  (0 = square, 1 = round)
//! Bit 0: fill   (0 = hollow, 1 = solid)
//! ```
//!
//! The piece index *is* its attribute bits, so the catalog order (0-15) is
//! the Cartesian product of the four attributes with height most significant.
//!
//! # Board Encoding
//!
//! ```text
//! pieces:   u64, 4 bits per cell (cell i at bits 4i..4i+4)
//! occupied: u16, bit i set when cell i holds a piece
//!
//! Cell indices (row-major order):
//!    0  1  2  3
//!    4  5  6  7
//!    8  9 10 11
//!   12 13 14 15
//! ```
//!
//! # Turn Structure
//!
//! A turn is two actions. The player to move first *selects* a piece for the
//! opponent, which flips the current player; the opponent then *places* it.
//! After a placement that does not end the game, the placing player selects
//! next. The winner is whoever placed the piece that completed a line.

pub mod notation;
#[cfg(feature = "wasm")]
pub mod wasm;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use notation::{format_actions, parse_actions, NotationError};

/// Player identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum Player {
    One = 1,
    Two = 2,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

/// One of the four binary piece attributes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Height,
    Color,
    Shape,
    Fill,
}

impl Attribute {
    /// Bit of the piece index that holds this attribute.
    #[inline]
    pub const fn bit(self) -> u8 {
        match self {
            Attribute::Height => 0b1000,
            Attribute::Color => 0b0100,
            Attribute::Shape => 0b0010,
            Attribute::Fill => 0b0001,
        }
    }

    /// Get all attributes as an iterator.
    pub fn all() -> impl Iterator<Item = Attribute> {
        [Attribute::Height, Attribute::Color, Attribute::Shape, Attribute::Fill].into_iter()
    }
}

/// A piece from the fixed 16-piece catalog.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct Piece(pub u8);

impl Piece {
    /// Number of pieces in the catalog.
    pub const COUNT: usize = 16;
    /// Mask covering the four attribute bits.
    pub const MASK: u8 = 0b1111;

    /// Create a piece from its catalog index (0-15).
    #[inline]
    pub fn new(index: u8) -> Option<Piece> {
        (index < Self::COUNT as u8).then_some(Piece(index))
    }

    /// Check if this is a valid catalog index (0-15).
    #[inline]
    pub fn is_valid(self) -> bool {
        (self.0 as usize) < Self::COUNT
    }

    /// Value of a single attribute.
    #[inline]
    pub fn attribute(self, attr: Attribute) -> bool {
        self.0 & attr.bit() != 0
    }

    /// All four attribute values as (height, color, shape, fill).
    pub fn attributes(self) -> [bool; 4] {
        [
            self.attribute(Attribute::Height),
            self.attribute(Attribute::Color),
            self.attribute(Attribute::Shape),
            self.attribute(Attribute::Fill),
        ]
    }

    /// Iterate over the whole catalog in index order.
    pub fn all() -> impl Iterator<Item = Piece> {
        PIECES.into_iter()
    }

    #[inline]
    const fn bit(self) -> u16 {
        1 << self.0
    }
}

/// The piece catalog, indexed by piece number.
pub const PIECES: [Piece; Piece::COUNT] = {
    let mut pieces = [Piece(0); Piece::COUNT];
    let mut i = 0;
    while i < Piece::COUNT {
        pieces[i] = Piece(i as u8);
        i += 1;
    }
    pieces
};

/// Attribute bits on which all four pieces agree.
#[inline]
fn shared_attribute_bits(pieces: [Piece; 4]) -> u8 {
    let mut all_set = Piece::MASK;
    let mut any_set = 0;
    for piece in pieces {
        all_set &= piece.0;
        any_set |= piece.0;
    }
    (all_set | !any_set) & Piece::MASK
}

/// True if at least one attribute has the same value on all four pieces.
#[inline]
pub fn has_common_attribute(pieces: [Piece; 4]) -> bool {
    shared_attribute_bits(pieces) != 0
}

/// The attributes all four pieces share, in `Attribute::all()` order.
pub fn common_attributes(pieces: [Piece; 4]) -> Vec<Attribute> {
    let bits = shared_attribute_bits(pieces);
    Attribute::all().filter(|attr| bits & attr.bit() != 0).collect()
}

/// Position on the 4x4 board (0-15).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub struct Cell(pub u8);

impl Cell {
    /// Number of cells on the board.
    pub const COUNT: usize = 16;

    /// Create a cell from its row-major index (0-15).
    #[inline]
    pub fn new(index: u8) -> Option<Cell> {
        (index < Self::COUNT as u8).then_some(Cell(index))
    }

    /// Create a cell from row and column (0-3 each).
    #[inline]
    pub fn from_row_col(row: u8, col: u8) -> Cell {
        debug_assert!(row < 4 && col < 4);
        Cell(row * 4 + col)
    }

    /// Get the row (0-3).
    #[inline]
    pub fn row(self) -> u8 {
        self.0 / 4
    }

    /// Get the column (0-3).
    #[inline]
    pub fn col(self) -> u8 {
        self.0 % 4
    }

    /// Check if this is a valid cell (0-15).
    #[inline]
    pub fn is_valid(self) -> bool {
        (self.0 as usize) < Self::COUNT
    }

    /// Iterate over all 16 cells.
    pub fn all() -> impl Iterator<Item = Cell> {
        (0..Self::COUNT as u8).map(Cell)
    }

    #[inline]
    const fn bit(self) -> u16 {
        1 << self.0
    }
}

/// Compact board state.
///
/// See module documentation for encoding details.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Board {
    pieces: u64,
    occupied: u16,
}

impl Board {
    /// Bits per cell (one piece index).
    const CELL_BITS: u32 = 4;
    /// Mask for a single cell.
    const CELL_MASK: u64 = 0b1111;
    /// Occupancy mask of a full board.
    const FULL: u16 = 0xFFFF;

    /// Create a new empty board.
    #[inline]
    pub const fn new() -> Board {
        Board { pieces: 0, occupied: 0 }
    }

    /// Get the piece at a cell, if any.
    #[inline]
    pub fn get(&self, cell: Cell) -> Option<Piece> {
        if self.is_empty(cell) {
            None
        } else {
            Some(self.piece_bits(cell))
        }
    }

    /// Raw piece bits at a cell. Meaningless for empty cells.
    #[inline]
    fn piece_bits(&self, cell: Cell) -> Piece {
        Piece(((self.pieces >> (cell.0 as u32 * Self::CELL_BITS)) & Self::CELL_MASK) as u8)
    }

    /// Check if a cell is empty.
    #[inline]
    pub fn is_empty(&self, cell: Cell) -> bool {
        self.occupied & cell.bit() == 0
    }

    /// Put a piece on a cell.
    /// Does NOT validate - caller must ensure the cell is empty.
    #[inline]
    pub fn place(&mut self, cell: Cell, piece: Piece) {
        let shift = cell.0 as u32 * Self::CELL_BITS;
        self.pieces = (self.pieces & !(Self::CELL_MASK << shift))
            | ((piece.0 as u64 & Self::CELL_MASK) << shift);
        self.occupied |= cell.bit();
    }

    /// Number of occupied cells.
    #[inline]
    pub fn occupied_count(&self) -> u32 {
        self.occupied.count_ones()
    }

    /// Check if every cell holds a piece.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.occupied == Self::FULL
    }

    /// Iterate over empty cells in index order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        Cell::all().filter(move |&cell| self.is_empty(cell))
    }

    /// Cell contents in row-major order.
    pub fn cells(&self) -> [Option<Piece>; Cell::COUNT] {
        let mut cells = [None; Cell::COUNT];
        for cell in Cell::all() {
            cells[cell.0 as usize] = self.get(cell);
        }
        cells
    }

    // ========== Win Detection ==========

    /// The 10 winning lines: 4 rows, 4 columns, 2 diagonals.
    pub const LINES: [[Cell; 4]; 10] = [
        [Cell(0), Cell(1), Cell(2), Cell(3)],     // Row 0
        [Cell(4), Cell(5), Cell(6), Cell(7)],     // Row 1
        [Cell(8), Cell(9), Cell(10), Cell(11)],   // Row 2
        [Cell(12), Cell(13), Cell(14), Cell(15)], // Row 3
        [Cell(0), Cell(4), Cell(8), Cell(12)],    // Col 0
        [Cell(1), Cell(5), Cell(9), Cell(13)],    // Col 1
        [Cell(2), Cell(6), Cell(10), Cell(14)],   // Col 2
        [Cell(3), Cell(7), Cell(11), Cell(15)],   // Col 3
        [Cell(0), Cell(5), Cell(10), Cell(15)],   // Main diagonal
        [Cell(3), Cell(6), Cell(9), Cell(12)],    // Anti-diagonal
    ];

    /// Occupancy masks for the winning lines, same order as `LINES`.
    const LINE_MASKS: [u16; 10] = [
        0x000F, // Row 0
        0x00F0, // Row 1
        0x0F00, // Row 2
        0xF000, // Row 3
        0x1111, // Col 0
        0x2222, // Col 1
        0x4444, // Col 2
        0x8888, // Col 3
        0x8421, // Main diagonal: cells 0,5,10,15
        0x1248, // Anti-diagonal: cells 3,6,9,12
    ];

    /// Pieces on a line, or None while any of its cells is empty.
    #[inline]
    fn line_pieces(&self, line: usize) -> Option<[Piece; 4]> {
        let mask = Self::LINE_MASKS[line];
        if self.occupied & mask != mask {
            return None;
        }
        Some(Self::LINES[line].map(|cell| self.piece_bits(cell)))
    }

    /// Check if a single line (index into `LINES`) is full and shares an attribute.
    #[inline]
    pub fn is_winning_line(&self, line: usize) -> bool {
        self.line_pieces(line).is_some_and(has_common_attribute)
    }

    /// Check if any line is a winning line.
    pub fn check_win(&self) -> bool {
        (0..Self::LINES.len()).any(|line| self.is_winning_line(line))
    }

    /// Get the first winning line in `LINES` order, if any.
    pub fn winning_line(&self) -> Option<[Cell; 4]> {
        (0..Self::LINES.len())
            .find(|&line| self.is_winning_line(line))
            .map(|line| Self::LINES[line])
    }

    /// Empty cells where placing `piece` would complete a winning line.
    pub fn winning_cells(&self, piece: Piece) -> Vec<Cell> {
        self.empty_cells()
            .filter(|&cell| {
                let mut next = *self;
                next.place(cell, piece);
                next.check_win()
            })
            .collect()
    }
}

// ============================================================================
// GAME STATE MACHINE
// ============================================================================

/// Whether the player to act is choosing a piece or placing one.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Selecting,
    Placing,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Selecting => f.write_str("selecting"),
            Phase::Placing => f.write_str("placing"),
        }
    }
}

/// Game result.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Outcome {
    Ongoing,
    Win(Player),
    Draw,
}

impl Outcome {
    /// Result string used by the API and WASM layers.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Ongoing => "ongoing",
            Outcome::Win(Player::One) => "player_one_wins",
            Outcome::Win(Player::Two) => "player_two_wins",
            Outcome::Draw => "draw",
        }
    }
}

/// A single player action.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Action {
    /// Hand a piece to the opponent.
    Select(Piece),
    /// Put the selected piece on a cell.
    Place(Cell),
}

/// Why an action was rejected. Rejection never changes the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("game is already over")]
    GameOver,
    #[error("action not allowed outside the {expected} phase")]
    WrongPhase { expected: Phase },
    #[error("piece index {0} is out of range")]
    InvalidPiece(u8),
    #[error("piece {0} has already been played")]
    PieceUsed(u8),
    #[error("cell index {0} is out of range")]
    InvalidCell(u8),
    #[error("cell {0} is already occupied")]
    CellOccupied(u8),
    #[error("no piece has been selected")]
    NoSelection,
}

/// Full game state. Owned and `Copy`; every game is independent.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Game {
    board: Board,
    /// Bit i set when piece i has been placed.
    used: u16,
    current_player: Player,
    selected: Option<Piece>,
    phase: Phase,
    outcome: Outcome,
}

impl Game {
    /// Create a new game: empty board, Player One selecting.
    pub const fn new() -> Game {
        Game {
            board: Board::new(),
            used: 0,
            current_player: Player::One,
            selected: None,
            phase: Phase::Selecting,
            outcome: Outcome::Ongoing,
        }
    }

    /// Return to the initial state.
    pub fn reset(&mut self) {
        *self = Game::new();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn selected_piece(&self) -> Option<Piece> {
        self.selected
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome != Outcome::Ongoing
    }

    pub fn winner(&self) -> Option<Player> {
        match self.outcome {
            Outcome::Win(player) => Some(player),
            _ => None,
        }
    }

    /// Bit i set when piece i has been placed.
    pub fn used_mask(&self) -> u16 {
        self.used
    }

    pub fn is_used(&self, piece: Piece) -> bool {
        self.used & piece.bit() != 0
    }

    /// Pieces not yet placed, in catalog order.
    pub fn available_pieces(&self) -> Vec<Piece> {
        Piece::all().filter(|&piece| !self.is_used(piece)).collect()
    }

    /// The line that won the game, if it was won.
    pub fn winning_line(&self) -> Option<[Cell; 4]> {
        match self.outcome {
            Outcome::Win(_) => self.board.winning_line(),
            _ => None,
        }
    }

    fn check_phase(&self, expected: Phase) -> Result<(), ActionError> {
        if self.is_game_over() {
            Err(ActionError::GameOver)
        } else if self.phase != expected {
            Err(ActionError::WrongPhase { expected })
        } else {
            Ok(())
        }
    }

    // ========== Actions ==========

    /// Select a piece for the opponent.
    ///
    /// The current player flips here, not on placement: the opponent is
    /// the one who will place the selected piece.
    pub fn try_select(&mut self, index: u8) -> Result<(), ActionError> {
        self.check_phase(Phase::Selecting)?;
        let piece = Piece::new(index).ok_or(ActionError::InvalidPiece(index))?;
        if self.is_used(piece) {
            return Err(ActionError::PieceUsed(index));
        }

        self.selected = Some(piece);
        self.phase = Phase::Placing;
        self.current_player = self.current_player.opponent();
        Ok(())
    }

    /// Place the selected piece and evaluate the result.
    ///
    /// On a win or a full board the game becomes terminal and keeps its
    /// selection and phase; otherwise the placing player selects next.
    pub fn try_place(&mut self, index: u8) -> Result<Outcome, ActionError> {
        self.check_phase(Phase::Placing)?;
        let cell = Cell::new(index).ok_or(ActionError::InvalidCell(index))?;
        if !self.board.is_empty(cell) {
            return Err(ActionError::CellOccupied(index));
        }
        let piece = self.selected.ok_or(ActionError::NoSelection)?;

        self.board.place(cell, piece);
        self.used |= piece.bit();

        if self.board.check_win() {
            self.outcome = Outcome::Win(self.current_player);
            let winner = self.current_player as u8;
            info!(winner, cell = index, "game won");
        } else if self.used == Board::FULL {
            self.outcome = Outcome::Draw;
            info!("game drawn");
        } else {
            self.selected = None;
            self.phase = Phase::Selecting;
        }
        Ok(self.outcome)
    }

    /// Select a piece, silently ignoring invalid requests.
    pub fn select_piece(&mut self, index: u8) {
        if let Err(err) = self.try_select(index) {
            debug!(index, %err, "selection rejected");
        }
    }

    /// Place the selected piece, silently ignoring invalid requests.
    pub fn place_piece(&mut self, index: u8) {
        if let Err(err) = self.try_place(index) {
            debug!(index, %err, "placement rejected");
        }
    }

    /// Apply an action. Returns the outcome after the action.
    pub fn apply(&mut self, action: Action) -> Result<Outcome, ActionError> {
        match action {
            Action::Select(piece) => self.try_select(piece.0).map(|()| self.outcome),
            Action::Place(cell) => self.try_place(cell.0),
        }
    }

    /// All actions accepted in the current state.
    pub fn legal_actions(&self) -> Vec<Action> {
        if self.is_game_over() {
            return Vec::new();
        }
        match self.phase {
            Phase::Selecting => self.available_pieces().into_iter().map(Action::Select).collect(),
            Phase::Placing => self.board.empty_cells().map(Action::Place).collect(),
        }
    }

    // ========== Analysis ==========

    /// Available pieces that give the opponent no immediate winning placement.
    /// Empty outside the selecting phase.
    pub fn safe_pieces(&self) -> Vec<Piece> {
        if self.is_game_over() || self.phase != Phase::Selecting {
            return Vec::new();
        }
        self.available_pieces()
            .into_iter()
            .filter(|&piece| self.board.winning_cells(piece).is_empty())
            .collect()
    }

    /// Read-only view for the rendering layer.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board.cells().map(|cell| cell.map(|piece| piece.0)),
            current_player: self.current_player as u8,
            selected_piece: self.selected.map(|piece| piece.0),
            game_over: self.is_game_over(),
            phase: self.phase,
            result: self.outcome.as_str().to_string(),
            winner: self.winner().map(|player| player as u8),
            winning_line: self.winning_line().map(|line| line.map(|cell| cell.0)),
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable game state for rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Piece index per cell, row-major.
    pub board: [Option<u8>; Cell::COUNT],
    pub current_player: u8,
    pub selected_piece: Option<u8>,
    pub game_over: bool,
    pub phase: Phase,
    /// `ongoing`, `player_one_wins`, `player_two_wins` or `draw`.
    pub result: String,
    pub winner: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_line: Option<[u8; 4]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(indices: [u8; 4]) -> [Piece; 4] {
        indices.map(Piece)
    }

    /// Select then place each (piece, cell) pair in order.
    fn play(game: &mut Game, turns: &[(u8, u8)]) {
        for &(piece, cell) in turns {
            game.try_select(piece).unwrap();
            game.try_place(cell).unwrap();
        }
    }

    #[test]
    fn test_player_opponent() {
        assert_eq!(Player::One.opponent(), Player::Two);
        assert_eq!(Player::Two.opponent(), Player::One);
    }

    // ========== Pieces ==========

    #[test]
    fn test_catalog_is_cartesian_product() {
        assert_eq!(PIECES.len(), 16);
        for (i, piece) in PIECES.iter().enumerate() {
            assert_eq!(piece.0 as usize, i);
        }
        // Height is the most significant attribute.
        assert_eq!(Piece(8).attributes(), [true, false, false, false]);
        assert_eq!(Piece(1).attributes(), [false, false, false, true]);
        assert_eq!(Piece(15).attributes(), [true, true, true, true]);
    }

    #[test]
    fn test_piece_bounds() {
        assert_eq!(Piece::new(15), Some(Piece(15)));
        assert_eq!(Piece::new(16), None);
        assert!(!Piece(16).is_valid());
    }

    #[test]
    fn test_common_attribute_all_tall() {
        assert!(has_common_attribute(pieces([8, 9, 10, 11])));
        assert_eq!(
            common_attributes(pieces([8, 9, 10, 11])),
            vec![Attribute::Height, Attribute::Color]
        );
    }

    #[test]
    fn test_common_attribute_none_shared() {
        assert!(!has_common_attribute(pieces([0, 3, 12, 15])));
        assert!(common_attributes(pieces([0, 3, 12, 15])).is_empty());
    }

    #[test]
    fn test_common_attribute_shared_zero_value() {
        // All short and light.
        assert!(has_common_attribute(pieces([0, 1, 2, 3])));
        // Only fill=solid is shared.
        assert_eq!(common_attributes(pieces([1, 7, 9, 15])), vec![Attribute::Fill]);
    }

    #[test]
    fn test_common_attribute_matches_naive() {
        for a in 0..16u8 {
            for b in 0..16u8 {
                let quad = pieces([a, b, a ^ 0b0101, b ^ 0b1010]);
                let naive = Attribute::all()
                    .any(|attr| quad.iter().all(|p| p.attribute(attr) == quad[0].attribute(attr)));
                assert_eq!(has_common_attribute(quad), naive, "{:?}", quad);
            }
        }
    }

    // ========== Board ==========

    #[test]
    fn test_cell_row_col() {
        assert_eq!(Cell::from_row_col(2, 3), Cell(11));
        assert_eq!(Cell(13).row(), 3);
        assert_eq!(Cell(13).col(), 1);
        assert_eq!(Cell::new(16), None);
    }

    #[test]
    fn test_board_place_get() {
        let mut board = Board::new();
        assert!(board.is_empty(Cell(5)));
        board.place(Cell(5), Piece(0));
        board.place(Cell(15), Piece(15));
        assert_eq!(board.get(Cell(5)), Some(Piece(0)));
        assert_eq!(board.get(Cell(15)), Some(Piece(15)));
        assert_eq!(board.get(Cell(4)), None);
        assert_eq!(board.occupied_count(), 2);
        assert_eq!(board.empty_cells().count(), 14);
    }

    #[test]
    fn test_line_masks_match_lines() {
        for (line, mask) in Board::LINES.iter().zip(Board::LINE_MASKS) {
            let expected = line.iter().fold(0u16, |acc, cell| acc | cell.bit());
            assert_eq!(mask, expected, "mask mismatch for {:?}", line);
        }
    }

    #[test]
    fn test_all_winning_lines() {
        for line in &Board::LINES {
            let mut board = Board::new();
            for (&cell, piece) in line.iter().zip([8, 9, 10, 11]) {
                board.place(cell, Piece(piece));
            }
            assert!(board.check_win(), "Failed for line {:?}", line);
            assert_eq!(board.winning_line(), Some(*line));
        }
    }

    #[test]
    fn test_partial_line_never_wins() {
        let mut board = Board::new();
        board.place(Cell(0), Piece(8));
        board.place(Cell(1), Piece(9));
        board.place(Cell(2), Piece(10));
        assert!(!board.check_win());
        assert_eq!(board.winning_line(), None);
    }

    #[test]
    fn test_full_line_without_shared_attribute() {
        let mut board = Board::new();
        for (cell, piece) in [0, 3, 12, 15].into_iter().enumerate() {
            board.place(Cell(cell as u8), Piece(piece));
        }
        assert!(!board.check_win());
    }

    #[test]
    fn test_winning_cells() {
        let mut board = Board::new();
        board.place(Cell(0), Piece(8));
        board.place(Cell(1), Piece(9));
        board.place(Cell(2), Piece(10));
        assert_eq!(board.winning_cells(Piece(11)), vec![Cell(3)]);
        // Row 0 is tall and light; piece 7 is short and dark.
        assert!(board.winning_cells(Piece(7)).is_empty());
    }

    // ========== State Machine ==========

    #[test]
    fn test_initial_state() {
        let game = Game::new();
        assert_eq!(game.phase(), Phase::Selecting);
        assert_eq!(game.current_player(), Player::One);
        assert_eq!(game.selected_piece(), None);
        assert!(!game.is_game_over());
        assert_eq!(game.board().occupied_count(), 0);
        assert_eq!(game.available_pieces().len(), 16);
    }

    #[test]
    fn test_select_flips_player() {
        let mut game = Game::new();
        game.try_select(0).unwrap();
        assert_eq!(game.phase(), Phase::Placing);
        assert_eq!(game.current_player(), Player::Two);
        assert_eq!(game.selected_piece(), Some(Piece(0)));
    }

    #[test]
    fn test_place_keeps_player() {
        let mut game = Game::new();
        game.try_select(0).unwrap();
        assert_eq!(game.try_place(0), Ok(Outcome::Ongoing));
        assert_eq!(game.board().get(Cell(0)), Some(Piece(0)));
        assert_eq!(game.phase(), Phase::Selecting);
        assert_eq!(game.current_player(), Player::Two);
        assert_eq!(game.selected_piece(), None);
        assert!(game.is_used(Piece(0)));
    }

    #[test]
    fn test_select_rejections() {
        let mut game = Game::new();
        assert_eq!(game.try_select(16), Err(ActionError::InvalidPiece(16)));
        play(&mut game, &[(4, 0)]);
        let before = game;
        assert_eq!(game.try_select(4), Err(ActionError::PieceUsed(4)));
        assert_eq!(game, before);

        game.try_select(5).unwrap();
        let before = game;
        assert_eq!(
            game.try_select(6),
            Err(ActionError::WrongPhase { expected: Phase::Selecting })
        );
        assert_eq!(game, before);
    }

    #[test]
    fn test_place_rejections() {
        let mut game = Game::new();
        assert_eq!(
            game.try_place(0),
            Err(ActionError::WrongPhase { expected: Phase::Placing })
        );
        play(&mut game, &[(4, 0)]);
        game.try_select(5).unwrap();
        let before = game;
        assert_eq!(game.try_place(0), Err(ActionError::CellOccupied(0)));
        assert_eq!(game.try_place(16), Err(ActionError::InvalidCell(16)));
        assert_eq!(game, before);
    }

    #[test]
    fn test_silent_actions_ignore_invalid() {
        let mut game = Game::new();
        game.place_piece(3);
        assert_eq!(game, Game::new());
        game.select_piece(99);
        assert_eq!(game, Game::new());
        game.select_piece(2);
        game.place_piece(7);
        assert_eq!(game.board().get(Cell(7)), Some(Piece(2)));
    }

    #[test]
    fn test_row_win_declares_placer() {
        let mut game = Game::new();
        // Selections alternate P1, P2, P1, P2; placers alternate P2, P1, P2, P1.
        play(&mut game, &[(0, 0), (1, 1), (2, 2)]);
        game.try_select(3).unwrap();
        assert_eq!(game.current_player(), Player::One);
        assert_eq!(game.try_place(3), Ok(Outcome::Win(Player::One)));
        assert!(game.is_game_over());
        assert_eq!(game.winner(), Some(Player::One));
        assert_eq!(game.winning_line(), Some([Cell(0), Cell(1), Cell(2), Cell(3)]));
    }

    #[test]
    fn test_game_over_rejects_everything() {
        let mut game = Game::new();
        play(&mut game, &[(0, 0), (1, 1), (2, 2), (3, 3)]);
        let before = game;
        assert_eq!(game.try_select(4), Err(ActionError::GameOver));
        assert_eq!(game.try_place(4), Err(ActionError::GameOver));
        game.select_piece(4);
        game.place_piece(4);
        assert_eq!(game, before);
        assert!(game.legal_actions().is_empty());
    }

    #[test]
    fn test_reset_restores_initial() {
        let mut game = Game::new();
        play(&mut game, &[(0, 0), (1, 1)]);
        game.try_select(9).unwrap();
        game.reset();
        assert_eq!(game, Game::new());
    }

    #[test]
    fn test_legal_actions_by_phase() {
        let mut game = Game::new();
        assert_eq!(game.legal_actions().len(), 16);
        assert!(matches!(game.legal_actions()[0], Action::Select(Piece(0))));
        play(&mut game, &[(0, 5)]);
        game.try_select(1).unwrap();
        let actions = game.legal_actions();
        assert_eq!(actions.len(), 15);
        assert!(!actions.contains(&Action::Place(Cell(5))));
    }

    #[test]
    fn test_apply_matches_try_actions() {
        let mut game = Game::new();
        assert_eq!(game.apply(Action::Select(Piece(7))), Ok(Outcome::Ongoing));
        assert_eq!(game.apply(Action::Place(Cell(9))), Ok(Outcome::Ongoing));
        assert_eq!(game.board().get(Cell(9)), Some(Piece(7)));
    }

    #[test]
    fn test_safe_pieces() {
        let mut game = Game::new();
        play(&mut game, &[(8, 0), (9, 1), (10, 2)]);
        let safe = game.safe_pieces();
        // Every tall or light piece completes row 0.
        assert!(safe.iter().all(|p| !p.attribute(Attribute::Height) && p.attribute(Attribute::Color)));
        assert!(safe.contains(&Piece(4)));
        assert!(!safe.contains(&Piece(11)));

        game.try_select(4).unwrap();
        assert!(game.safe_pieces().is_empty());
    }

    #[test]
    fn test_snapshot_shape() {
        let mut game = Game::new();
        game.try_select(6).unwrap();
        let snap = game.snapshot();
        assert_eq!(snap.current_player, 2);
        assert_eq!(snap.selected_piece, Some(6));
        assert_eq!(snap.phase, Phase::Placing);
        assert_eq!(snap.result, "ongoing");
        assert_eq!(snap.board, [None; 16]);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "placing");
        assert!(json.get("winning_line").is_none());
    }

    #[test]
    fn test_used_count_matches_board_fuzz() {
        use rand::prelude::*;

        let mut rng = rand::rng();

        for _ in 0..200 {
            let mut game = Game::new();
            let mut seen = std::collections::HashSet::new();

            while !game.is_game_over() {
                // Throw in random (often invalid) requests.
                let before = game;
                let noise: u8 = rng.random_range(0..20);
                if game.phase() == Phase::Selecting {
                    game.place_piece(noise);
                } else {
                    game.select_piece(noise);
                }
                assert_eq!(game, before);

                let actions = game.legal_actions();
                let action = actions[rng.random_range(0..actions.len())];
                game.apply(action).unwrap();
                if let Action::Place(cell) = action {
                    let piece = game.board().get(cell).unwrap();
                    assert!(seen.insert(piece), "piece {:?} placed twice", piece);
                }
                assert_eq!(game.used_mask().count_ones(), game.board().occupied_count());
            }
        }
    }
}
