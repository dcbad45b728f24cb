//! Game session with linear undo/redo history.

use quarto_core::{format_actions, parse_actions, Action, Game};

use crate::error::ApiError;

/// One game plus the actions that produced it.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// History of game states (index 0 = starting position)
    states: Vec<Game>,
    /// actions[i] = action that led from states[i] to states[i+1]
    actions: Vec<Action>,
    /// Current position in history
    current_index: usize,
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            states: vec![Game::new()],
            actions: vec![],
            current_index: 0,
        }
    }

    pub fn current(&self) -> &Game {
        &self.states[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index < self.states.len() - 1
    }

    /// Apply an action at the current position, discarding any redo history.
    pub fn apply(&mut self, action: Action) -> Result<&Game, ApiError> {
        let mut next = *self.current();
        next.apply(action)?;

        self.states.truncate(self.current_index + 1);
        self.actions.truncate(self.current_index);
        self.states.push(next);
        self.actions.push(action);
        self.current_index += 1;
        Ok(self.current())
    }

    pub fn undo(&mut self) -> Result<&Game, ApiError> {
        if !self.can_undo() {
            return Err(ApiError::NothingToUndo);
        }
        self.current_index -= 1;
        Ok(self.current())
    }

    pub fn redo(&mut self) -> Result<&Game, ApiError> {
        if !self.can_redo() {
            return Err(ApiError::NothingToRedo);
        }
        self.current_index += 1;
        Ok(self.current())
    }

    pub fn goto(&mut self, index: usize) -> Result<&Game, ApiError> {
        if index >= self.states.len() {
            return Err(ApiError::InvalidIndex(index));
        }
        self.current_index = index;
        Ok(self.current())
    }

    /// (action, game state before it) for every recorded action.
    pub fn history(&self) -> impl Iterator<Item = (Action, &Game)> + '_ {
        self.actions.iter().copied().zip(self.states.iter())
    }

    pub fn total_actions(&self) -> usize {
        self.actions.len()
    }

    /// Notation of the actions up to the current position.
    pub fn export(&self) -> String {
        format_actions(&self.actions[..self.current_index])
    }

    /// Build a session by replaying notation from a fresh game.
    /// Replay stops once the game is over; trailing actions are ignored.
    pub fn import(notation: &str) -> Result<Self, ApiError> {
        let actions = parse_actions(notation)?;
        let mut session = Self::new();

        for (i, action) in actions.into_iter().enumerate() {
            if session.current().is_game_over() {
                break;
            }
            session.apply(action).map_err(|err| match err {
                ApiError::Action(source) => ApiError::Replay {
                    index: i + 1,
                    notation: action.to_string(),
                    source,
                },
                other => other,
            })?;
        }
        Ok(session)
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
