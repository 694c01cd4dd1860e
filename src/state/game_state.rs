//! Game board state structure and management

use crate::api::{Leaderboard, RoundData};

/// Rounds allowed before a game is lost
pub const MAX_ROUNDS: usize = 10;

/// Highest digit a guess may contain
pub const MAX_DIGIT: u8 = 7;

/// Difficulty levels the backend accepts (digits per guess)
pub const DIFFICULTIES: [u8; 3] = [4, 5, 6];

/// Where the current game stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
    /// The backend reports no active game for this player
    NoGame,
}

impl GameStatus {
    /// Win or lose. The timer stops in either.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Lost)
    }
}

/// Local view of the player's game
#[derive(Debug, Clone)]
pub struct GameBoard {
    /// Digits per guess, unknown until fetched
    pub difficulty: Option<u8>,
    pub rounds: Vec<RoundData>,
    /// Digits entered for the next guess
    pub guess: Vec<u8>,
    pub status: GameStatus,
    pub error_message: Option<String>,
    pub leaderboard: Leaderboard,
}

impl GameBoard {
    pub fn new() -> Self {
        Self {
            difficulty: None,
            rounds: Vec::new(),
            guess: Vec::new(),
            status: GameStatus::Playing,
            error_message: None,
            leaderboard: Leaderboard::default(),
        }
    }

    /// Guess buttons are only live while a game is being played
    pub fn controls_enabled(&self) -> bool {
        self.status == GameStatus::Playing
    }

    /// Append a digit to the guess buffer.
    ///
    /// Ignored when controls are disabled, the digit is out of range, or the
    /// buffer already holds `difficulty` digits.
    pub fn push_digit(&mut self, digit: u8) -> bool {
        if !self.controls_enabled() || digit > MAX_DIGIT {
            return false;
        }
        match self.difficulty {
            Some(limit) if self.guess.len() < limit as usize => {
                self.guess.push(digit);
                true
            }
            _ => false,
        }
    }

    /// Remove the last digit of the guess buffer
    pub fn delete_digit(&mut self) -> Option<u8> {
        self.guess.pop()
    }

    /// The guess buffer as the string the backend expects
    pub fn guess_string(&self) -> String {
        self.guess.iter().map(|d| char::from(b'0' + d)).collect()
    }

    /// Check the buffer before it is submitted.
    ///
    /// Returns the guess string, or sets and returns the message to show.
    pub fn validate_guess(&mut self) -> Result<String, String> {
        let guess = self.guess_string();
        let expected = self.difficulty.unwrap_or(0) as usize;

        let problem = if !self.controls_enabled() {
            Some("No game in progress!".to_string())
        } else if self.guess.len() != expected {
            Some(format!("Please input {} numbers!", expected))
        } else if self.rounds.iter().any(|round| round.guess == guess) {
            Some("Please input unique guess!".to_string())
        } else {
            None
        };

        match problem {
            Some(message) => {
                self.error_message = Some(message.clone());
                Err(message)
            }
            None => {
                self.error_message = None;
                Ok(guess)
            }
        }
    }

    /// Replace the guess buffer with the digits of `input`.
    ///
    /// Non-digit characters are rejected as a whole.
    pub fn enter_guess(&mut self, input: &str) -> Result<(), String> {
        let digits = input
            .chars()
            .map(|c| {
                c.to_digit(10)
                    .map(|d| d as u8)
                    .filter(|d| *d <= MAX_DIGIT)
                    .ok_or_else(|| format!("Digits must be between 0 and {}!", MAX_DIGIT))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Typed guesses are not clamped to the difficulty; a wrong length is
        // reported when the guess is validated
        self.guess = if self.controls_enabled() { digits } else { Vec::new() };
        Ok(())
    }

    /// Apply a fresh round list and detect the end of the game.
    ///
    /// Returns true when this update moved the game into a terminal status.
    pub fn apply_rounds(&mut self, rounds: Vec<RoundData>) -> bool {
        let was_terminal = self.status.is_terminal();
        self.rounds = rounds;

        self.status = match (self.rounds.last(), self.difficulty) {
            (Some(last), Some(difficulty)) if last.correct_positions == difficulty => GameStatus::Won,
            _ if self.rounds.len() >= MAX_ROUNDS => GameStatus::Lost,
            _ => GameStatus::Playing,
        };

        !was_terminal && self.status.is_terminal()
    }

    /// The backend has no active game for this player
    pub fn mark_no_game(&mut self) {
        self.status = GameStatus::NoGame;
    }

    /// Clear everything tied to the previous game
    pub fn reset_for_new_game(&mut self) {
        self.rounds.clear();
        self.guess.clear();
        self.error_message = None;
        self.status = GameStatus::Playing;
    }

    /// Difficulties the player can switch to from the current one
    pub fn difficulty_options(&self) -> Vec<u8> {
        DIFFICULTIES
            .iter()
            .copied()
            .filter(|d| Some(*d) != self.difficulty)
            .collect()
    }
}

impl Default for GameBoard {
    fn default() -> Self {
        Self::new()
    }
}
