//! Game actions: difficulty, rounds, guesses and the leaderboard

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    api::{ApiClient, Leaderboard},
    error::{ClientError, Result},
    state::{
        game_state::DIFFICULTIES,
        GameBoard, GameStatus, IdentityStore,
    },
};
use super::access_token;

/// Drives the player's game against the backend and keeps a local
/// [`GameBoard`].
///
/// Every failure here stays local: it is logged, returned, and never touches
/// the authentication state.
#[derive(Debug)]
pub struct GameController {
    api: ApiClient,
    store: Arc<IdentityStore>,
    board: Mutex<GameBoard>,
    status_tx: watch::Sender<GameStatus>,
}

impl GameController {
    pub fn new(api: ApiClient, store: Arc<IdentityStore>) -> Self {
        let (status_tx, _) = watch::channel(GameStatus::Playing);
        Self {
            api,
            store,
            board: Mutex::new(GameBoard::new()),
            status_tx,
        }
    }

    /// Snapshot of the board
    pub fn board(&self) -> GameBoard {
        self.lock().clone()
    }

    /// Watch the game status; the tick loop stops on terminal states
    pub fn subscribe_status(&self) -> watch::Receiver<GameStatus> {
        self.status_tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, GameBoard> {
        self.board.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `update` to the board and publish the resulting status
    fn update<T>(&self, update: impl FnOnce(&mut GameBoard) -> T) -> T {
        let (result, status) = {
            let mut board = self.lock();
            let result = update(&mut board);
            (result, board.status)
        };
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
        result
    }

    /// Load difficulty, rounds and leaderboard, in that order
    pub async fn refresh_all(&self) {
        // Win detection needs the difficulty, so it goes first
        let failures = [
            self.fetch_difficulty().await.err(),
            self.fetch_round_data().await.err(),
            self.fetch_leaderboard().await.err(),
        ];
        for e in failures.into_iter().flatten() {
            debug!("Board refreshed partially: {}", e);
        }
    }

    /// GET the player's difficulty
    pub async fn fetch_difficulty(&self) -> Result<u8> {
        let token = access_token(&self.store)?;
        match self.api.difficulty(&token).await {
            Ok(difficulty) => {
                self.update(|board| board.difficulty = Some(difficulty));
                Ok(difficulty)
            }
            Err(e) => {
                warn!("Unable to fetch difficulty: {}", e);
                Err(e)
            }
        }
    }

    /// GET the rounds of the current game.
    ///
    /// A missing game is a state, not an error: the board switches to
    /// [`GameStatus::NoGame`]. Finishing the game refreshes the leaderboard.
    pub async fn fetch_round_data(&self) -> Result<()> {
        let token = access_token(&self.store)?;
        match self.api.game_rounds(&token).await {
            Ok(rounds) => {
                debug!("Fetched {} rounds", rounds.len());
                let finished = self.update(|board| board.apply_rounds(rounds));
                if finished {
                    info!("Game over: {:?}", self.lock().status);
                    if let Err(e) = self.fetch_leaderboard().await {
                        debug!("Final leaderboard not loaded: {}", e);
                    }
                }
                Ok(())
            }
            Err(ClientError::NotFound) => {
                debug!("No active game");
                self.update(GameBoard::mark_no_game);
                Ok(())
            }
            Err(e) => {
                warn!("Unable to fetch round data: {}", e);
                Err(e)
            }
        }
    }

    /// GET the player's statistics
    pub async fn fetch_leaderboard(&self) -> Result<Leaderboard> {
        let token = access_token(&self.store)?;
        match self.api.leaderboard(&token).await {
            Ok(leaderboard) => {
                self.update(|board| board.leaderboard = leaderboard.clone());
                Ok(leaderboard)
            }
            Err(e) => {
                warn!("Unable to fetch leaderboard: {}", e);
                Err(e)
            }
        }
    }

    /// Start a new game and reload the board
    pub async fn new_game(&self) -> Result<()> {
        let token = access_token(&self.store)?;
        if let Err(e) = self.api.new_game(&token).await {
            warn!("Unable to create new game: {}", e);
            return Err(e);
        }

        info!("New game created");
        self.update(GameBoard::reset_for_new_game);
        self.refresh_all().await;
        Ok(())
    }

    /// Change the difficulty, which starts a new game
    pub async fn set_difficulty(&self, difficulty: u8) -> Result<()> {
        if !DIFFICULTIES.contains(&difficulty) {
            return Err(ClientError::Validation {
                field: "difficulty".to_string(),
                message: format!("Difficulty must be one of {:?}", DIFFICULTIES),
            });
        }

        let token = access_token(&self.store)?;
        if let Err(e) = self.api.set_difficulty(&token, difficulty).await {
            warn!("Unable to set difficulty: {}", e);
            return Err(e);
        }

        info!("Difficulty set to {}", difficulty);
        self.new_game().await
    }

    /// Add a digit to the guess buffer
    pub fn push_digit(&self, digit: u8) -> bool {
        self.update(|board| board.push_digit(digit))
    }

    /// Remove the last digit from the guess buffer
    pub fn delete_digit(&self) -> Option<u8> {
        self.update(GameBoard::delete_digit)
    }

    /// Replace the guess buffer with the digits of `input`
    pub fn enter_guess(&self, input: &str) -> Result<()> {
        self.update(|board| board.enter_guess(input))
            .map_err(|message| ClientError::Validation {
                field: "guess".to_string(),
                message,
            })
    }

    /// Submit the guess buffer.
    ///
    /// The guess must have exactly `difficulty` digits and must not repeat an
    /// earlier round. Once the backend accepts it the buffer is cleared and
    /// the rounds are re-fetched.
    pub async fn submit_guess(&self) -> Result<()> {
        let guess = self
            .update(GameBoard::validate_guess)
            .map_err(|message| ClientError::Validation {
                field: "guess".to_string(),
                message,
            })?;

        let token = access_token(&self.store)?;
        if let Err(e) = self.api.submit_guess(&token, &guess).await {
            warn!("Unable to submit guess {}: {}", guess, e);
            return Err(e);
        }

        debug!("Guess {} accepted", guess);
        self.update(|board| board.guess.clear());
        self.fetch_round_data().await
    }
}
