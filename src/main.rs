//! Mastermind Client - A session-managed terminal client for the Mastermind game
//!
//! This is the main entry point for the mastermind-client application.

use std::{sync::Arc, time::Duration};
use anyhow::{bail, Context};
use tracing::{debug, info};

use mastermind_client::{
    api::{ApiClient, Credentials},
    config::{Command, Config},
    error::ClientError,
    services::{auth::INVALID_LOGIN_MESSAGE, GameController, GameTimerController, SessionManager},
    state::{convert_seconds, Access, GameBoard, GameStatus, IdentityKey, IdentityStore},
    tasks::{game_timer_task, resume_on_session_change_task, token_refresh_task, ScopedTask},
    utils::shutdown_signal,
};

/// How often `play` re-reads the rounds to notice guesses made elsewhere
const ROUND_POLL_PERIOD: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("mastermind_client={}", config.log_level()))
        .init();

    debug!("Configuration: base_url={}, store={}", config.base_url, config.store.display());

    let store = Arc::new(IdentityStore::open(&config.store));
    let api = ApiClient::new(&config.base_url).context("invalid --base-url")?;
    let session = Arc::new(SessionManager::new(api.clone(), Arc::clone(&store)));

    match config.command.clone() {
        Command::Register { username, password } => {
            let credentials = Credentials::new(username, password);
            match session.sign_up(&credentials).await {
                Ok(()) => println!("Registered and signed in as {}", credentials.username),
                Err(ClientError::Validation { message, .. }) => bail!("({})", message),
                Err(e) => bail!("Registration failed: {}", e),
            }
        }

        Command::Login { username, password } => {
            let credentials = Credentials::new(username, password);
            if session.sign_in(&credentials).await.is_err() {
                bail!(INVALID_LOGIN_MESSAGE);
            }
            println!("Signed in as {}", credentials.username);
        }

        Command::Logout => {
            session.logout(None);
            println!("Signed out");
        }

        Command::Status => {
            session.fetch_authenticated_player().await;
            match session.state().access() {
                Access::Granted => println!(
                    "Signed in as {}",
                    store.get(IdentityKey::Player).unwrap_or_default()
                ),
                _ => println!("Not signed in"),
            }
        }

        command => {
            require_session(&session).await?;
            let game = GameController::new(api.clone(), Arc::clone(&store));
            run_game_command(command, &config, &session, &game, api, store).await?;
        }
    }

    Ok(())
}

/// Run the one-time authentication check and insist on its success
async fn require_session(session: &SessionManager) -> anyhow::Result<()> {
    session.fetch_authenticated_player().await;
    if session.state().access() != Access::Granted {
        bail!("Not signed in, run `login` first");
    }
    Ok(())
}

async fn run_game_command(
    command: Command,
    config: &Config,
    session: &Arc<SessionManager>,
    game: &GameController,
    api: ApiClient,
    store: Arc<IdentityStore>,
) -> anyhow::Result<()> {
    let player = store.get(IdentityKey::Player).unwrap_or_default();

    match command {
        Command::NewGame => {
            game.new_game().await?;
            print_board(&player, &game.board());
        }

        Command::Difficulty { level: Some(level) } => {
            game.set_difficulty(level).await?;
            print_board(&player, &game.board());
        }

        Command::Difficulty { level: None } => {
            let current = game.fetch_difficulty().await?;
            println!("Currently({})", current);
            println!("Available: {:?}", game.board().difficulty_options());
        }

        Command::Guess { digits } => {
            game.refresh_all().await;
            if !game.board().controls_enabled() {
                bail!("No game in progress, run `new-game` first");
            }
            game.enter_guess(&digits)?;
            game.submit_guess().await?;
            print_board(&player, &game.board());
        }

        Command::Rounds | Command::Leaderboard => {
            game.refresh_all().await;
            print_board(&player, &game.board());
        }

        Command::Play { no_timer } => {
            game.refresh_all().await;
            print_board(&player, &game.board());
            play(config, session, game, api, store, !no_timer).await;
        }

        Command::Register { .. } | Command::Login { .. } | Command::Logout | Command::Status => {
            unreachable!("handled before authentication")
        }
    }

    Ok(())
}

/// Follow the game until an unload signal arrives
async fn play(
    config: &Config,
    session: &Arc<SessionManager>,
    game: &GameController,
    api: ApiClient,
    store: Arc<IdentityStore>,
    with_timer: bool,
) {
    let _refresh = ScopedTask::spawn(token_refresh_task(Arc::clone(session), config.refresh_period()));

    let timer = with_timer.then(|| Arc::new(GameTimerController::new(api, store)));
    let mut timer_rx = timer.as_ref().map(|t| t.subscribe());
    let _timer_tasks = match &timer {
        Some(timer) => {
            if let Err(e) = timer.reconcile_resume().await {
                debug!("Starting without a fresh start time: {}", e);
            }
            vec![
                ScopedTask::spawn(game_timer_task(Arc::clone(timer), game.subscribe_status())),
                ScopedTask::spawn(resume_on_session_change_task(Arc::clone(timer), session.subscribe())),
            ]
        }
        None => Vec::new(),
    };

    let mut status_rx = game.subscribe_status();
    let mut session_rx = session.subscribe();
    let mut poll = tokio::time::interval(ROUND_POLL_PERIOD);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    info!("Following game, press Ctrl-C to pause and exit");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                if let Some(timer) = &timer {
                    timer.handle_pause();
                }
                break;
            }

            _ = poll.tick() => {
                if let Err(e) = game.fetch_round_data().await {
                    debug!("Round poll failed: {}", e);
                }
            }

            Ok(()) = async {
                match timer_rx.as_mut() {
                    Some(rx) => rx.changed().await,
                    None => std::future::pending().await,
                }
            } => {
                if let Some(rx) = timer_rx.as_mut() {
                    println!("Time: {}", rx.borrow_and_update().elapsed_time);
                }
            }

            Ok(()) = status_rx.changed() => {
                let status = *status_rx.borrow_and_update();
                match status {
                    GameStatus::Won => println!("You win!"),
                    GameStatus::Lost => println!("You lose!"),
                    GameStatus::NoGame => println!("No active game"),
                    GameStatus::Playing => {}
                }
            }

            Ok(()) = session_rx.changed() => {
                if !session_rx.borrow_and_update().is_authenticated {
                    println!("Session ended, sign in again");
                    break;
                }
            }
        }
    }
}

fn print_board(player: &str, board: &GameBoard) {
    let difficulty = board
        .difficulty
        .map(|d| d.to_string())
        .unwrap_or_else(|| "?".to_string());

    println!("{}'s level {} rankings:", player, difficulty);
    println!("  Wins: {}", board.leaderboard.wins);
    if let Some(fastest) = board.leaderboard.fastest_time {
        println!("  Fastest: {}", convert_seconds(fastest.max(0.0) as u64));
    }

    if board.status == GameStatus::NoGame {
        println!("No active game, run `new-game` to start one");
        return;
    }

    for (i, round) in board.rounds.iter().enumerate() {
        println!(
            "round {:>2}  {}  {} number(s)  {} position(s)",
            i + 1,
            round.guess,
            round.correct_numbers,
            round.correct_positions
        );
    }

    match board.status {
        GameStatus::Won => println!("You win!"),
        GameStatus::Lost => println!("You lose!"),
        _ => {
            if let Some(message) = &board.error_message {
                println!("{}", message);
            }
        }
    }
}
