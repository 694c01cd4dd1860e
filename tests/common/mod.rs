//! In-process mock of the Mastermind backend.
//!
//! Serves the `/auth/*` and `game/*` endpoints on an ephemeral port and
//! counts every hit so tests can assert which calls the client made.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc, Mutex,
    },
};

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use mastermind_client::api::{Leaderboard, RoundData};

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "correct horse";

/// A JWT-shaped token expiring `offset` from now. The signature is junk; the
/// client never checks it.
pub fn token(offset: Duration, tag: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({ "exp": (Utc::now() + offset).timestamp(), "jti": tag }).to_string(),
    );
    format!("{}.{}.sig", header, payload)
}

pub fn live_token(tag: &str) -> String {
    token(Duration::hours(1), tag)
}

pub fn expired_token(tag: &str) -> String {
    token(Duration::hours(-1), tag)
}

pub struct MockBackend {
    pub access: String,
    pub refresh: String,
    pub refreshed_access: String,
    pub verify_ok: AtomicBool,
    /// Reject by answering 200 with a `code` field instead of 401
    pub verify_rejects_in_body: AtomicBool,
    pub refresh_ok: AtomicBool,
    pub resume_ok: AtomicBool,
    pub start_time_ok: AtomicBool,
    pub register_response: Mutex<(StatusCode, Value)>,
    pub difficulty: AtomicU8,
    pub secret: Mutex<String>,
    /// `None` means the player has no active game
    pub rounds: Mutex<Option<Vec<RoundData>>>,
    pub leaderboard: Mutex<Leaderboard>,
    pub start_time: Mutex<DateTime<Utc>>,
    pub guesses: Mutex<Vec<String>>,
    pub auth_headers: Mutex<Vec<String>>,
    hits: Mutex<HashMap<&'static str, usize>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            access: live_token("access"),
            refresh: live_token("refresh"),
            refreshed_access: live_token("refreshed"),
            verify_ok: AtomicBool::new(true),
            verify_rejects_in_body: AtomicBool::new(false),
            refresh_ok: AtomicBool::new(true),
            resume_ok: AtomicBool::new(true),
            start_time_ok: AtomicBool::new(true),
            register_response: Mutex::new((StatusCode::CREATED, json!({}))),
            difficulty: AtomicU8::new(4),
            secret: Mutex::new("1234".to_string()),
            rounds: Mutex::new(Some(Vec::new())),
            leaderboard: Mutex::new(Leaderboard::default()),
            start_time: Mutex::new(Utc::now() - Duration::seconds(90)),
            guesses: Mutex::new(Vec::new()),
            auth_headers: Mutex::new(Vec::new()),
            hits: Mutex::new(HashMap::new()),
        })
    }

    pub fn hits(&self, endpoint: &str) -> usize {
        self.hits.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    fn hit(&self, endpoint: &'static str) {
        *self.hits.lock().unwrap().entry(endpoint).or_default() += 1;
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
            return false;
        };
        self.auth_headers.lock().unwrap().push(value.to_string());
        value.starts_with("JWT ")
    }
}

/// Serve `backend` on an ephemeral port and return its base URL
pub async fn spawn(backend: Arc<MockBackend>) -> String {
    let app = Router::new()
        .route("/auth/users/", post(register))
        .route("/auth/jwt/create", post(create_token))
        .route("/auth/jwt/verify", post(verify_token))
        .route("/auth/jwt/refresh/", post(refresh_token))
        .route("/game/newgame/", post(new_game))
        .route("/game/difficulty/", get(get_difficulty).patch(set_difficulty))
        .route("/game/gamerounds/", get(get_rounds).post(post_round))
        .route("/game/leaderboard/", get(leaderboard))
        .route("/game/starttime/", get(start_time))
        .route("/game/resumegame/", patch(resume_game))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

type Backend = State<Arc<MockBackend>>;

async fn register(State(b): Backend, Json(_body): Json<Value>) -> Response {
    b.hit("register");
    let (status, body) = b.register_response.lock().unwrap().clone();
    (status, Json(body)).into_response()
}

async fn create_token(State(b): Backend, Json(body): Json<Value>) -> Response {
    b.hit("create");
    if body["username"] == USERNAME && body["password"] == PASSWORD {
        Json(json!({ "access": b.access, "refresh": b.refresh })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "No active account found with the given credentials" })),
        )
            .into_response()
    }
}

async fn verify_token(State(b): Backend, Json(_body): Json<Value>) -> Response {
    b.hit("verify");
    if b.verify_ok.load(Ordering::SeqCst) {
        Json(json!({})).into_response()
    } else if b.verify_rejects_in_body.load(Ordering::SeqCst) {
        Json(json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })),
        )
            .into_response()
    }
}

async fn refresh_token(State(b): Backend, Json(body): Json<Value>) -> Response {
    b.hit("refresh");
    if b.refresh_ok.load(Ordering::SeqCst) && body["refresh"] == b.refresh.as_str() {
        Json(json!({ "access": b.refreshed_access })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "code": "token_not_valid" }))).into_response()
    }
}

async fn new_game(State(b): Backend, headers: HeaderMap) -> Response {
    b.hit("newgame");
    if !b.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    *b.rounds.lock().unwrap() = Some(Vec::new());
    *b.start_time.lock().unwrap() = Utc::now();
    (StatusCode::CREATED, Json(json!({}))).into_response()
}

async fn get_difficulty(State(b): Backend, headers: HeaderMap) -> Response {
    b.hit("get_difficulty");
    if !b.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(b.difficulty.load(Ordering::SeqCst)).into_response()
}

async fn set_difficulty(State(b): Backend, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    b.hit("set_difficulty");
    if !b.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let Some(level) = body["difficulty"].as_u64() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    b.difficulty.store(level as u8, Ordering::SeqCst);
    Json(level).into_response()
}

async fn get_rounds(State(b): Backend, headers: HeaderMap) -> Response {
    b.hit("get_rounds");
    if !b.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match b.rounds.lock().unwrap().clone() {
        Some(rounds) => Json(rounds).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "Game not found" }))).into_response(),
    }
}

async fn post_round(State(b): Backend, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    b.hit("post_round");
    if !b.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let guess = body["guess"].as_str().unwrap_or_default().to_string();
    b.guesses.lock().unwrap().push(guess.clone());

    let secret = b.secret.lock().unwrap().clone();
    let correct_positions = guess.chars().zip(secret.chars()).filter(|(g, s)| g == s).count() as u8;
    let round = RoundData {
        guess,
        correct_numbers: correct_positions,
        correct_positions,
    };

    let mut rounds = b.rounds.lock().unwrap();
    match rounds.as_mut() {
        Some(rounds) => {
            rounds.push(round.clone());
            (StatusCode::CREATED, Json(round)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn leaderboard(State(b): Backend, headers: HeaderMap) -> Response {
    b.hit("leaderboard");
    if !b.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(b.leaderboard.lock().unwrap().clone()).into_response()
}

async fn start_time(State(b): Backend, headers: HeaderMap) -> Response {
    b.hit("starttime");
    if !b.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if !b.start_time_ok.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({ "start_time": *b.start_time.lock().unwrap() })).into_response()
}

async fn resume_game(State(b): Backend, headers: HeaderMap) -> Response {
    b.hit("resumegame");
    if !b.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if b.resume_ok.load(Ordering::SeqCst) {
        Json(json!({})).into_response()
    } else {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
