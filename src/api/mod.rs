//! Backend API module
//!
//! This module contains the HTTP client for the backend and its request and
//! response structures.

pub mod client;
pub mod responses;

pub use client::ApiClient;
pub use responses::{Credentials, Leaderboard, RoundData, TokenPair};
