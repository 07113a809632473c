//! dein.shop server - a curated directory of independent shops.
//!
//! One binary serves both the public directory API and the admin moderation
//! API under `/api`.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out (`{data}` / `{error:{message}}`)
//! - `SQLite` via sqlx, with an FTS5 index for shop search
//! - Session cookies backed by the `sessions` table, Argon2 password hashes
//! - Submitter feedback emails queued and sent over SMTP with lettre
//! - Optional Unsplash proxy for category cover photos

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod search;
pub mod services;
pub mod state;
pub mod validation;

pub use routes::app;
pub use state::AppState;
