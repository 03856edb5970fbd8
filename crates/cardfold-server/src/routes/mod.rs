//! Route definitions for the HTTP API.
//!
//! POST routes take `application/x-www-form-urlencoded` bodies; every route
//! answers with JSON.

mod flashcards;
mod folders;
mod health;
mod review;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Every route, as `(method, path)`, for the landing page.
pub const ROUTES: &[(&str, &str)] = &[
    ("GET", "/"),
    ("GET", "/health"),
    ("GET", "/home"),
    ("POST", "/home"),
    ("GET", "/review"),
    ("GET", "/my-flashcards"),
    ("POST", "/create-folder"),
    ("POST", "/move-flashcard"),
    ("POST", "/delete-flashcard"),
    ("POST", "/delete-folder/:id"),
    ("POST", "/categorize"),
];

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Landing and health check
        .route("/", get(health::landing))
        .route("/health", get(health::health_check))
        // Submitting and reviewing cards
        .route("/home", get(flashcards::home).post(flashcards::submit_words))
        .route("/review", get(review::review))
        // Folder management
        .route("/my-flashcards", get(folders::my_flashcards))
        .route("/create-folder", post(folders::create_folder))
        .route("/delete-folder/:id", post(folders::delete_folder))
        // Card management
        .route("/move-flashcard", post(flashcards::move_flashcard))
        .route("/delete-flashcard", post(flashcards::delete_flashcard))
        .route("/categorize", post(flashcards::categorize))
        // Attach state
        .with_state(state)
}

pub use flashcards::*;
pub use folders::*;
pub use health::*;
pub use review::*;
