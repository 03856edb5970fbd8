//! Flashcard endpoints.

use axum::{extract::State, Form, Json};
use cardfold_core::error::CardfoldError;
use cardfold_core::library::SubmitOutcome;
use cardfold_core::types::{Flashcard, MoveTarget};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::middleware::UserId;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub user_id: String,
    pub card_count: usize,
}

/// Form body for submitting words.
#[derive(Debug, Deserialize)]
pub struct SubmitWordsForm {
    /// Newline-delimited `word: meaning` lines.
    #[serde(default)]
    pub words: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveFlashcardForm {
    #[serde(default)]
    pub flashcard_id: String,
    /// Folder id, or `uncategorized`.
    #[serde(default)]
    pub to_folder: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteFlashcardForm {
    #[serde(default)]
    pub flashcard_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    pub categorized: usize,
}

fn parse_card_id(raw: &str) -> ApiResult<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CardfoldError::missing_field("flashcard_id").into());
    }
    raw.parse()
        .map_err(|_| CardfoldError::invalid_id("flashcard", raw).into())
}

/// How many cards the user has.
/// GET /home
pub async fn home(State(state): State<AppState>, user: UserId) -> ApiResult<Json<HomeResponse>> {
    let card_count = state.library.card_count(user.as_str())?;
    Ok(Json(HomeResponse {
        user_id: user.0,
        card_count,
    }))
}

/// Store submitted words as flashcards.
/// POST /home
pub async fn submit_words(
    State(state): State<AppState>,
    user: UserId,
    Form(form): Form<SubmitWordsForm>,
) -> ApiResult<Json<SubmitOutcome>> {
    let outcome = state.library.submit_words(user.as_str(), &form.words).await?;
    Ok(Json(outcome))
}

/// Move a card into a folder or back to uncategorized.
/// POST /move-flashcard
pub async fn move_flashcard(
    State(state): State<AppState>,
    user: UserId,
    Form(form): Form<MoveFlashcardForm>,
) -> ApiResult<Json<Flashcard>> {
    let card_id = parse_card_id(&form.flashcard_id)?;
    let target = MoveTarget::parse(&form.to_folder)
        .ok_or_else(|| CardfoldError::invalid_id("folder", form.to_folder.trim()))?;

    let card = state.library.move_flashcard(user.as_str(), card_id, target)?;
    Ok(Json(card))
}

/// Delete a card.
/// POST /delete-flashcard
pub async fn delete_flashcard(
    State(state): State<AppState>,
    user: UserId,
    Form(form): Form<DeleteFlashcardForm>,
) -> ApiResult<Json<DeletedResponse>> {
    let card_id = parse_card_id(&form.flashcard_id)?;
    state.library.delete_flashcard(user.as_str(), card_id)?;
    Ok(Json(DeletedResponse { deleted: true }))
}

/// File every uncategorized card.
/// POST /categorize
pub async fn categorize(
    State(state): State<AppState>,
    user: UserId,
) -> ApiResult<Json<CategorizeResponse>> {
    let categorized = state.library.categorize(user.as_str()).await?;
    Ok(Json(CategorizeResponse { categorized }))
}
