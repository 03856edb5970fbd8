//! Review endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use cardfold_core::error::CardfoldError;
use cardfold_core::library::ReviewDeck;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::UserId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    /// Only review cards filed in this folder.
    pub folder: Option<String>,
}

/// Cards to flip through, starting at the first.
/// GET /review?folder=<id>
pub async fn review(
    State(state): State<AppState>,
    user: UserId,
    Query(query): Query<ReviewQuery>,
) -> ApiResult<Json<ReviewDeck>> {
    let folder_id = match query.folder.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            Some(Uuid::parse_str(raw).map_err(|_| CardfoldError::invalid_id("folder", raw))?)
        }
    };

    let deck = state.library.review(user.as_str(), folder_id)?;
    Ok(Json(deck))
}
