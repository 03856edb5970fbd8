//! Folder endpoints.

use axum::{
    extract::{Path, State},
    Form, Json,
};
use cardfold_core::error::CardfoldError;
use cardfold_core::types::{Folder, LibraryOverview};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DeletedResponse;
use crate::error::ApiResult;
use crate::middleware::UserId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateFolderForm {
    #[serde(default)]
    pub folder_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateFolderResponse {
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<Folder>,
}

/// Folders with their cards, plus uncategorized cards.
/// GET /my-flashcards
pub async fn my_flashcards(
    State(state): State<AppState>,
    user: UserId,
) -> ApiResult<Json<LibraryOverview>> {
    let overview = state.library.overview(user.as_str())?;
    Ok(Json(overview))
}

/// Create a folder. A blank name creates nothing.
/// POST /create-folder
pub async fn create_folder(
    State(state): State<AppState>,
    user: UserId,
    Form(form): Form<CreateFolderForm>,
) -> ApiResult<Json<CreateFolderResponse>> {
    let folder = state.library.create_folder(user.as_str(), &form.folder_name)?;
    Ok(Json(CreateFolderResponse {
        created: folder.is_some(),
        folder,
    }))
}

/// Delete a folder; its cards become uncategorized.
/// POST /delete-folder/:id
pub async fn delete_folder(
    State(state): State<AppState>,
    user: UserId,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    let folder_id = Uuid::parse_str(id.trim()).map_err(|_| CardfoldError::invalid_id("folder", &id))?;
    let deleted = state.library.delete_folder(user.as_str(), folder_id)?;
    Ok(Json(DeletedResponse { deleted }))
}
