//! Get a profile by handle.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::user::User;
use crate::{AppState, ServerError};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Handle as requested.
    pub requested: String,
    #[serde(flatten)]
    pub user: User,
}

pub async fn handler(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Response>, ServerError> {
    let client = state.profiles.client().read().await;
    let user = client.find_user(&handle).cloned().ok_or(ServerError::UserNotFound)?;

    Ok(Json(Response {
        requested: handle,
        user,
    }))
}
