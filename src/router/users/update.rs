//! Update a profile.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use crate::rename::LocalFanOut;
use crate::router::Valid;
use crate::user::{ProfileEdit, User};
use crate::{AppState, ServerError};

#[derive(Debug, Serialize)]
pub struct Response {
    pub user: User,
    /// Cached records rewritten by a handle change.
    pub rewritten: LocalFanOut,
}

/// Backend propagation keeps running after the response is sent.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Valid(body): Valid<ProfileEdit>,
) -> Result<Json<Response>, ServerError> {
    let update = state.profiles.update_profile(&user_id, body).await?;
    if let Some(fan_out) = update.fan_out {
        state.profiles.detach(fan_out).await;
    }

    Ok(Json(Response {
        user: update.user,
        rewritten: update.local,
    }))
}
