//! Handle resolution.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub handle: String,
    pub current: String,
}

/// `GET /aliases/{handle}`.
pub async fn handler(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Json<Response> {
    let current = state.profiles.client().read().await.resolve(&handle);
    Json(Response { handle, current })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;

    use super::*;
    use crate::*;

    #[tokio::test]
    async fn test_resolve_alias() {
        let state = router::users::tests::state();
        let edit = user::ProfileEdit {
            username: Some("sadullah_tg".into()),
            ..Default::default()
        };
        state.profiles.update_profile("u1", edit).await.unwrap();

        let response = make_request(
            app(state),
            Method::GET,
            "/aliases/Sadullah",
            String::default(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.current, "sadullah_tg");
    }
}
