//! Users-related HTTP API.
mod get;
mod update;

use axum::Router;
use axum::routing::get;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /users/:HANDLE` goes to `get`, old handles included.
        // `PATCH /users/:ID` goes to `update`.
        .route("/{user}", get(get::handler).patch(update::handler))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use crate::AppState;
    use crate::config::Configuration;
    use crate::state::tests::scenario;
    use crate::store::MemoryRemoteStore;
    use crate::store::mem::Tables;
    use crate::user::ProfileService;

    /// Application serving the shared scenario, backed by memory.
    pub(crate) fn state() -> AppState {
        let client = scenario();
        let tables = Tables {
            users: client.roster.iter().cloned().collect(),
            listings: client.listings.iter().map(|l| (**l).clone()).collect(),
            posts: client.posts.iter().map(|p| (**p).clone()).collect(),
            messages: client.messages.iter().map(|m| (**m).clone()).collect(),
            appointments: client.appointments.iter().map(|a| (**a).clone()).collect(),
            applications: client.applications.iter().map(|a| (**a).clone()).collect(),
        };

        AppState {
            config: Arc::new(Configuration::default()),
            profiles: ProfileService::new(client, Arc::new(MemoryRemoteStore::new(tables)), 100),
            metrics: None,
        }
    }
}
