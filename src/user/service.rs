use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use validator::Validate;

use crate::error::{Result, ServerError};
use crate::handle::{Rename, validate_handle};
use crate::rename::LocalFanOut;
use crate::rename::remote::{self, FanOutHandle};
use crate::state::ClientState;
use crate::store::RemoteStore;
use crate::telemetry;
use crate::user::User;

/// Profile edit submitted by a user. Missing fields are left unchanged,
/// empty strings clear optional fields.
#[derive(Debug, Default, Clone, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEdit {
    #[serde(alias = "handle")]
    #[validate(length(max = 50, message = "Username must be at most 50 characters long."))]
    pub username: Option<String>,
    #[validate(url(message = "Avatar must be a valid URL."))]
    pub avatar: Option<String>,
    #[validate(length(max = 255, message = "Biography must be 0 to 255 characters long."))]
    pub bio: Option<String>,
    #[validate(length(max = 80, message = "City must be at most 80 characters long."))]
    pub city: Option<String>,
    #[validate(length(max = 80, message = "State must be at most 80 characters long."))]
    pub state: Option<String>,
}

/// Saved profile.
#[derive(Debug)]
pub struct ProfileUpdate {
    pub user: User,
    /// Cached records rewritten by a handle change.
    pub local: LocalFanOut,
    /// Backend propagation of a handle change, still running.
    pub fan_out: Option<FanOutHandle>,
}

/// Profile manager.
#[derive(Clone)]
pub struct ProfileService {
    client: Arc<RwLock<ClientState>>,
    store: Arc<dyn RemoteStore>,
    page_size: i64,
    state_path: Option<PathBuf>,
    /// Detached fan-outs, joined on shutdown.
    pending: Arc<Mutex<Vec<FanOutHandle>>>,
}

impl ProfileService {
    /// Create a new [`ProfileService`].
    pub fn new(
        client: ClientState,
        store: Arc<dyn RemoteStore>,
        page_size: i64,
    ) -> Self {
        Self {
            client: Arc::new(RwLock::new(client)),
            store,
            page_size,
            state_path: None,
            pending: Arc::default(),
        }
    }

    /// Persist the client state to `path` after every handle change.
    pub fn persist_to(mut self, path: PathBuf) -> Self {
        self.state_path = Some(path);
        self
    }

    /// Shared client state.
    pub fn client(&self) -> &Arc<RwLock<ClientState>> {
        &self.client
    }

    /// Keep a fan-out running in the background until [`Self::drain`].
    pub async fn detach(&self, fan_out: FanOutHandle) {
        let mut pending = self.pending.lock().await;
        pending.retain(|handle| !handle.is_finished());
        pending.push(fan_out);
    }

    /// Wait for detached fan-outs, at most `limit`.
    ///
    /// Returns `false` if some were still running when `limit` elapsed.
    pub async fn drain(&self, limit: Duration) -> bool {
        let pending = std::mem::take(&mut *self.pending.lock().await);
        if pending.is_empty() {
            return true;
        }

        let joined = async {
            for fan_out in pending {
                let report = fan_out.join().await;
                if !report.succeeded() {
                    tracing::warn!(
                        failed = report.outcomes.iter().filter(|o| !o.succeeded()).count(),
                        "rename fan-out completed with failures"
                    );
                }
            }
        };

        match tokio::time::timeout(limit, joined).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(?limit, "rename fan-out still running at shutdown");
                false
            },
        }
    }

    /// Validate and save a profile edit.
    ///
    /// The identity record is written to the backend first. On success, a
    /// handle change is applied to the cached collections and propagated to
    /// the backend in the background; the returned [`FanOutHandle`] can be
    /// dropped without cancelling it.
    ///
    /// # Errors
    ///
    /// Returns `Err` before anything is written if a field is invalid, the
    /// handle is empty or taken, or the user is unknown. Returns `Err` if
    /// the backend rejects the identity write, the cache is then untouched.
    pub async fn update_profile(&self, id: &str, edit: ProfileEdit) -> Result<ProfileUpdate> {
        edit.validate()?;

        let mut client = self.client.write().await;
        let current = client
            .roster
            .find_by_id(id)
            .cloned()
            .ok_or(ServerError::UserNotFound)?;

        let mut user = current.clone();
        let mut rename = None;
        if let Some(username) = edit.username.as_deref() {
            let username = validate_handle(username, client.roster.others(id))?;
            if username != current.username {
                rename = Some(Rename::new(&current.username, &username));
            }
            user.username = username;
        }
        if let Some(avatar) = edit.avatar {
            user.avatar = non_empty(avatar);
        }
        if let Some(bio) = edit.bio {
            user.bio = non_empty(bio);
        }
        if let Some(city) = edit.city {
            user.city = non_empty(city);
        }
        if let Some(state) = edit.state {
            user.state = non_empty(state);
        }

        self.store.update_user(&user).await?;
        client.roster.upsert(user.clone());

        let Some(rename) = rename else {
            tracing::debug!(user_id = %id, "profile updated");
            return Ok(ProfileUpdate {
                user,
                local: LocalFanOut::default(),
                fan_out: None,
            });
        };

        let local = client.apply_rename(&rename);
        telemetry::record_rename();
        tracing::info!(
            user_id = %id,
            %rename,
            rewritten = local.total(),
            "handle renamed"
        );

        let fan_out = remote::dispatch(Arc::clone(&self.store), rename, self.page_size);

        let snapshot = self.state_path.as_ref().map(|path| (path.clone(), client.clone()));
        drop(client);

        if let Some((path, snapshot)) = snapshot {
            if let Err(err) = snapshot.save(&path).await {
                tracing::warn!(error = %err, "client state not persisted");
            }
        }

        Ok(ProfileUpdate {
            user,
            local,
            fan_out: Some(fan_out),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
