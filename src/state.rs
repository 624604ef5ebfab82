//! Client state container.
//!
//! Owns the roster, the alias map and the cached collections. The rename
//! routine is the only code rewriting handle fields of cached records.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::alias::AliasMap;
use crate::content::{Application, Appointment, Listing, Message, Post, message};
use crate::error::Result;
use crate::handle::Rename;
use crate::rename::{LocalFanOut, rewrite_collection};
use crate::store::RemoteStore;
use crate::user::{Roster, User};

/// Cached view of the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientState {
    pub roster: Roster,
    pub aliases: AliasMap,
    pub listings: Vec<Arc<Listing>>,
    pub posts: Vec<Arc<Post>>,
    pub messages: Vec<Arc<Message>>,
    pub appointments: Vec<Arc<Appointment>>,
    pub applications: Vec<Arc<Application>>,
}

impl ClientState {
    /// Record the alias then rewrite every cached copy of the old handle.
    pub fn apply_rename(&mut self, rename: &Rename) -> LocalFanOut {
        self.aliases.record_rename(rename);

        let mut fan_out = LocalFanOut::default();
        (self.listings, fan_out.listings) = rewrite_collection(&self.listings, rename);
        (self.posts, fan_out.posts) = rewrite_collection(&self.posts, rename);
        (self.messages, fan_out.messages) = rewrite_collection(&self.messages, rename);
        (self.appointments, fan_out.appointments) =
            rewrite_collection(&self.appointments, rename);
        (self.applications, fan_out.applications) =
            rewrite_collection(&self.applications, rename);

        fan_out
    }

    /// Current form of `handle`.
    ///
    /// A handle owned by a live identity resolves to itself, even if an
    /// older alias is keyed by it.
    pub fn resolve(&self, handle: &str) -> String {
        match self.roster.find_live(handle) {
            Some(user) => user.username.clone(),
            None => self.aliases.resolve(handle),
        }
    }

    /// Identity currently behind `handle`.
    pub fn find_user(&self, handle: &str) -> Option<&User> {
        self.roster.find_by_handle(handle, &self.aliases)
    }

    /// Messages exchanged between two handles, oldest first.
    pub fn thread(&self, a: &str, b: &str) -> Vec<Arc<Message>> {
        let key = message::thread_key(a, b, &self.aliases);
        let mut messages: Vec<Arc<Message>> = self
            .messages
            .iter()
            .filter(|m| m.thread_key(&self.aliases) == key)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        messages
    }

    /// Replace cached data with fresh backend data, keeping aliases.
    pub async fn refresh(&mut self, store: &dyn RemoteStore, page_size: i64) -> Result<()> {
        self.roster = Roster::new(store.fetch_users().await?);
        self.listings = wrap(store.fetch_listings(page_size).await?);
        self.posts = wrap(store.fetch_posts(page_size).await?);
        self.messages = wrap(store.fetch_messages(page_size).await?);
        self.appointments = wrap(store.fetch_appointments(page_size).await?);
        self.applications = wrap(store.fetch_applications(page_size).await?);

        tracing::info!(
            users = self.roster.len(),
            listings = self.listings.len(),
            posts = self.posts.len(),
            messages = self.messages.len(),
            "client state refreshed"
        );

        Ok(())
    }

    /// Read a snapshot written by [`ClientState::save`].
    ///
    /// Returns `None` if the file does not exist.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Write the whole state, aliases included, as JSON.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec(self)?;
        tokio::fs::write(path, bytes).await?;

        tracing::debug!(path = %path.display(), "client state saved");
        Ok(())
    }
}

fn wrap<T>(rows: Vec<T>) -> Vec<Arc<T>> {
    rows.into_iter().map(Arc::new).collect()
}
