//! Port between the client state and the hosted backend.
pub mod mem;
pub mod postgres;

use async_trait::async_trait;

use crate::content::{Appointment, Application, HandleColumn, Listing, Message, Post};
use crate::error::Result;
use crate::user::User;

pub use mem::MemoryRemoteStore;
pub use postgres::PgRemoteStore;

/// Port for backend persistence operations.
///
/// Fetches return at most `limit` rows, newest first.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every identity.
    async fn fetch_users(&self) -> Result<Vec<User>>;

    async fn fetch_listings(&self, limit: i64) -> Result<Vec<Listing>>;

    async fn fetch_posts(&self, limit: i64) -> Result<Vec<Post>>;

    async fn fetch_messages(&self, limit: i64) -> Result<Vec<Message>>;

    async fn fetch_appointments(&self, limit: i64) -> Result<Vec<Appointment>>;

    async fn fetch_applications(&self, limit: i64) -> Result<Vec<Application>>;

    /// Update the profile fields of an existing identity.
    async fn update_user(&self, user: &User) -> Result<()>;

    /// Set `column` to `new` on every row where it holds `old`, compared
    /// trimmed and case-insensitively. Returns the number of updated rows.
    async fn update_handle_column(
        &self,
        column: HandleColumn,
        old: &str,
        new: &str,
    ) -> Result<u64>;

    /// Write back the author and embedded comments of a post.
    async fn save_post(&self, post: &Post) -> Result<()>;

    /// Write back the participants and read-by list of a message.
    async fn save_message(&self, message: &Message) -> Result<()>;
}
