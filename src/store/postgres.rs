//! PostgreSQL implementation of the backend port.
//!
//! The hosted backend exposes its relational tables over the PostgreSQL
//! protocol. Identifiers may be `uuid` or `text` on the backend side, they
//! are always exchanged as text.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgPoolOptions, PgQueryResult};

use crate::config::Postgres;
use crate::content::{Application, Appointment, HandleColumn, Listing, Message, Post};
use crate::error::{Result, ServerError};
use crate::handle::Rename;
use crate::store::RemoteStore;
use crate::user::User;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "postgres";
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// PostgreSQL backend.
#[derive(Clone)]
pub struct PgRemoteStore {
    pool: PgPool,
}

impl PgRemoteStore {
    /// Create a new [`PgRemoteStore`] over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Init database connections.
    pub async fn connect(config: &Postgres) -> Result<Self> {
        let username = config.username.as_deref().unwrap_or(DEFAULT_CREDENTIALS);
        let password = config.password.as_deref().unwrap_or(DEFAULT_CREDENTIALS);
        let db = config.database.as_deref().unwrap_or(DEFAULT_DATABASE_NAME);
        let hostname = &config.address;

        let addr = format!("postgres://{username}:{password}@{hostname}/{db}");
        let postgres = PgPoolOptions::new()
            .max_connections(config.pool_size.unwrap_or(DEFAULT_POOL_SIZE))
            .connect(&addr)
            .await?;

        tracing::info!(%hostname, %db, "postgres connected");

        Ok(Self::new(postgres))
    }
}

#[async_trait]
impl RemoteStore for PgRemoteStore {
    async fn fetch_users(&self) -> Result<Vec<User>> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT id::text AS id, username, avatar, bio, city, state, created_at
            FROM profiles
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn fetch_listings(&self, limit: i64) -> Result<Vec<Listing>> {
        Ok(sqlx::query_as::<_, Listing>(
            r#"
            SELECT
                id::text AS id, name, category, city, state,
                COALESCE(owner, '') AS owner, created_at
            FROM business_listings
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn fetch_posts(&self, limit: i64) -> Result<Vec<Post>> {
        Ok(sqlx::query_as::<_, Post>(
            r#"
            SELECT
                id::text AS id, author, content, image,
                COALESCE(comments, '[]'::jsonb) AS comments, created_at
            FROM posts
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn fetch_messages(&self, limit: i64) -> Result<Vec<Message>> {
        Ok(sqlx::query_as::<_, Message>(
            r#"
            SELECT
                id::text AS id, sender, recipient, body,
                COALESCE(read_by, '[]'::jsonb) AS read_by, created_at
            FROM messages
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn fetch_appointments(&self, limit: i64) -> Result<Vec<Appointment>> {
        Ok(sqlx::query_as::<_, Appointment>(
            r#"
            SELECT
                id::text AS id, business_id::text AS business_id, requester,
                requested_for, note, status, created_at
            FROM appointments
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn fetch_applications(&self, limit: i64) -> Result<Vec<Application>> {
        Ok(sqlx::query_as::<_, Application>(
            r#"
            SELECT
                id::text AS id, business_name, applicant,
                COALESCE(owner, '') AS owner, status, created_at
            FROM business_applications
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let result: PgQueryResult = sqlx::query(
            r#"
            UPDATE profiles
            SET
                username = $2,
                avatar = $3,
                bio = $4,
                city = $5,
                state = $6
            WHERE id::text = $1
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.avatar)
        .bind(&user.bio)
        .bind(&user.city)
        .bind(&user.state)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::UserNotFound);
        }

        Ok(())
    }

    async fn update_handle_column(
        &self,
        column: HandleColumn,
        old: &str,
        new: &str,
    ) -> Result<u64> {
        let rename = Rename::new(old, new);
        if rename.old_key().is_empty() {
            return Ok(0);
        }

        let table = column.collection().table();
        let column = column.column();

        // `lower` and `trim` depend on the database collation, matching is
        // done here with the same rule as the cached rewrite.
        let rows: Vec<(String, String)> = sqlx::query_as(&format!(
            "SELECT id::text, {column} FROM {table} WHERE {column} IS NOT NULL"
        ))
        .fetch_all(&self.pool)
        .await?;

        let ids = matching_ids(rows, &rename);
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(&format!(
            "UPDATE {table} SET {column} = $2 WHERE id::text = ANY($1)"
        ))
        .bind(&ids)
        .bind(rename.new_handle())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn save_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE posts
            SET author = $2, comments = $3
            WHERE id::text = $1
            "#,
        )
        .bind(&post.id)
        .bind(&post.author)
        .bind(sqlx::types::Json(&post.comments))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_message(&self, message: &Message) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE messages
            SET sender = $2, recipient = $3, read_by = $4
            WHERE id::text = $1
            "#,
        )
        .bind(&message.id)
        .bind(&message.sender)
        .bind(&message.recipient)
        .bind(sqlx::types::Json(&message.read_by))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Ids of the `(id, handle)` rows holding the old handle.
fn matching_ids(rows: Vec<(String, String)>, rename: &Rename) -> Vec<String> {
    rows.into_iter()
        .filter(|(_, handle)| rename.matches(handle))
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(handles: &[&str]) -> Vec<(String, String)> {
        handles
            .iter()
            .enumerate()
            .map(|(i, handle)| (i.to_string(), handle.to_string()))
            .collect()
    }

    #[test]
    fn test_matching_ids_unicode_and_whitespace() {
        let rename = Rename::new("Ayşe", "ayse_b");

        let ids = matching_ids(
            rows(&["AYŞE", "\tayşe\n", "ayşe\u{a0}", "ayşegul", "ayse", ""]),
            &rename,
        );
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_matching_ids_empty_old_handle() {
        let rename = Rename::new("  ", "someone");
        assert!(matching_ids(rows(&["", " "]), &rename).is_empty());
    }
}
