//! In-process backend, used when no PostgreSQL instance is configured.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::content::{
    Application, Appointment, Collection, HandleColumn, Listing, Message, Post,
};
use crate::error::{Result, ServerError};
use crate::handle::Rename;
use crate::store::RemoteStore;
use crate::user::User;

/// Backend tables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tables {
    pub users: Vec<User>,
    pub listings: Vec<Listing>,
    pub posts: Vec<Post>,
    pub messages: Vec<Message>,
    pub appointments: Vec<Appointment>,
    pub applications: Vec<Application>,
}

#[derive(Default)]
struct Failures {
    profiles: bool,
    collections: HashSet<Collection>,
}

/// Memory backend.
#[derive(Default)]
pub struct MemoryRemoteStore {
    tables: Mutex<Tables>,
    failures: Mutex<Failures>,
}

impl MemoryRemoteStore {
    /// Create a new [`MemoryRemoteStore`] holding `tables`.
    pub fn new(tables: Tables) -> Self {
        Self {
            tables: Mutex::new(tables),
            failures: Mutex::default(),
        }
    }

    /// Make every request touching `collection` fail.
    pub async fn fail(&self, collection: Collection) {
        self.failures.lock().await.collections.insert(collection);
    }

    /// Make identity writes fail.
    pub async fn fail_profiles(&self) {
        self.failures.lock().await.profiles = true;
    }

    /// Copy of the current tables.
    pub async fn tables(&self) -> Tables {
        self.tables.lock().await.clone()
    }

    async fn check(&self, collection: Collection) -> Result<()> {
        if self.failures.lock().await.collections.contains(&collection) {
            return Err(ServerError::Store {
                details: format!("{collection} unavailable"),
            });
        }
        Ok(())
    }
}

fn newest<T: Clone>(
    rows: &[T],
    limit: i64,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut rows = rows.to_vec();
    rows.sort_by_key(|row| std::cmp::Reverse(created_at(row)));
    rows.truncate(usize::try_from(limit).unwrap_or(0));
    rows
}

fn replace(field: &mut String, rename: &Rename) -> u64 {
    match rename.apply(field) {
        Some(value) => {
            *field = value;
            1
        },
        None => 0,
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn fetch_users(&self) -> Result<Vec<User>> {
        Ok(self.tables.lock().await.users.clone())
    }

    async fn fetch_listings(&self, limit: i64) -> Result<Vec<Listing>> {
        self.check(Collection::Listings).await?;
        Ok(newest(&self.tables.lock().await.listings, limit, |r| r.created_at))
    }

    async fn fetch_posts(&self, limit: i64) -> Result<Vec<Post>> {
        self.check(Collection::Posts).await?;
        Ok(newest(&self.tables.lock().await.posts, limit, |r| r.created_at))
    }

    async fn fetch_messages(&self, limit: i64) -> Result<Vec<Message>> {
        self.check(Collection::Messages).await?;
        Ok(newest(&self.tables.lock().await.messages, limit, |r| r.created_at))
    }

    async fn fetch_appointments(&self, limit: i64) -> Result<Vec<Appointment>> {
        self.check(Collection::Appointments).await?;
        Ok(newest(&self.tables.lock().await.appointments, limit, |r| r.created_at))
    }

    async fn fetch_applications(&self, limit: i64) -> Result<Vec<Application>> {
        self.check(Collection::Applications).await?;
        Ok(newest(&self.tables.lock().await.applications, limit, |r| r.created_at))
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        if self.failures.lock().await.profiles {
            return Err(ServerError::Store {
                details: "profiles unavailable".into(),
            });
        }

        let mut tables = self.tables.lock().await;
        match tables.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            },
            None => Err(ServerError::UserNotFound),
        }
    }

    async fn update_handle_column(
        &self,
        column: HandleColumn,
        old: &str,
        new: &str,
    ) -> Result<u64> {
        self.check(column.collection()).await?;

        let rename = Rename::new(old, new);
        let mut tables = self.tables.lock().await;
        let rows: u64 = match column {
            HandleColumn::ListingOwner => tables
                .listings
                .iter_mut()
                .map(|r| replace(&mut r.owner, &rename))
                .sum(),
            HandleColumn::PostAuthor => tables
                .posts
                .iter_mut()
                .map(|r| replace(&mut r.author, &rename))
                .sum(),
            HandleColumn::MessageSender => tables
                .messages
                .iter_mut()
                .map(|r| replace(&mut r.sender, &rename))
                .sum(),
            HandleColumn::MessageRecipient => tables
                .messages
                .iter_mut()
                .map(|r| replace(&mut r.recipient, &rename))
                .sum(),
            HandleColumn::AppointmentRequester => tables
                .appointments
                .iter_mut()
                .map(|r| replace(&mut r.requester, &rename))
                .sum(),
            HandleColumn::ApplicationApplicant => tables
                .applications
                .iter_mut()
                .map(|r| replace(&mut r.applicant, &rename))
                .sum(),
            HandleColumn::ApplicationOwner => tables
                .applications
                .iter_mut()
                .map(|r| replace(&mut r.owner, &rename))
                .sum(),
        };

        Ok(rows)
    }

    async fn save_post(&self, post: &Post) -> Result<()> {
        self.check(Collection::Posts).await?;

        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.posts.iter_mut().find(|p| p.id == post.id) {
            existing.author.clone_from(&post.author);
            existing.comments.clone_from(&post.comments);
        }
        Ok(())
    }

    async fn save_message(&self, message: &Message) -> Result<()> {
        self.check(Collection::Messages).await?;

        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.messages.iter_mut().find(|m| m.id == message.id) {
            existing.sender.clone_from(&message.sender);
            existing.recipient.clone_from(&message.recipient);
            existing.read_by.clone_from(&message.read_by);
        }
        Ok(())
    }
}
