mod service;

pub use service::*;

use serde::{Deserialize, Serialize};

use crate::alias::AliasMap;
use crate::handle::same_identity;

/// User as saved on the backend `profiles` table.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct User {
    /// Opaque identifier assigned by the backend.
    pub id: String,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Every identity known to the client.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    users: Vec<User>,
}

impl Roster {
    /// Create a new [`Roster`].
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Find a user using `id` field.
    pub fn find_by_id(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Identity owning `handle` right now, aliases ignored.
    pub fn find_live(&self, handle: &str) -> Option<&User> {
        if handle.trim().is_empty() {
            return None;
        }

        self.users
            .iter()
            .find(|u| same_identity(&u.username, handle))
    }

    /// Find the identity currently behind `handle`, following renames.
    ///
    /// A live identity owning `handle` wins over an alias keyed by it.
    pub fn find_by_handle(&self, handle: &str, aliases: &AliasMap) -> Option<&User> {
        self.find_live(handle)
            .or_else(|| self.find_live(&aliases.resolve(handle)))
    }

    /// Handles of every identity except `id`.
    pub fn others<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> {
        self.users
            .iter()
            .filter(move |u| u.id != id)
            .map(|u| u.username.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    /// Handles of every identity.
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(|u| u.username.as_str())
    }

    /// Insert or replace a user by `id`.
    pub fn upsert(&mut self, user: User) {
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => self.users.push(user),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Rename;

    fn user(id: &str, username: &str) -> User {
        User {
            id: id.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_find_by_handle_follows_alias() {
        let roster = Roster::new(vec![user("1", "sadullah_tg"), user("2", "vicdan")]);
        let mut aliases = AliasMap::new();
        aliases.record_rename(&Rename::new("sadullah", "sadullah_tg"));

        assert_eq!(roster.find_by_handle(" Sadullah", &aliases).map(|u| u.id.as_str()), Some("1"));
        assert_eq!(roster.find_by_handle("VICDAN", &aliases).map(|u| u.id.as_str()), Some("2"));
        assert!(roster.find_by_handle("", &aliases).is_none());
        assert!(roster.find_by_handle("ayse", &aliases).is_none());
    }

    #[test]
    fn test_live_handle_wins_over_alias() {
        let mut aliases = AliasMap::new();
        aliases.record_rename(&Rename::new("ayse", "ayse_b"));
        // `ayse` registered again without going through a rename.
        let roster = Roster::new(vec![user("1", "ayse_b"), user("2", "Ayse")]);

        assert_eq!(roster.find_by_handle(" AYSE", &aliases).map(|u| u.id.as_str()), Some("2"));
        assert_eq!(roster.find_by_handle("ayse_b", &aliases).map(|u| u.id.as_str()), Some("1"));
    }

    #[test]
    fn test_upsert() {
        let mut roster = Roster::new(vec![user("1", "sadullah")]);
        roster.upsert(user("1", "sadullah_tg"));
        roster.upsert(user("2", "vicdan"));

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.find_by_id("1").map(|u| u.username.as_str()), Some("sadullah_tg"));
    }
}
