//! Direct messages between users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alias::AliasMap;
use crate::handle::{Rename, normalize};
use crate::rename::RewriteHandles;

/// Direct message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: String,
    pub sender: String,
    pub recipient: String,
    pub body: String,
    /// Handles of the participants who have read the message.
    #[sqlx(json)]
    #[serde(default)]
    pub read_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Conversation this message belongs to.
    pub fn thread_key(&self, aliases: &AliasMap) -> String {
        thread_key(&self.sender, &self.recipient, aliases)
    }
}

impl RewriteHandles for Message {
    fn rewrite_handles(&self, rename: &Rename) -> Option<Self> {
        let sender = rename.apply(&self.sender);
        let recipient = rename.apply(&self.recipient);
        let read_by = rename.apply_list(&self.read_by);
        if sender.is_none() && recipient.is_none() && read_by.is_none() {
            return None;
        }

        Some(Self {
            id: self.id.clone(),
            sender: sender.unwrap_or_else(|| self.sender.clone()),
            recipient: recipient.unwrap_or_else(|| self.recipient.clone()),
            body: self.body.clone(),
            read_by: read_by.unwrap_or_else(|| self.read_by.clone()),
            created_at: self.created_at,
        })
    }
}

/// Key of the conversation between two handles.
///
/// Both handles are resolved to their current form first, so messages sent
/// before a rename land in the same thread as the ones sent after it.
pub fn thread_key(a: &str, b: &str, aliases: &AliasMap) -> String {
    let mut participants = [normalize(&aliases.resolve(a)), normalize(&aliases.resolve(b))];
    participants.sort();
    participants.join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_keeps_recipient() {
        let message = Message {
            id: "m1".into(),
            sender: "sadullah".into(),
            recipient: "vicdan".into(),
            body: "Merhaba".into(),
            read_by: vec!["Sadullah".into()],
            ..Default::default()
        };

        let rewritten = message
            .rewrite_handles(&Rename::new("sadullah", "sadullah_tg"))
            .unwrap();

        assert_eq!(rewritten.sender, "sadullah_tg");
        assert_eq!(rewritten.recipient, "vicdan");
        assert_eq!(rewritten.read_by, vec!["sadullah_tg".to_string()]);
    }

    #[test]
    fn test_thread_key_follows_rename() {
        let mut aliases = AliasMap::new();
        let before = thread_key("Sadullah", "vicdan", &aliases);
        assert_eq!(before, thread_key("vicdan", "sadullah", &aliases));

        aliases.record_rename(&Rename::new("sadullah", "sadullah_tg"));

        assert_eq!(
            thread_key("sadullah", "vicdan", &aliases),
            thread_key("vicdan", "sadullah_tg", &aliases)
        );
        assert_eq!(thread_key("vicdan", "sadullah", &aliases), "sadullah_tg:vicdan");
    }
}
