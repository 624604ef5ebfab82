//! Social feed posts with their comment threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::handle::Rename;
use crate::rename::RewriteHandles;

/// Post of the content feed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub author: String,
    pub content: String,
    pub image: Option<String>,
    #[sqlx(json)]
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

/// Comment embedded in a [`Post`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub replies: Vec<Reply>,
    pub created_at: DateTime<Utc>,
}

/// Reply embedded in a [`Comment`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl RewriteHandles for Reply {
    fn rewrite_handles(&self, rename: &Rename) -> Option<Self> {
        let author = rename.apply(&self.author)?;
        Some(Self {
            author,
            ..self.clone()
        })
    }
}

impl RewriteHandles for Comment {
    fn rewrite_handles(&self, rename: &Rename) -> Option<Self> {
        let author = rename.apply(&self.author);
        let replies = rewrite_nested(&self.replies, rename);
        if author.is_none() && replies.is_none() {
            return None;
        }

        Some(Self {
            id: self.id.clone(),
            author: author.unwrap_or_else(|| self.author.clone()),
            text: self.text.clone(),
            replies: replies.unwrap_or_else(|| self.replies.clone()),
            created_at: self.created_at,
        })
    }
}

impl RewriteHandles for Post {
    fn rewrite_handles(&self, rename: &Rename) -> Option<Self> {
        let author = rename.apply(&self.author);
        let comments = rewrite_nested(&self.comments, rename);
        if author.is_none() && comments.is_none() {
            return None;
        }

        Some(Self {
            id: self.id.clone(),
            author: author.unwrap_or_else(|| self.author.clone()),
            content: self.content.clone(),
            image: self.image.clone(),
            comments: comments.unwrap_or_else(|| self.comments.clone()),
            created_at: self.created_at,
        })
    }
}

/// Rewrite an embedded list, `None` if no element changed.
fn rewrite_nested<T>(items: &[T], rename: &Rename) -> Option<Vec<T>>
where
    T: RewriteHandles + Clone,
{
    let mut changed = false;
    let items = items
        .iter()
        .map(|item| match item.rewrite_handles(rename) {
            Some(rewritten) => {
                changed = true;
                rewritten
            },
            None => item.clone(),
        })
        .collect();

    changed.then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(author: &str, replies: Vec<Reply>) -> Comment {
        Comment {
            id: format!("c-{author}"),
            author: author.into(),
            text: "Harika!".into(),
            replies,
            ..Default::default()
        }
    }

    fn reply(author: &str) -> Reply {
        Reply {
            id: format!("r-{author}"),
            author: author.into(),
            text: "Katılıyorum".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_nested_rewrite() {
        let post = Post {
            id: "p1".into(),
            author: "someone".into(),
            content: "Best baklava in NJ".into(),
            comments: vec![
                comment("oldname", vec![reply("oldname"), reply("vicdan")]),
                comment("other", vec![]),
            ],
            ..Default::default()
        };

        let rewritten = post
            .rewrite_handles(&Rename::new("oldname", "newname"))
            .unwrap();

        assert_eq!(rewritten.author, "someone");
        assert_eq!(rewritten.comments[0].author, "newname");
        assert_eq!(rewritten.comments[0].replies[0].author, "newname");
        assert_eq!(rewritten.comments[0].replies[1].author, "vicdan");
        assert_eq!(rewritten.comments[1], post.comments[1]);
    }

    #[test]
    fn test_reply_only_match() {
        let post = Post {
            id: "p2".into(),
            author: "vicdan".into(),
            comments: vec![comment("other", vec![reply(" OldName ")])],
            ..Default::default()
        };

        let rewritten = post
            .rewrite_handles(&Rename::new("oldname", "newname"))
            .unwrap();
        assert_eq!(rewritten.comments[0].author, "other");
        assert_eq!(rewritten.comments[0].replies[0].author, "newname");
    }

    #[test]
    fn test_no_match() {
        let post = Post {
            id: "p3".into(),
            author: "oldnamexyz".into(),
            comments: vec![comment("other", vec![reply("vicdan")])],
            ..Default::default()
        };

        assert_eq!(post.rewrite_handles(&Rename::new("oldname", "newname")), None);
    }
}
