//! Business applications, reviewed from the back-office.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::handle::Rename;
use crate::rename::RewriteHandles;

/// Request to list (or claim) a business.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: String,
    pub business_name: String,
    pub applicant: String,
    pub owner: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl RewriteHandles for Application {
    fn rewrite_handles(&self, rename: &Rename) -> Option<Self> {
        let applicant = rename.apply(&self.applicant);
        let owner = rename.apply(&self.owner);
        if applicant.is_none() && owner.is_none() {
            return None;
        }

        Some(Self {
            applicant: applicant.unwrap_or_else(|| self.applicant.clone()),
            owner: owner.unwrap_or_else(|| self.owner.clone()),
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_one_side() {
        let application = Application {
            id: "app".into(),
            applicant: "Sadullah".into(),
            owner: "vicdan".into(),
            status: "pending".into(),
            ..Default::default()
        };

        let rewritten = application
            .rewrite_handles(&Rename::new("sadullah", "sadullah_tg"))
            .unwrap();
        assert_eq!(rewritten.applicant, "sadullah_tg");
        assert_eq!(rewritten.owner, "vicdan");
    }
}
