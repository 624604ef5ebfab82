//! Business listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::handle::Rename;
use crate::rename::RewriteHandles;

/// A business listed on the directory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: String,
    pub name: String,
    pub category: String,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Handle of the owning user, empty when unclaimed.
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

impl RewriteHandles for Listing {
    fn rewrite_handles(&self, rename: &Rename) -> Option<Self> {
        let owner = rename.apply(&self.owner)?;
        Some(Self {
            owner,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclaimed_listing_is_untouched() {
        let listing = Listing {
            id: "1".into(),
            name: "Simit Sarayı".into(),
            ..Default::default()
        };

        assert_eq!(listing.rewrite_handles(&Rename::new("", "someone")), None);
        assert_eq!(listing.rewrite_handles(&Rename::new("sadullah", "sadullah_tg")), None);
    }
}
