//! Handle rename propagation.
//!
//! A rename is applied to the local cache first ([`rewrite_collection`] over
//! every collection), then pushed to the backend in the background by
//! [`remote::dispatch`].
pub mod remote;

use std::sync::Arc;

use serde::Serialize;

use crate::content::Collection;
use crate::handle::Rename;

/// Typed visitor over the handle-shaped fields of a record.
pub trait RewriteHandles {
    /// Copy of `self` where every copy of the old handle is replaced by the
    /// new one. `None` when no field matched.
    fn rewrite_handles(&self, rename: &Rename) -> Option<Self>
    where
        Self: Sized;
}

/// Rewrite a cached collection.
///
/// Records without a match keep their original [`Arc`], so consumers can
/// skip them with [`Arc::ptr_eq`]. Returns the new collection and the number
/// of rewritten records.
pub fn rewrite_collection<T>(items: &[Arc<T>], rename: &Rename) -> (Vec<Arc<T>>, usize)
where
    T: RewriteHandles,
{
    let mut rewritten = 0;
    let items = items
        .iter()
        .map(|item| match item.rewrite_handles(rename) {
            Some(updated) => {
                rewritten += 1;
                Arc::new(updated)
            },
            None => Arc::clone(item),
        })
        .collect();

    (items, rewritten)
}

/// Number of records rewritten in the local cache, per collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalFanOut {
    pub listings: usize,
    pub posts: usize,
    pub messages: usize,
    pub appointments: usize,
    pub applications: usize,
}

impl LocalFanOut {
    pub fn get(&self, collection: Collection) -> usize {
        match collection {
            Collection::Listings => self.listings,
            Collection::Posts => self.posts,
            Collection::Messages => self.messages,
            Collection::Appointments => self.appointments,
            Collection::Applications => self.applications,
        }
    }

    pub fn total(&self) -> usize {
        Collection::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Listing;

    #[test]
    fn test_untouched_records_keep_their_arc() {
        let listings = vec![
            Arc::new(Listing {
                id: "1".into(),
                owner: "Sadullah".into(),
                ..Default::default()
            }),
            Arc::new(Listing {
                id: "2".into(),
                owner: "vicdan".into(),
                ..Default::default()
            }),
        ];

        let (rewritten, count) =
            rewrite_collection(&listings, &Rename::new("sadullah", "sadullah_tg"));

        assert_eq!(count, 1);
        assert_eq!(rewritten[0].owner, "sadullah_tg");
        assert!(!Arc::ptr_eq(&rewritten[0], &listings[0]));
        assert!(Arc::ptr_eq(&rewritten[1], &listings[1]));
    }
}
