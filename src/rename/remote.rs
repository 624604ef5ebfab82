//! Background propagation of a rename to the backend.
//!
//! Each collection is handled by its own task. A failing collection never
//! stops the others, failures are logged and counted but not retried.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::content::{Collection, HandleColumn};
use crate::error::ServerError;
use crate::handle::Rename;
use crate::rename::RewriteHandles;
use crate::store::RemoteStore;
use crate::telemetry;

/// Result of the propagation for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOutcome {
    pub collection: Collection,
    /// Rows rewritten on the backend.
    pub rows: u64,
    /// One entry per failed backend request.
    pub errors: Vec<String>,
}

impl CollectionOutcome {
    fn new(collection: Collection) -> Self {
        Self {
            collection,
            rows: 0,
            errors: Vec::new(),
        }
    }

    /// Whether every backend request of this collection succeeded.
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(&mut self, step: &str, err: &ServerError) {
        tracing::warn!(
            collection = %self.collection,
            step,
            error = %err,
            "rename fan-out failed"
        );
        telemetry::record_fanout_failure(self.collection);
        self.errors.push(format!("{step}: {err}"));
    }
}

/// Outcome of a whole fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub outcomes: Vec<CollectionOutcome>,
}

impl FanOutReport {
    pub fn get(&self, collection: Collection) -> Option<&CollectionOutcome> {
        self.outcomes.iter().find(|o| o.collection == collection)
    }

    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(CollectionOutcome::succeeded)
    }
}

/// Running fan-out.
///
/// Dropping it leaves the tasks running in the background.
#[derive(Debug)]
pub struct FanOutHandle {
    tasks: Vec<(Collection, JoinHandle<CollectionOutcome>)>,
}

impl FanOutHandle {
    /// Whether every collection task has completed.
    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|(_, task)| task.is_finished())
    }

    /// Wait for every collection.
    pub async fn join(self) -> FanOutReport {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (collection, task) in self.tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(%collection, error = %err, "rename fan-out task aborted");
                    CollectionOutcome {
                        collection,
                        rows: 0,
                        errors: vec![err.to_string()],
                    }
                },
            };
            outcomes.push(outcome);
        }
        FanOutReport { outcomes }
    }
}

/// Spawn one propagation task per collection.
///
/// Must be called from within a tokio runtime. `page_size` bounds how many
/// recent posts and messages are fetched to rewrite their embedded handles.
pub fn dispatch(store: Arc<dyn RemoteStore>, rename: Rename, page_size: i64) -> FanOutHandle {
    let tasks = Collection::ALL
        .into_iter()
        .map(|collection| {
            let span = tracing::info_span!("fanout", %collection, rename = %rename);
            let task = tokio::spawn(
                propagate(Arc::clone(&store), collection, rename.clone(), page_size)
                    .instrument(span),
            );
            (collection, task)
        })
        .collect();

    FanOutHandle { tasks }
}

async fn propagate(
    store: Arc<dyn RemoteStore>,
    collection: Collection,
    rename: Rename,
    page_size: i64,
) -> CollectionOutcome {
    let mut outcome = CollectionOutcome::new(collection);

    for column in collection.handle_columns() {
        update_column(store.as_ref(), *column, &rename, &mut outcome).await;
    }

    match collection {
        Collection::Posts => rewrite_posts(store.as_ref(), &rename, page_size, &mut outcome).await,
        Collection::Messages => {
            rewrite_messages(store.as_ref(), &rename, page_size, &mut outcome).await
        },
        _ => {},
    }

    telemetry::record_fanout_rows(collection, outcome.rows);
    if outcome.succeeded() {
        tracing::debug!(rows = outcome.rows, "rename propagated");
    }

    outcome
}

async fn update_column(
    store: &dyn RemoteStore,
    column: HandleColumn,
    rename: &Rename,
    outcome: &mut CollectionOutcome,
) {
    match store
        .update_handle_column(column, rename.old(), rename.new_handle())
        .await
    {
        Ok(rows) => outcome.rows += rows,
        Err(err) => outcome.fail(column.column(), &err),
    }
}

async fn rewrite_posts(
    store: &dyn RemoteStore,
    rename: &Rename,
    page_size: i64,
    outcome: &mut CollectionOutcome,
) {
    let posts = match store.fetch_posts(page_size).await {
        Ok(posts) => posts,
        Err(err) => return outcome.fail("comments", &err),
    };

    for post in posts.iter().filter_map(|p| p.rewrite_handles(rename)) {
        match store.save_post(&post).await {
            Ok(()) => outcome.rows += 1,
            Err(err) => outcome.fail("comments", &err),
        }
    }
}

async fn rewrite_messages(
    store: &dyn RemoteStore,
    rename: &Rename,
    page_size: i64,
    outcome: &mut CollectionOutcome,
) {
    let messages = match store.fetch_messages(page_size).await {
        Ok(messages) => messages,
        Err(err) => return outcome.fail("read_by", &err),
    };

    for message in messages.iter().filter_map(|m| m.rewrite_handles(rename)) {
        match store.save_message(&message).await {
            Ok(()) => outcome.rows += 1,
            Err(err) => outcome.fail("read_by", &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Appointment, Comment, Listing, Message, Post, Reply};
    use crate::store::MemoryRemoteStore;
    use crate::store::mem::Tables;

    fn tables() -> Tables {
        Tables {
            listings: vec![Listing {
                id: "l1".into(),
                owner: "oldname".into(),
                ..Default::default()
            }],
            posts: vec![Post {
                id: "p1".into(),
                author: "vicdan".into(),
                comments: vec![Comment {
                    id: "c1".into(),
                    author: "OldName".into(),
                    replies: vec![Reply {
                        id: "r1".into(),
                        author: "oldname".into(),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            messages: vec![Message {
                id: "m1".into(),
                sender: "oldname".into(),
                recipient: "vicdan".into(),
                read_by: vec!["oldname".into(), "vicdan".into()],
                ..Default::default()
            }],
            appointments: vec![
                Appointment {
                    id: "a1".into(),
                    requester: " OLDNAME".into(),
                    ..Default::default()
                },
                Appointment {
                    id: "a2".into(),
                    requester: "oldname2".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fanout_rewrites_every_collection() {
        let store = Arc::new(MemoryRemoteStore::new(tables()));

        let report = dispatch(store.clone(), Rename::new("oldname", "newname"), 100)
            .join()
            .await;
        assert!(report.succeeded());

        let tables = store.tables().await;
        assert_eq!(tables.listings[0].owner, "newname");
        assert_eq!(tables.posts[0].author, "vicdan");
        assert_eq!(tables.posts[0].comments[0].author, "newname");
        assert_eq!(tables.posts[0].comments[0].replies[0].author, "newname");
        assert_eq!(tables.messages[0].sender, "newname");
        assert_eq!(tables.messages[0].recipient, "vicdan");
        assert_eq!(
            tables.messages[0].read_by,
            vec!["newname".to_string(), "vicdan".to_string()]
        );
        assert_eq!(tables.appointments[0].requester, "newname");
        assert_eq!(tables.appointments[1].requester, "oldname2");
        assert_eq!(report.get(Collection::Appointments).unwrap().rows, 1);
    }

    #[tokio::test]
    async fn test_failing_collection_is_isolated() {
        let store = Arc::new(MemoryRemoteStore::new(tables()));
        store.fail(Collection::Messages).await;

        let report = dispatch(store.clone(), Rename::new("oldname", "newname"), 100)
            .join()
            .await;

        assert!(!report.succeeded());
        assert!(report.get(Collection::Listings).unwrap().succeeded());
        assert!(!report.get(Collection::Messages).unwrap().succeeded());

        let tables = store.tables().await;
        assert_eq!(tables.listings[0].owner, "newname");
        assert_eq!(tables.messages[0].sender, "oldname");
    }

    #[tokio::test]
    async fn test_page_size_bounds_nested_rewrite() {
        let store = Arc::new(MemoryRemoteStore::new(tables()));

        let report = dispatch(store.clone(), Rename::new("oldname", "newname"), 0)
            .join()
            .await;
        assert!(report.succeeded());

        let tables = store.tables().await;
        assert_eq!(tables.messages[0].sender, "newname");
        assert_eq!(tables.messages[0].read_by[0], "oldname");
        assert_eq!(tables.posts[0].comments[0].author, "OldName");
    }
}
