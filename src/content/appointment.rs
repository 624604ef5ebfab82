//! Appointment requests sent to businesses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::handle::Rename;
use crate::rename::RewriteHandles;

/// Appointment request from a user to a listed business.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: String,
    pub business_id: String,
    pub requester: String,
    pub requested_for: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl RewriteHandles for Appointment {
    fn rewrite_handles(&self, rename: &Rename) -> Option<Self> {
        let requester = rename.apply(&self.requester)?;
        Some(Self {
            requester,
            ..self.clone()
        })
    }
}
