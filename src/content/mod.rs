//! Records carrying a denormalized copy of a handle.
mod application;
mod appointment;
mod listing;
pub mod message;
mod post;

pub use application::*;
pub use appointment::*;
pub use listing::*;
pub use message::Message;
pub use post::*;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Collections holding handle copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Listings,
    Posts,
    Messages,
    Appointments,
    Applications,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Listings,
        Collection::Posts,
        Collection::Messages,
        Collection::Appointments,
        Collection::Applications,
    ];

    /// Backend table name.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Listings => "business_listings",
            Collection::Posts => "posts",
            Collection::Messages => "messages",
            Collection::Appointments => "appointments",
            Collection::Applications => "business_applications",
        }
    }

    /// Flat handle columns of this collection.
    pub fn handle_columns(&self) -> &'static [HandleColumn] {
        match self {
            Collection::Listings => &[HandleColumn::ListingOwner],
            Collection::Posts => &[HandleColumn::PostAuthor],
            Collection::Messages => {
                &[HandleColumn::MessageSender, HandleColumn::MessageRecipient]
            },
            Collection::Appointments => &[HandleColumn::AppointmentRequester],
            Collection::Applications => &[
                HandleColumn::ApplicationApplicant,
                HandleColumn::ApplicationOwner,
            ],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Listings => "listings",
            Collection::Posts => "posts",
            Collection::Messages => "messages",
            Collection::Appointments => "appointments",
            Collection::Applications => "applications",
        };
        write!(f, "{name}")
    }
}

/// Flat column holding a single handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleColumn {
    ListingOwner,
    PostAuthor,
    MessageSender,
    MessageRecipient,
    AppointmentRequester,
    ApplicationApplicant,
    ApplicationOwner,
}

impl HandleColumn {
    pub fn collection(&self) -> Collection {
        match self {
            HandleColumn::ListingOwner => Collection::Listings,
            HandleColumn::PostAuthor => Collection::Posts,
            HandleColumn::MessageSender | HandleColumn::MessageRecipient => {
                Collection::Messages
            },
            HandleColumn::AppointmentRequester => Collection::Appointments,
            HandleColumn::ApplicationApplicant | HandleColumn::ApplicationOwner => {
                Collection::Applications
            },
        }
    }

    /// Column name on the backend table.
    pub fn column(&self) -> &'static str {
        match self {
            HandleColumn::ListingOwner | HandleColumn::ApplicationOwner => "owner",
            HandleColumn::PostAuthor => "author",
            HandleColumn::MessageSender => "sender",
            HandleColumn::MessageRecipient => "recipient",
            HandleColumn::AppointmentRequester => "requester",
            HandleColumn::ApplicationApplicant => "applicant",
        }
    }
}

impl fmt::Display for HandleColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.collection().table(), self.column())
    }
}
