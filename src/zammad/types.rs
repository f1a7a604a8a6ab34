//! Zammad record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Article type id of an internal note
pub const ARTICLE_TYPE_NOTE: u64 = 10;

/// Sender id of an agent
pub const SENDER_AGENT: u64 = 2;

/// A Zammad ticket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket ID (0 never names a real ticket)
    #[serde(default)]
    pub id: u64,
    /// Human ticket number
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state_id: u64,
    #[serde(default)]
    pub group_id: u64,
    #[serde(default)]
    pub owner_id: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_contact_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn created(&self) -> SystemTime {
        to_system_time(self.created_at)
    }

    pub fn updated(&self) -> SystemTime {
        to_system_time(self.updated_at)
    }

    pub fn last_contact(&self) -> SystemTime {
        to_system_time(self.last_contact_at)
    }
}

fn to_system_time(t: Option<DateTime<Utc>>) -> SystemTime {
    t.map(SystemTime::from).unwrap_or(SystemTime::UNIX_EPOCH)
}

/// One message attached to a ticket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub ticket_id: u64,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub internal: bool,
}

/// Article creation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewArticle {
    pub ticket_id: u64,
    pub type_id: u64,
    pub sender_id: u64,
    pub origin_by_id: u64,
    pub created_by_id: u64,
    pub updated_by_id: u64,
    pub subject: String,
    pub from: String,
    pub content_type: String,
    pub internal: bool,
    pub body: String,
}

/// A ticket tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// A ticket state as listed by Zammad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketState {
    pub id: u64,
    pub name: String,
}
