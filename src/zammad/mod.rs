//! Zammad backend
//!
//! The filesystem only talks to Zammad through [`TicketBackend`], so the
//! node model can be driven by the HTTP client or by an in-memory double.

mod client;
#[cfg(test)]
pub mod memory;
mod types;

pub use client::ZammadClient;
pub use types::{Article, NewArticle, Tag, Ticket, TicketState, ARTICLE_TYPE_NOTE, SENDER_AGENT};

use crate::error::Result;
use async_trait::async_trait;

/// Search query selecting tickets that still need attention
pub const ACTIONABLE_QUERY: &str = "state.name:(new OR open OR pending)";

/// Ticket operations the filesystem consumes
#[async_trait]
pub trait TicketBackend: Send + Sync {
    /// Search tickets, returning at most `limit` results
    async fn search_tickets(&self, query: &str, limit: u32) -> Result<Vec<Ticket>>;

    /// Fetch a single ticket; `None` when it does not exist
    async fn get_ticket(&self, id: u64) -> Result<Option<Ticket>>;

    /// All articles of a ticket, oldest first
    async fn list_articles(&self, ticket_id: u64) -> Result<Vec<Article>>;

    /// Create a new article
    async fn create_article(&self, article: &NewArticle) -> Result<Article>;

    /// Tags attached to a ticket
    async fn list_tags(&self, ticket_id: u64) -> Result<Vec<Tag>>;

    /// Every ticket state known to the instance
    async fn list_states(&self) -> Result<Vec<TicketState>>;
}
