//! In-memory backend for tests

use super::{Article, NewArticle, Tag, Ticket, TicketBackend, TicketState};
use crate::error::{Error, Result};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Per-operation call counters
#[derive(Debug, Default)]
pub struct CallCounts {
    pub search: AtomicUsize,
    pub get_ticket: AtomicUsize,
    pub list_articles: AtomicUsize,
    pub create_article: AtomicUsize,
    pub list_tags: AtomicUsize,
    pub list_states: AtomicUsize,
}

/// Ticket store held in memory; `search_tickets` returns every ticket whose
/// state is listed in `actionable_states`
#[derive(Default)]
pub struct MemoryBackend {
    pub tickets: Mutex<HashMap<u64, Ticket>>,
    pub articles: Mutex<HashMap<u64, Vec<Article>>>,
    pub tags: Mutex<HashMap<u64, Vec<Tag>>>,
    pub states: Vec<TicketState>,
    pub actionable_states: Vec<u64>,
    pub calls: CallCounts,
    pub fail: AtomicBool,
}

impl MemoryBackend {
    /// Backend with the stock Zammad states; new, open and pending are actionable
    pub fn new() -> Self {
        let states = [(1, "new"), (2, "open"), (3, "pending reminder"), (4, "closed"), (7, "pending close")]
            .iter()
            .map(|(id, name)| TicketState { id: *id, name: name.to_string() })
            .collect();
        MemoryBackend {
            states,
            actionable_states: vec![1, 2, 3, 7],
            ..Default::default()
        }
    }

    pub fn insert_ticket(&self, ticket: Ticket) {
        self.tickets.lock().insert(ticket.id, ticket);
    }

    pub fn set_title(&self, id: u64, title: &str) {
        if let Some(t) = self.tickets.lock().get_mut(&id) {
            t.title = title.to_string();
        }
    }

    pub fn add_article(&self, article: Article) {
        self.articles.lock().entry(article.ticket_id).or_default().push(article);
    }

    pub fn set_tags(&self, ticket_id: u64, names: &[&str]) {
        let tags = names.iter().map(|n| Tag { name: n.to_string() }).collect();
        self.tags.lock().insert(ticket_id, tags);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TicketBackend for MemoryBackend {
    async fn search_tickets(&self, _query: &str, limit: u32) -> Result<Vec<Ticket>> {
        self.check(&self.calls.search)?;
        let mut found: Vec<Ticket> = self
            .tickets
            .lock()
            .values()
            .filter(|t| self.actionable_states.contains(&t.state_id))
            .cloned()
            .collect();
        found.sort_by_key(|t| t.id);
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn get_ticket(&self, id: u64) -> Result<Option<Ticket>> {
        self.check(&self.calls.get_ticket)?;
        Ok(self.tickets.lock().get(&id).cloned())
    }

    async fn list_articles(&self, ticket_id: u64) -> Result<Vec<Article>> {
        self.check(&self.calls.list_articles)?;
        Ok(self.articles.lock().get(&ticket_id).cloned().unwrap_or_default())
    }

    async fn create_article(&self, article: &NewArticle) -> Result<Article> {
        self.check(&self.calls.create_article)?;
        let mut articles = self.articles.lock();
        let list = articles.entry(article.ticket_id).or_default();
        let created = Article {
            id: list.len() as u64 + 1,
            ticket_id: article.ticket_id,
            from: article.from.clone(),
            to: String::new(),
            subject: Some(article.subject.clone()),
            body: article.body.clone(),
            internal: article.internal,
        };
        list.push(created.clone());
        Ok(created)
    }

    async fn list_tags(&self, ticket_id: u64) -> Result<Vec<Tag>> {
        self.check(&self.calls.list_tags)?;
        Ok(self.tags.lock().get(&ticket_id).cloned().unwrap_or_default())
    }

    async fn list_states(&self) -> Result<Vec<TicketState>> {
        self.check(&self.calls.list_states)?;
        Ok(self.states.clone())
    }
}
