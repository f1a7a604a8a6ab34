//! File content rendering
//!
//! Turns ticket, article and tag records into the bytes a read returns, and
//! turns the bytes written to `articles` into a new internal note.

use crate::states::StateTable;
use crate::zammad::{Article, NewArticle, Tag, Ticket, ARTICLE_TYPE_NOTE, SENDER_AGENT};
use std::fmt::Write;

/// Printed between two article blocks
const ARTICLE_SEPARATOR: &str = "*********************************";

/// Subject of articles created through the filesystem
pub const WRITE_SUBJECT: &str = "From ticketfs";

/// Sender name of articles created through the filesystem
pub const WRITE_FROM: &str = "ticketfs";

pub fn title(ticket: &Ticket) -> Vec<u8> {
    format!("{}\n", ticket.title).into_bytes()
}

/// State name without a trailing newline
pub fn state(ticket: &Ticket, states: &StateTable) -> Vec<u8> {
    states.name(ticket.state_id).as_bytes().to_vec()
}

/// Link to the ticket in the Zammad web UI
pub fn id_link(ticket: &Ticket, base_url: &str) -> Vec<u8> {
    format!("{}/#ticket/zoom/{}\n", base_url, ticket.id).into_bytes()
}

pub fn number(ticket: &Ticket) -> Vec<u8> {
    format!("{}\n", ticket.number).into_bytes()
}

/// Articles in the order given, one header block plus body each
pub fn articles(articles: &[Article]) -> Vec<u8> {
    let mut buf = String::new();
    for (i, a) in articles.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
            buf.push_str(ARTICLE_SEPARATOR);
            buf.push('\n');
        }
        let _ = writeln!(buf, "From: {}", a.from);
        let _ = writeln!(buf, "To: {}", a.to);
        if let Some(subject) = &a.subject {
            let _ = writeln!(buf, "Subject: {}", subject);
        }
        buf.push_str(if a.internal { "internal\n" } else { "public\n" });
        let _ = write!(buf, "\n{}\n", a.body);
    }
    buf.into_bytes()
}

/// One tag per line
pub fn tags(tags: &[Tag]) -> Vec<u8> {
    let mut buf = String::new();
    for t in tags {
        buf.push_str(&t.name);
        buf.push('\n');
    }
    buf.into_bytes()
}

/// Internal note carrying `data` verbatim as its body
pub fn article_for_write(ticket_id: u64, author_id: u64, data: &[u8]) -> NewArticle {
    NewArticle {
        ticket_id,
        type_id: ARTICLE_TYPE_NOTE,
        sender_id: SENDER_AGENT,
        origin_by_id: author_id,
        created_by_id: author_id,
        updated_by_id: author_id,
        subject: WRITE_SUBJECT.to_string(),
        from: WRITE_FROM.to_string(),
        content_type: "text/plain".to_string(),
        internal: true,
        body: String::from_utf8_lossy(data).into_owned(),
    }
}
