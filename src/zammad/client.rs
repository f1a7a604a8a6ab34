//! Zammad REST client
//!
//! Thin reqwest wrapper over the ticket, article, tag and state endpoints.
//! Every call is bounded by the configured timeout and is never retried.

use crate::config::ZammadConfig;
use crate::error::{Error, Result};
use crate::zammad::types::{Article, NewArticle, Tag, Ticket, TicketState};
use crate::zammad::TicketBackend;

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

/// Body of the tag listing endpoint
#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Vec<String>,
}

/// Zammad API client
#[derive(Debug, Clone)]
pub struct ZammadClient {
    http: Client,
    base_url: String,
}

impl ZammadClient {
    /// Create a client for the configured instance
    pub fn new(config: &ZammadConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let auth = header::HeaderValue::from_str(&format!("Token token={}", config.token))
            .map_err(|e| Error::InvalidConfig(format!("Invalid Zammad token: {}", e)))?;
        headers.insert(header::AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(ZammadClient {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.http.get(&url).query(query).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TicketBackend for ZammadClient {
    async fn search_tickets(&self, query: &str, limit: u32) -> Result<Vec<Ticket>> {
        self.get_json(
            "tickets/search",
            &[
                ("query", query.to_string()),
                ("limit", limit.to_string()),
                ("expand", "true".to_string()),
            ],
        )
        .await
    }

    async fn get_ticket(&self, id: u64) -> Result<Option<Ticket>> {
        if id == 0 {
            return Ok(None);
        }
        let url = self.url(&format!("tickets/{}", id));
        debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let ticket: Ticket = Self::decode(response).await?;
        Ok(Some(ticket).filter(|t| t.id != 0))
    }

    async fn list_articles(&self, ticket_id: u64) -> Result<Vec<Article>> {
        self.get_json(&format!("ticket_articles/by_ticket/{}", ticket_id), &[])
            .await
    }

    async fn create_article(&self, article: &NewArticle) -> Result<Article> {
        let url = self.url("ticket_articles");
        debug!("POST {} (ticket {})", url, article.ticket_id);
        let response = self.http.post(&url).json(article).send().await?;
        Self::decode(response).await
    }

    async fn list_tags(&self, ticket_id: u64) -> Result<Vec<Tag>> {
        let list: TagList = self
            .get_json(
                "tags",
                &[("object", "Ticket".to_string()), ("o_id", ticket_id.to_string())],
            )
            .await?;
        Ok(list.tags.into_iter().map(|name| Tag { name }).collect())
    }

    async fn list_states(&self) -> Result<Vec<TicketState>> {
        self.get_json("ticket_states", &[]).await
    }
}
