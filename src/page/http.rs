//! Static HTML page backed by an HTTP client
//!
//! This module provides the built-in page collaborator:
//! - Building HTTP clients with the configured user agent
//! - Loading documents with GET requests
//! - Classifying failed loads
//! - Evaluating selector expressions against the loaded document
//!
//! Scripts are never executed. Injection only checks that the script file is
//! readable and records it on the page.

use crate::config::RunConfig;
use crate::page::query::Query;
use crate::page::traits::{Browser, Page, PageError, PageMessage, PageResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::Html;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use suitecrawl::config::RunConfig;
/// use suitecrawl::page::build_http_client;
///
/// let client = build_http_client(&RunConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &RunConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Hands out `StaticPage`s sharing one HTTP client
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    client: Client,
}

impl HttpBrowser {
    pub fn new(config: &RunConfig) -> PageResult<Self> {
        let client = build_http_client(config).map_err(|e| PageError::Create(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn new_page(&mut self) -> PageResult<Box<dyn Page>> {
        Ok(Box::new(StaticPage::new(self.client.clone())))
    }
}

/// A loaded document
#[derive(Debug, Clone)]
struct Document {
    url: Url,
    body: String,
}

/// Page whose document is fetched once and never re-rendered
#[derive(Debug)]
pub struct StaticPage {
    client: Client,
    document: Option<Document>,
    injected: Vec<PathBuf>,
    messages: Vec<PageMessage>,
}

impl StaticPage {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            document: None,
            injected: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Scripts successfully injected so far
    pub fn injected_scripts(&self) -> &[PathBuf] {
        &self.injected
    }
}

#[async_trait]
impl Page for StaticPage {
    async fn open(&mut self, url: &str) -> PageResult<()> {
        let target = Url::parse(url).map_err(|e| load_error(url, e.to_string()))?;
        let body = fetch_document(&self.client, url).await?;

        self.document = Some(Document { url: target, body });
        self.injected.clear();
        Ok(())
    }

    async fn evaluate(&mut self, expr: &str) -> PageResult<Value> {
        let document = self.document.as_ref().ok_or(PageError::NotLoaded)?;
        let query = Query::parse(expr).map_err(|message| PageError::Evaluate {
            expr: expr.to_string(),
            message,
        })?;

        Ok(evaluate_query(&query, document))
    }

    async fn inject_script(&mut self, path: &Path) -> bool {
        if self.document.is_none() {
            return false;
        }
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {
                self.messages.push(PageMessage::Console(format!(
                    "script {} recorded (static page, not executed)",
                    path.display()
                )));
                self.injected.push(path.to_path_buf());
                true
            }
            _ => false,
        }
    }

    fn take_messages(&mut self) -> Vec<PageMessage> {
        std::mem::take(&mut self.messages)
    }

    async fn close(&mut self) {
        self.document = None;
        self.injected.clear();
    }
}

// Html is not Send, so it must never live across an await point
fn evaluate_query(query: &Query, document: &Document) -> Value {
    let html = Html::parse_document(&document.body);
    query.evaluate(&html, &document.url)
}

fn load_error(url: &str, message: impl Into<String>) -> PageError {
    PageError::Load {
        url: url.to_string(),
        message: message.into(),
    }
}

/// Fetches a document, treating anything but a 2xx HTML response as a load
/// failure
///
/// | Condition | Message |
/// |-----------|---------|
/// | HTTP 404 | `HTTP 404 (dead link)` |
/// | HTTP 429 | `HTTP 429 (rate limited)` |
/// | Other non-2xx | `HTTP <code>` |
/// | Non-HTML content type | `Expected HTML, got <type>` |
/// | Timeout | `Request timeout` |
/// | Connection refused | `Connection refused` |
async fn fetch_document(client: &Client, url: &str) -> PageResult<String> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => return Err(load_error(url, "Request timeout")),
        Err(e) if e.is_connect() => return Err(load_error(url, "Connection refused")),
        Err(e) => return Err(load_error(url, e.to_string())),
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(load_error(url, "HTTP 404 (dead link)"));
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(load_error(url, "HTTP 429 (rate limited)"));
    }
    if !status.is_success() {
        return Err(load_error(url, format!("HTTP {}", status.as_u16())));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.is_empty()
        && !content_type.contains("text/html")
        && !content_type.contains("application/xhtml+xml")
    {
        return Err(load_error(url, format!("Expected HTML, got {}", content_type)));
    }

    response
        .text()
        .await
        .map_err(|e| load_error(url, e.to_string()))
}
