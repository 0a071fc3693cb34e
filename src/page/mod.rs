//! Page module: the rendering collaborator the crawler drives
//!
//! This module contains:
//! - The `Page` and `Browser` traits every collaborator implements
//! - A static HTML collaborator fetching documents over HTTP
//! - The selector expression language the static collaborator evaluates

mod http;
mod query;
mod traits;


pub use http::{build_http_client, HttpBrowser, StaticPage};
pub use query::Query;
pub use traits::{forward_messages, Browser, Page, PageError, PageMessage, PageResult};
