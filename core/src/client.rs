//! Stateless HTTP request builder and response parser for the posts resource.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`; the
//! caller executes the round-trip in between. Parsers return the wire `Post`
//! shape; conversion to `Todo` needs a clock and happens in `RemoteTodos`.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{Post, PostPage, PostPayload};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Synchronous, stateless client for the posts API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl Default for TodoClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/posts", self.base_url)
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/posts/{}", self.base_url, utf8_percent_encode(id, NON_ALPHANUMERIC))
    }

    fn get(path: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    fn with_json(method: HttpMethod, path: String, input: &PostPayload) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        Self::get(self.collection_url())
    }

    pub fn build_get_todo(&self, id: &str) -> HttpRequest {
        Self::get(self.item_url(id))
    }

    pub fn build_create_todo(&self, input: &PostPayload) -> Result<HttpRequest, ApiError> {
        Self::with_json(HttpMethod::Post, self.collection_url(), input)
    }

    pub fn build_update_todo(&self, id: &str, input: &PostPayload) -> Result<HttpRequest, ApiError> {
        Self::with_json(HttpMethod::Put, self.item_url(id), input)
    }

    pub fn build_delete_todo(&self, id: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.item_url(id),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Full-text search via the `q` query parameter.
    pub fn build_search_todos(&self, query: &str) -> HttpRequest {
        Self::get(format!(
            "{}?q={}",
            self.collection_url(),
            utf8_percent_encode(query, NON_ALPHANUMERIC)
        ))
    }

    /// One page of the collection; `page` is 1-based.
    pub fn build_list_page(&self, page: u32, limit: u32) -> HttpRequest {
        Self::get(format!("{}?_page={page}&_limit={limit}", self.collection_url()))
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        parse_json(&response)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Post, ApiError> {
        parse_json(&response)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Post, ApiError> {
        parse_json(&response)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Post, ApiError> {
        parse_json(&response)
    }

    /// Any 2xx counts; the body is ignored.
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_search_todos(&self, response: HttpResponse) -> Result<Vec<Post>, ApiError> {
        parse_json(&response)
    }

    /// Parse a page response. The total comes from `x-total-count`, falling
    /// back to the number of items returned.
    pub fn parse_list_page(
        &self,
        response: HttpResponse,
        page: u32,
        limit: u32,
    ) -> Result<PostPage, ApiError> {
        let posts: Vec<Post> = parse_json(&response)?;
        let total_items = response
            .header(TOTAL_COUNT_HEADER)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(posts.len() as u64);
        let limit = u64::from(limit.max(1));
        let total_pages = u32::try_from(total_items.div_ceil(limit)).unwrap_or(u32::MAX);
        Ok(PostPage {
            posts,
            current_page: page,
            total_pages,
            total_items,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        })
    }
}

/// Map non-2xx status codes to the matching `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::from_status(response.status, &response.body))
}

fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
