//! REST page source for the reactions listing endpoint.

use crate::config::{AuthConfig, RosterConfig};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use roster_core::{
    Actor, Cursor, Entry, Page, PageQuery, PageSource, SubjectId, TransportError,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Unexpected response (HTTP {status}): {message}")]
    InvalidResponse { status: u16, message: String },
    #[error("Config error: {0}")]
    Config(String),
}

impl From<ApiClientError> for TransportError {
    fn from(err: ApiClientError) -> Self {
        match err {
            ApiClientError::Http(err) if err.is_decode() => Self::Decode {
                reason: err.to_string(),
            },
            ApiClientError::Http(err) => match err.status() {
                Some(status) => Self::Http {
                    status: status.as_u16(),
                    message: err.to_string(),
                },
                None => Self::Network {
                    reason: err.to_string(),
                },
            },
            ApiClientError::Serde(err) => Self::Decode {
                reason: err.to_string(),
            },
            ApiClientError::InvalidResponse { status, message } => Self::Http { status, message },
            ApiClientError::Config(reason) => Self::Network { reason },
        }
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct PageParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<&'a str>,
    limit: u32,
}

impl<'a> From<&'a PageQuery> for PageParams<'a> {
    fn from(query: &'a PageQuery) -> Self {
        Self {
            tag: query.scope.tag().map(|tag| tag.as_str()),
            offset: query.cursor.as_ref().map(|cursor| cursor.as_str()),
            limit: query.limit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PageResponse {
    entries: Vec<EntryDto>,
    #[serde(default)]
    actors: Vec<ActorDto>,
    #[serde(default)]
    next_offset: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EntryDto {
    actor_id: u64,
    #[serde(default)]
    tag: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ActorDto {
    id: u64,
    display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl From<PageResponse> for Page {
    fn from(response: PageResponse) -> Self {
        Self {
            entries: response
                .entries
                .into_iter()
                .map(|entry| Entry::new(entry.actor_id, entry.tag))
                .collect(),
            actors: response
                .actors
                .into_iter()
                .map(|actor| Actor::new(actor.id, actor.display_name))
                .collect(),
            // An empty offset means the same as a missing one.
            next_cursor: response.next_offset.and_then(Cursor::parse),
        }
    }
}

// ============================================================================
// CLIENT
// ============================================================================

#[derive(Clone)]
pub struct RestPageSource {
    client: reqwest::Client,
    base_url: String,
    subject_id: SubjectId,
    auth_header: HeaderMap,
}

impl RestPageSource {
    pub fn new(config: &RosterConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let auth_header = build_auth_headers(&config.auth)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            subject_id: config.subject_id,
            auth_header,
        })
    }

    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    fn reactions_path(&self) -> String {
        format!("/api/v1/subjects/{}/reactions", self.subject_id)
    }

    async fn get_json<T, Q>(&self, path: &str, query: Option<&Q>) -> Result<T, ApiClientError>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(url).headers(self.auth_header.clone());
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = request.send().await?;
        self.parse_response(response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let text = response.text().await?;
            Err(error_from_body(status.as_u16(), &text))
        }
    }
}

#[async_trait]
impl PageSource for RestPageSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Page, TransportError> {
        let params = PageParams::from(query);
        let response: PageResponse = self
            .get_json(&self.reactions_path(), Some(&params))
            .await
            .map_err(TransportError::from)?;
        Ok(response.into())
    }
}

fn error_from_body(status: u16, text: &str) -> ApiClientError {
    let message = match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => format!("{}: {}", body.code, body.message),
        Err(_) => text.to_string(),
    };
    ApiClientError::InvalidResponse { status, message }
}

fn build_auth_headers(auth: &AuthConfig) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = &auth.api_key {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    if let Some(jwt) = &auth.jwt {
        let value = format!("Bearer {}", jwt);
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}
