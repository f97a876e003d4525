use std::future::Future;

use url::Url;

use crate::model::{LinkHistory, ShortenRequest};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{body}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Shortener is the remote endpoint that turns a long URL into a short one.
pub trait Shortener: Send + Sync + 'static {
    /// Resolves to the literal short URL on success.
    fn shorten(&self, request: &ShortenRequest) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// HttpShortener posts to the page the form was served from.
#[derive(Clone, Debug)]
pub struct HttpShortener {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpShortener {
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        Ok(Self::with_client(Url::parse(endpoint)?, reqwest::Client::new()))
    }

    pub fn with_client(endpoint: Url, http: reqwest::Client) -> Self {
        Self { endpoint, http }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// returns the URL a request for `request` is sent to.
    pub fn request_url(&self, request: &ShortenRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(Some(&request.query_string()));
        url
    }

    /// Lists the links the endpoint has recorded for the caller's address.
    pub async fn history(&self) -> Result<LinkHistory, ClientError> {
        let url = self.endpoint.join("/history")?;
        tracing::debug!("fetching history: {}", url);
        let response = self.http.get(url).send().await?;
        let body = Self::success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn success_body(response: reqwest::Response) -> Result<String, ClientError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }
        tracing::warn!("endpoint answered {}: {}", status, body.trim_end());
        let body = match body.trim_end() {
            "" => status.to_string(),
            detail => detail.to_string(),
        };
        Err(ClientError::Status { status, body })
    }
}

impl Shortener for HttpShortener {
    async fn shorten(&self, request: &ShortenRequest) -> Result<String, ClientError> {
        let url = self.request_url(request);
        tracing::debug!("POST {}", url);
        let response = self.http.post(url).send().await?;
        Self::success_body(response).await
    }
}
