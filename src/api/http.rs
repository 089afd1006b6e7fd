use crate::api::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::Res;
use anyhow::Context;
use serde_json::Value;
use std::time::Duration;
use tracing::trace;
use url::Url;

/// Sends requests to the REST backend over HTTP.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(base_url: &Url, timeout: Duration) -> Res<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self {
            base_url: base_url.clone(),
            client,
        })
    }

    /// `base_url` plus `path`, keeping any path the base URL already has (e.g. `/api`).
    fn url(&self, request: &ApiRequest) -> Res<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            request.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined).with_context(|| format!("Invalid URL '{joined}'"))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> anyhow::Result<ApiResponse> {
        let url = self.url(request)?;
        trace!("{} {url}", request.method);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.client.request(method, url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("{} {} could not be sent", request.method, request.path))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .with_context(|| format!("Unable to read the response to {}", request.path))?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        trace!("{} {} -> {status}", request.method, request.path);
        Ok(ApiResponse { status, body })
    }
}
