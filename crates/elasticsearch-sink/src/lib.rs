//! Elasticsearch implementation of [`DocumentSink`].
//!
//! Documents are written with the `_bulk` endpoint using `index` actions,
//! which create or fully replace the document stored under each `_id`.

mod bulk;

use std::time::Duration;

use catalog_core::TableDocument;
use catalog_sink::{DocumentSink, ItemResult, SinkError};
use reqwest::{header::CONTENT_TYPE, Client, Url};

pub use bulk::{bulk_body, parse_bulk_response};

/// Elasticsearch connection options
#[derive(Clone, Debug)]
pub struct ElasticsearchOpts {
    pub endpoint: String,
    /// Upper bound for every HTTP round trip.
    pub timeout: Duration,
    /// Bypass any HTTP(S)_PROXY settings from the environment.
    pub no_proxy: bool,
}

/// Endpoint with any password removed, for logs and error messages.
pub fn sanitize_endpoint(endpoint: &str) -> String {
    match Url::parse(endpoint) {
        Ok(mut url) => {
            if url.password().is_some() {
                // Only fails for URLs that cannot carry credentials.
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "<invalid endpoint>".to_string(),
    }
}

pub struct ElasticsearchSink {
    client: Client,
    endpoint: Url,
    display_endpoint: String,
    timeout: Duration,
}

impl ElasticsearchSink {
    pub fn new(opts: &ElasticsearchOpts) -> Result<Self, SinkError> {
        let endpoint = Url::parse(&opts.endpoint)
            .map_err(|e| SinkError::Unavailable(format!("invalid endpoint: {e}")))?;

        let mut builder = Client::builder().timeout(opts.timeout);
        if opts.no_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| SinkError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            display_endpoint: sanitize_endpoint(endpoint.as_str()),
            endpoint,
            timeout: opts.timeout,
        })
    }

    fn bulk_url(&self, index_name: &str) -> String {
        format!(
            "{}/{index_name}/_bulk",
            self.endpoint.as_str().trim_end_matches('/')
        )
    }

    fn map_transport_error(&self, e: reqwest::Error) -> SinkError {
        if e.is_timeout() {
            SinkError::TimedOut(self.timeout)
        } else {
            SinkError::Unavailable(e.without_url().to_string())
        }
    }
}

#[async_trait::async_trait]
impl DocumentSink for ElasticsearchSink {
    async fn health_check(&self) -> bool {
        // HEAD / is the cheapest request; some proxies only allow GET.
        match self.client.head(self.endpoint.clone()).send().await {
            Ok(response) if response.status().is_success() => return true,
            Ok(response) => {
                tracing::debug!(
                    "HEAD {} returned {}",
                    self.display_endpoint,
                    response.status()
                )
            }
            Err(e) => tracing::debug!("HEAD {} failed: {}", self.display_endpoint, e.without_url()),
        }

        match self.client.get(self.endpoint.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("GET {} failed: {}", self.display_endpoint, e.without_url());
                false
            }
        }
    }

    async fn bulk_upsert(
        &self,
        index_name: &str,
        items: &[(String, TableDocument)],
    ) -> Result<Vec<ItemResult>, SinkError> {
        let body = bulk_body(items)?;
        let url = self.bulk_url(index_name);

        tracing::debug!(
            "POST {}/{index_name}/_bulk with {} items",
            self.display_endpoint.trim_end_matches('/'),
            items.len()
        );

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_bulk_response(&text)
    }
}
