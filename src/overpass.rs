use anyhow::{Context, Result};
use clap::crate_version;
use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::bounding_box::BoundingBox;
use crate::query::QueryFormat;

/// Endpoint used when none is configured. Not supposed to rate limit.
pub const DEFAULT_ENDPOINT: &str = "https://overpass.kumi.systems/api/interpreter";

pub(crate) const BACKOFF_DELAY: Duration = Duration::from_secs(10);
const ZERO_DURATION: Duration = Duration::from_secs(0);

/// A vertex of a way as returned by `out geom`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// One element of an Overpass response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Way {
    pub id: i64,

    #[serde(default)]
    pub geometry: Vec<LatLon>,
}

/// A successfully parsed Overpass response.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Way>,

    /// Set by the server when the query hit a runtime error (e.g. exceeded
    /// resource limits).
    #[serde(default)]
    pub remark: Option<String>,
}

/// Reasons a tile's roads could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("response is not valid JSON")]
    Unparseable { body: String },

    #[error("API request encountered runtime error: {0}")]
    Remark(String),

    #[error("rate limited, server asked to wait {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("failed building query: {0}")]
    Query(String),
}

/// Parses an Overpass response body, turning runtime remarks into errors.
pub fn parse_response(body: &str) -> Result<OverpassResponse, FetchError> {
    let response: OverpassResponse =
        serde_json::from_str(body).map_err(|_| FetchError::Unparseable {
            body: body.to_owned(),
        })?;

    match response.remark {
        Some(remark) if !remark.is_empty() => Err(FetchError::Remark(remark)),
        _ => Ok(response),
    }
}

/// A source of road data for an area.
pub trait RoadSource {
    fn roads_in<'a>(
        &'a self,
        bbox: &'a BoundingBox,
    ) -> BoxFuture<'a, Result<OverpassResponse, FetchError>>;
}

/// Client for an Overpass API interpreter endpoint.
pub struct OverpassClient {
    client: reqwest::Client,
    endpoint: String,
    query: QueryFormat,
    request_retries_amount: u8,
}

impl OverpassClient {
    /// Creates a client querying `endpoint`.
    ///
    /// `timeout` is the client-side timeout per request; pass the zero
    /// duration to rely on the server-side timeout alone.
    pub fn new(
        endpoint: impl Into<String>,
        query: QueryFormat,
        timeout: Duration,
        request_retries_amount: u8,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if timeout > ZERO_DURATION {
            builder = builder.timeout(timeout);
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.append(
            reqwest::header::USER_AGENT,
            format!("osm-road-length_rs_{}", crate_version!())
                .parse()
                .context("invalid user agent")?,
        );

        let client = builder
            .default_headers(headers)
            .build()
            .with_context(|| "failed creating HTTP client")?;

        Ok(Self::with_client(client, endpoint, query, request_retries_amount))
    }

    /// Creates a client querying `endpoint` through an already configured
    /// HTTP client.
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        query: QueryFormat,
        request_retries_amount: u8,
    ) -> Self {
        OverpassClient {
            client,
            endpoint: endpoint.into(),
            query,
            request_retries_amount,
        }
    }

    async fn fetch_once(&self, query: &str) -> Result<OverpassResponse, FetchError> {
        let raw_response = self
            .client
            .get(&self.endpoint)
            .query(&[("data", query)])
            .send()
            .await?;

        if raw_response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = raw_response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|val| val.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(BACKOFF_DELAY);

            return Err(FetchError::RateLimited { retry_after });
        }

        let body = raw_response.text().await?;
        parse_response(&body)
    }

    /// Fetches the roads of `bbox`. Every failed attempt, rate limiting
    /// included, uses up one of the configured retries.
    async fn fetch(&self, bbox: &BoundingBox) -> Result<OverpassResponse, FetchError> {
        let query = self
            .query
            .tile_query(bbox)
            .map_err(|e| FetchError::Query(e.to_string()))?;

        let mut res = self.fetch_once(&query).await;
        for attempt in 0..self.request_retries_amount {
            let err = match &res {
                Ok(_) | Err(FetchError::Query(_)) => break,
                Err(e) => e,
            };
            let delay = match err {
                FetchError::RateLimited { retry_after } => *retry_after,
                _ => BACKOFF_DELAY,
            };

            log::warn!(
                "request for {:?} failed ({}), retry {}/{} in {}s",
                bbox,
                err,
                attempt + 1,
                self.request_retries_amount,
                delay.as_secs()
            );
            tokio::time::sleep(delay).await;
            res = self.fetch_once(&query).await;
        }

        res
    }
}

impl RoadSource for OverpassClient {
    fn roads_in<'a>(
        &'a self,
        bbox: &'a BoundingBox,
    ) -> BoxFuture<'a, Result<OverpassResponse, FetchError>> {
        Box::pin(self.fetch(bbox))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::DEFAULT_QUERY_TIMEOUT;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Serves `response` to every connection and counts the requests.
    async fn serve_forever(response: &'static [u8]) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/api/interpreter", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicUsize::new(0));

        let counter = requests.clone();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);

                let mut buf = vec![0; 16 * 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response).await;
                let _ = socket.shutdown().await;
            }
        });

        (endpoint, requests)
    }

    fn local_client(endpoint: String, retries: u8) -> OverpassClient {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        OverpassClient::with_client(
            client,
            endpoint,
            QueryFormat::new(DEFAULT_QUERY_TIMEOUT),
            retries,
        )
    }

    #[tokio::test]
    async fn rate_limiting_uses_up_retries() {
        let (endpoint, requests) = serve_forever(
            b"HTTP/1.1 429 Too Many Requests\r\nRetry-After: 0\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let client = local_client(endpoint, 2);
        let bbox = BoundingBox::around(25.3, 51.5, 0.01);

        match client.roads_in(&bbox).await {
            Err(FetchError::RateLimited { retry_after }) => assert_eq!(retry_after, ZERO_DURATION),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(requests.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn rate_limiting_without_retries_fails_at_once() {
        let (endpoint, requests) = serve_forever(
            b"HTTP/1.1 429 Too Many Requests\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let client = local_client(endpoint, 0);
        let bbox = BoundingBox::around(25.3, 51.5, 0.01);

        match client.roads_in(&bbox).await {
            Err(FetchError::RateLimited { retry_after }) => assert_eq!(retry_after, BACKOFF_DELAY),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetches_roads_over_http() {
        let (endpoint, _) = serve_forever(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 80\r\nConnection: close\r\n\r\n{\"elements\":[{\"id\":5,\"geometry\":[{\"lat\":1.0,\"lon\":2.0},{\"lat\":1.5,\"lon\":2.5}]}]}",
        )
        .await;
        let client = local_client(endpoint, 0);
        let bbox = BoundingBox::around(1.25, 2.25, 1.0);

        let response = client.roads_in(&bbox).await.unwrap();
        assert_eq!(response.elements.len(), 1);
        assert_eq!(response.elements[0].id, 5);
    }

    #[test]
    fn parses_elements_in_order() {
        let body = r#"{
            "version": 0.6,
            "elements": [
                { "type": "way", "id": 42, "geometry": [ { "lat": 0.0, "lon": 0.0 }, { "lat": 1.0, "lon": 0.0 } ] },
                { "type": "way", "id": 7, "geometry": [ { "lat": 2.0, "lon": 3.0 }, { "lat": 2.5, "lon": 3.5 } ] }
            ]
        }"#;

        let response = parse_response(body).unwrap();
        assert_eq!(response.elements.len(), 2);
        assert_eq!(response.elements[0].id, 42);
        assert_eq!(response.elements[1].geometry[1], LatLon { lat: 2.5, lon: 3.5 });
    }

    #[test]
    fn non_json_body_is_unparseable() {
        let body = "<html><body>504 Gateway Timeout</body></html>";

        match parse_response(body) {
            Err(FetchError::Unparseable { body: raw }) => assert_eq!(raw, body),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn remark_is_a_failure() {
        let body = r#"{
            "elements": [],
            "remark": "runtime error: Query run out of memory using about 2048 MB of RAM."
        }"#;

        match parse_response(body) {
            Err(FetchError::Remark(remark)) => assert!(remark.contains("out of memory")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_elements_is_empty() {
        assert_eq!(parse_response("{}").unwrap(), OverpassResponse::default());
    }
}
