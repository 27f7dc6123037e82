//! HTTP client for sensor boards.
//!
//! A board answers `GET http://{address}/api/thermistors` with a JSON
//! [`ThermistorPayload`]. The [`Fetcher`] trait is the seam between the poll
//! logic and the network so the retry state machine can be tested without
//! real devices.

use crate::reading::{PollReport, ThermistorPayload};
use log::debug;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Path of the thermistor endpoint on every board.
pub const THERMISTOR_PATH: &str = "/api/thermistors";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from a single fetch against one address.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout and the like
    #[error("transport error: {0}")]
    Transport(String),
    /// Device answered with a non-2xx status
    #[error("HTTP error! status: {0}")]
    Http(u16),
    /// Body was not valid JSON or lacked expected fields
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The HTTP client could not be constructed
    #[error("cannot build HTTP client: {0}")]
    Client(String),
}

/// Future returned by [`Fetcher::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<PollReport, FetchError>> + Send + 'a>>;

/// Network abstraction: fetch one report from one address.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, address: &'a str) -> FetchFuture<'a>;
}

/// Build the endpoint URL for an address (`host` or `host:port`).
pub fn thermistor_url(address: &str) -> String {
    format!("http://{address}{THERMISTOR_PATH}")
}

/// Decode a response body into a report.
pub fn decode_body(body: &str, received_at: SystemTime) -> Result<PollReport, FetchError> {
    let payload: ThermistorPayload =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
    Ok(PollReport::from_payload(payload, received_at))
}

/// Real fetcher backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    async fn get(&self, address: &str) -> Result<PollReport, FetchError> {
        let url = thermistor_url(address);
        debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        decode_body(&body, SystemTime::now())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, address: &'a str) -> FetchFuture<'a> {
        Box::pin(self.get(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Reading;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on an ephemeral port, returning the
    /// `host:port` address to poll.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(&mut stream);

            // Read request headers
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap_or(0) == 0 || line.trim().is_empty() {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });

        address
    }

    #[test]
    fn test_thermistor_url() {
        assert_eq!(
            thermistor_url("192.168.1.50"),
            "http://192.168.1.50/api/thermistors"
        );
        assert_eq!(
            thermistor_url("board.local:8080"),
            "http://board.local:8080/api/thermistors"
        );
    }

    #[test]
    fn test_decode_body_valid() {
        let body = r#"{"count": 1, "timestamp": "42", "thermistors": [{"segmentNumber": 1, "thermistorNumber": 7, "temperature": 19.0}]}"#;
        let report = decode_body(body, SystemTime::UNIX_EPOCH).unwrap();
        assert_eq!(report.readings.len(), 1);
        assert_eq!(report.readings[0].thermistor_number, 7);
    }

    #[test]
    fn test_decode_body_malformed() {
        assert!(matches!(
            decode_body("<html>", SystemTime::UNIX_EPOCH),
            Err(FetchError::MalformedResponse(_))
        ));
        assert!(matches!(
            decode_body(r#"{"count": 1}"#, SystemTime::UNIX_EPOCH),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(FetchError::Http(503).to_string(), "HTTP error! status: 503");
        assert_eq!(
            FetchError::Transport("connection refused".to_string()).to_string(),
            "transport error: connection refused"
        );
    }

    #[tokio::test]
    async fn test_http_error_status_carries_code() {
        let address = serve_once("503 Service Unavailable", "busy").await;
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();

        let result = fetcher.fetch(&address).await;

        assert_eq!(result, Err(FetchError::Http(503)));
    }

    #[tokio::test]
    async fn test_ok_response_decodes_readings() {
        let address = serve_once(
            "200 OK",
            r#"{"count":2,"timestamp":"1234","thermistors":[null,{"segmentNumber":1,"thermistorNumber":2,"temperature":23.5}]}"#,
        )
        .await;
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();

        let report = fetcher.fetch(&address).await.unwrap();

        assert_eq!(report.count, 2);
        assert_eq!(report.device_timestamp, "1234");
        assert_eq!(
            report.readings,
            vec![Reading {
                slot: 1,
                segment_number: 1,
                thermistor_number: 2,
                temperature: 23.5,
            }]
        );
    }

    #[tokio::test]
    async fn test_ok_response_with_non_json_body_is_malformed() {
        let address = serve_once("200 OK", "<html>not json</html>").await;
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();

        let result = fetcher.fetch(&address).await;

        assert!(matches!(result, Err(FetchError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_address_is_transport_error() {
        let fetcher = HttpFetcher::new(Duration::from_millis(200)).unwrap();
        // Port 9 on localhost: nothing listens there in test environments.
        let result = fetcher.fetch("127.0.0.1:9").await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
