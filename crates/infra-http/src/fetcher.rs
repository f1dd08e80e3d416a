// HTTP ContentFetcher Implementation

use crate::title::extract_title;
use async_trait::async_trait;
use sentiq_core::port::{ContentFetcher, FetchError};
use std::time::Duration;
use tracing::debug;

/// Most of a page body read while looking for `<title>` (256 KiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024;

/// Fetches a page over HTTP(S) and returns its title text
pub struct HttpContentFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_body_bytes: usize,
}

impl HttpContentFetcher {
    /// Build a fetcher whose requests give up after `timeout`
    ///
    /// Keep `timeout` shorter than the worker lease so a slow page fails
    /// the job before its lease runs out.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sentiq/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            timeout,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    /// Cap on the body prefix searched for the title; the rest is never read
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Read at most `max_body_bytes` of the body
    async fn read_prefix(&self, mut response: reqwest::Response) -> Result<String, FetchError> {
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.map_reqwest_error(e))?
        {
            let room = self.max_body_bytes - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                debug!(limit = self.max_body_bytes, "Body truncated at read limit");
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn map_reqwest_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, locator: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_body_bytes as u64 {
                debug!(locator = %locator, content_length = length, "Large page, reading prefix only");
            }
        }
        let body = self.read_prefix(response).await?;

        let title = extract_title(&body)
            .ok_or_else(|| FetchError::Parse(format!("no <title> element in {}", locator)))?;

        debug!(locator = %locator, bytes = body.len(), title = %title, "Content fetched");
        Ok(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a local port
    async fn serve_once(status_line: &'static str, body: impl Into<String>) -> String {
        let body = body.into();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/page", addr)
    }

    #[tokio::test]
    async fn test_fetch_returns_title() {
        let url = serve_once(
            "200 OK",
            "<html><head><title>Good news everyone.</title></head><body>ignored</body></html>",
        )
        .await;
        let fetcher = HttpContentFetcher::new(Duration::from_secs(5)).unwrap();

        assert_eq!(fetcher.fetch(&url).await.unwrap(), "Good news everyone.");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let url = serve_once("503 Service Unavailable", "down").await;
        let fetcher = HttpContentFetcher::new(Duration::from_secs(5)).unwrap();

        assert!(matches!(fetcher.fetch(&url).await, Err(FetchError::Status(503))));
    }

    #[tokio::test]
    async fn test_missing_title_is_parse_error() {
        let url = serve_once("200 OK", "<html><body>no title</body></html>").await;
        let fetcher = HttpContentFetcher::new(Duration::from_secs(5)).unwrap();

        assert!(matches!(fetcher.fetch(&url).await, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_only_body_prefix_is_read() {
        let padding = "x".repeat(4096);
        let early = format!("<html><head><title>Early</title></head><body>{}</body></html>", padding);
        let late = format!("<html><head>{}<title>Late</title></head></html>", padding);

        let fetcher = HttpContentFetcher::new(Duration::from_secs(5))
            .unwrap()
            .with_max_body_bytes(1024);

        let url = serve_once("200 OK", early).await;
        assert_eq!(fetcher.fetch(&url).await.unwrap(), "Early");

        // Title lies past the read limit
        let url = serve_once("200 OK", late).await;
        assert!(matches!(fetcher.fetch(&url).await, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = HttpContentFetcher::new(Duration::from_secs(5)).unwrap();
        let result = fetcher.fetch(&format!("http://{}/", addr)).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
