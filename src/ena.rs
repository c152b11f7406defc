use std::io::Write;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::EnaError;

/// Where compressed FASTA payloads come from.
pub trait FastaSource {
    /// Streams the body at `url` into `destination` and returns the byte count.
    fn download(&self, url: &str, destination: &mut dyn Write) -> Result<u64, EnaError>;
}

#[derive(Clone)]
pub struct EnaHttpClient {
    client: Client,
}

impl EnaHttpClient {
    pub fn new(timeout: Option<Duration>) -> Result<Self, EnaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ena-fasta/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| EnaError::Http(err.to_string()))?,
        );
        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| EnaError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    /// ENA reports list FTP locations, sometimes without a scheme. The same
    /// tree is served over HTTPS.
    pub fn normalize_url(url: &str) -> String {
        let url = url.trim();
        if let Some(rest) = url.strip_prefix("ftp://") {
            return format!("https://{rest}");
        }
        if !url.contains("://") {
            return format!("https://{url}");
        }
        url.to_string()
    }
}

impl FastaSource for EnaHttpClient {
    fn download(&self, url: &str, destination: &mut dyn Write) -> Result<u64, EnaError> {
        let url = Self::normalize_url(url);
        debug!(%url, "requesting");
        let mut response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| EnaError::Http(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "ENA request failed".to_string());
            return Err(EnaError::HttpStatus { status, message });
        }
        response
            .copy_to(destination)
            .map_err(|err| EnaError::Http(err.to_string()))
    }
}
