use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one JSON body and returns whatever came back.
///
/// Implementations block the calling worker for the whole round trip.
pub trait Transport: Send + Sync + 'static {
    fn post(&self, url: &str, body: Vec<u8>, bearer_token: Option<&str>) -> Result<RawResponse>;
}

/// Blocking HTTP transport with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, body: Vec<u8>, bearer_token: Option<&str>) -> Result<RawResponse> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|err| Error::Network(format!("POST {url} failed: {err}")))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|err| Error::Network(format!("reading response from {url} failed: {err}")))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}
