//! HTTP client wrapper for Quqi API requests.

use std::time::Duration;

use reqwest::header::COOKIE;
use reqwest::{Client, Response, multipart::Form};
use serde::Serialize;

use crate::error::{QuqiError, Result};

/// HTTP client for making requests to Quqi servers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Create a new HTTP client with a proxy.
    pub fn with_proxy(proxy: &str, timeout: Duration) -> Result<Self> {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| QuqiError::Custom(format!("Invalid proxy: {}", e)))?;

        let client = Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .build()
            .map_err(|e| QuqiError::Custom(format!("Failed to build client: {}", e)))?;

        Ok(Self { client })
    }

    /// POST an urlencoded form, optionally with a session cookie.
    pub async fn post_form<F: Serialize + ?Sized>(
        &self,
        url: &str,
        cookie: Option<&str>,
        form: &F,
    ) -> Result<Response> {
        let mut request = self.client.post(url).form(form);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        check_status(request.send().await?)
    }

    /// GET with query parameters, optionally with a session cookie.
    pub async fn get<Q: Serialize + ?Sized>(
        &self,
        url: &str,
        cookie: Option<&str>,
        query: &Q,
    ) -> Result<Response> {
        let mut request = self.client.get(url).query(query);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        check_status(request.send().await?)
    }

    /// POST a multipart form to a URL carrying its own query string.
    pub async fn post_multipart<Q: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
        form: Form,
    ) -> Result<Response> {
        let response = self
            .client
            .post(url)
            .query(query)
            .multipart(form)
            .send()
            .await?;
        check_status(response)
    }

    /// POST a raw body.
    pub async fn post_bytes<Q: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &Q,
        body: Vec<u8>,
    ) -> Result<Response> {
        let response = self
            .client
            .post(url)
            .query(query)
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await?;
        check_status(response)
    }
}

fn check_status(response: Response) -> Result<Response> {
    if !response.status().is_success() {
        return Err(QuqiError::HttpError(response.status().as_u16()));
    }
    Ok(response)
}
