//! HTTP client seam for the route export calls.
//!
//! [`HttpClient`] keeps the transport swappable; [`Bearer`] wraps any client
//! and injects the `Authorization` header so callers never thread the token
//! through request construction by hand.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, Request, Response, StatusCode, Url};

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// Plain unauthenticated client over a shared [`reqwest::Client`].
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req).await
    }
}

/// An [`HttpClient`] wrapper that sets `Authorization: Bearer <token>` on
/// every request it executes.
pub struct Bearer<C> {
    inner: C,
    value: String,
}

impl<C> Bearer<C> {
    pub fn new(inner: C, token: &str) -> Self {
        Self {
            inner,
            value: format!("Bearer {token}"),
        }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for Bearer<C> {
    async fn execute(&self, mut req: Request) -> reqwest::Result<Response> {
        req.headers_mut().insert(
            AUTHORIZATION,
            self.value.parse().expect("Bearer: invalid header value"),
        );
        self.inner.execute(req).await
    }
}

/// Issues one GET to `url` and returns the status with the raw body.
///
/// Status interpretation is left to the caller; only transport failures are
/// errors here.
pub async fn get_bytes<C: HttpClient>(
    client: &C,
    url: Url,
) -> reqwest::Result<(StatusCode, Vec<u8>)> {
    let resp = client.execute(Request::new(Method::GET, url)).await?;
    let status = resp.status();
    let body = resp.bytes().await?.to_vec();
    Ok((status, body))
}
