use crate::error::{Error, Result};
use reqwest::{Client, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = concat!("hello-crew/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over `reqwest` for the model server.
///
/// Single attempt per call: a failed request is returned to the caller as is.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let body = self.send(self.client.get(&url)).await?;
        serde_json::from_str(&body).map_err(|e| Error::parse(format!("JSON parse: {e}")))
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "POST");
        let mut req = self.client.post(&url).json(body);
        if let Some(token) = bearer {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let text = self.send(req).await?;
        serde_json::from_str(&text).map_err(|e| Error::parse(format!("JSON parse: {e}")))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<String> {
        match req.send().await {
            Ok(resp) => self.handle_response(resp).await,
            Err(e) if e.is_connect() => Err(Error::Connection {
                base_url: self.base_url.clone(),
                message: e.to_string(),
            }),
            Err(e) if e.is_timeout() => Err(Error::http(format!("request timed out: {e}"))),
            Err(e) => Err(Error::http(e.to_string())),
        }
    }

    async fn handle_response(&self, resp: reqwest::Response) -> Result<String> {
        let status = resp.status();

        match status {
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED => {
                resp.text().await.map_err(|e| Error::http(e.to_string()))
            }
            _ => {
                let body = resp.text().await.unwrap_or_default();
                Err(Error::api(status.as_u16(), body))
            }
        }
    }
}
