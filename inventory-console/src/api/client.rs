use console_core::observability::{TracedClientExt, TracedRequest};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{multipart::Form, Client, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;

use crate::config::ApiSettings;
use crate::error::{ConsoleError, Result, MSG_BAD_REQUEST, MSG_SERVER_ERROR, MSG_UNAUTHORIZED};
use crate::session::SharedSession;

/// The `{success, message, data}` envelope most endpoints answer with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }

    /// Fail on `success: false`, then require `data`.
    pub fn into_data(self, what: &str) -> Result<T> {
        if !self.success {
            return Err(ConsoleError::Rejected(
                self.message_or(&format!("No se pudo completar la operación: {}", what)),
            ));
        }
        self.data
            .ok_or_else(|| ConsoleError::Shape(format!("missing data in {} response", what)))
    }

    /// Fail on `success: false`; `data` is optional.
    pub fn ensure_success(self, what: &str) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(ConsoleError::Rejected(
                self.message_or(&format!("No se pudo completar la operación: {}", what)),
            ))
        }
    }
}

/// Plain `{success, message}` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Cookie-authenticated JSON client for the inventory backend.
///
/// Every request carries trace headers. Non-2xx statuses are mapped to
/// [`ConsoleError`] and a 401 also wipes the shared session. A body that
/// does not decode into the expected type is a [`ConsoleError::Shape`].
pub struct ApiClient {
    client: Client,
    base_url: String,
    cookies: Arc<Jar>,
    session: SharedSession,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, session: SharedSession) -> Result<Self> {
        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(cookies.clone())
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            cookies,
            session,
        })
    }

    fn cookie_url(&self) -> Result<Url> {
        Url::parse(&format!("{}/", self.base_url))
            .map_err(|e| ConsoleError::Config(format!("invalid api.base_url: {}", e)))
    }

    /// The `Cookie` header the backend would receive on the next request.
    pub fn cookie_header(&self) -> Result<Option<String>> {
        let url = self.cookie_url()?;
        Ok(self
            .cookies
            .cookies(&url)
            .and_then(|value| value.to_str().ok().map(str::to_string)))
    }

    /// Seed the jar from a header previously returned by [`Self::cookie_header`].
    pub fn restore_cookies(&self, header: &str) -> Result<()> {
        let url = self.cookie_url()?;
        let mut restored = 0;
        for pair in header.split(';').map(str::trim).filter(|p| p.contains('=')) {
            self.cookies.add_cookie_str(pair, &url);
            restored += 1;
        }
        tracing::debug!(restored, "Session cookies restored");
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        let request = self.client.traced_get(&url).query(query);
        self.dispatch("GET", &url, request).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self.client.traced_post(&url).json(body);
        self.dispatch("POST", &url, request).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let request = self.client.traced_post(&url);
        self.dispatch("POST", &url, request).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        let url = self.url(path);
        let request = self.client.traced_post(&url).multipart(form);
        self.dispatch("POST", &url, request).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let request = self.client.traced_put(&url).json(body);
        self.dispatch("PUT", &url, request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let request = self.client.traced_delete(&url);
        self.dispatch("DELETE", &url, request).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: &str,
        url: &str,
        request: TracedRequest,
    ) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(method, url, error = %e, "Request failed to send");
            ConsoleError::Transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(method, url, status = status.as_u16(), "Request succeeded");
            let body = response.bytes().await?;
            return decode_body(&body).map_err(|e| {
                tracing::error!(method, url, error = %e, "Failed to decode response body");
                e
            });
        }

        let body = response.text().await.unwrap_or_default();
        let server_message = extract_message(&body);
        tracing::warn!(
            method,
            url,
            status = status.as_u16(),
            server_message = server_message.as_deref().unwrap_or(""),
            "Request rejected by backend"
        );

        Err(self.status_error(status, server_message).await)
    }

    async fn status_error(&self, status: StatusCode, server_message: Option<String>) -> ConsoleError {
        match status {
            StatusCode::UNAUTHORIZED => {
                self.session.write().await.clear();
                tracing::info!("Session cleared after 401");
                ConsoleError::Unauthorized(server_message.unwrap_or_else(|| MSG_UNAUTHORIZED.to_string()))
            }
            StatusCode::BAD_REQUEST => {
                ConsoleError::BadRequest(server_message.unwrap_or_else(|| MSG_BAD_REQUEST.to_string()))
            }
            s if s.is_server_error() => {
                ConsoleError::Server(server_message.unwrap_or_else(|| MSG_SERVER_ERROR.to_string()))
            }
            s => ConsoleError::Http {
                status: s.as_u16(),
                message: server_message.unwrap_or_else(|| format!("Error HTTP {}", s.as_u16())),
            },
        }
    }
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| ConsoleError::Shape(format!("undecodable body: {}", e)))
}

fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
        .filter(|m| !m.trim().is_empty())
}
