// Parley — API client
//
// One `ApiClient` over the backend's REST surface:
//   auth — /login, /signup, /signout, /user
//   chat — /chat (streamed), /chat/voice, /upload, /history
//
// The client holds the bearer token for the current session; callers are
// responsible for updating it on login/logout. No request is retried
// automatically — failures surface once, at the originating action.

use reqwest::RequestBuilder;

pub mod auth;
pub mod chat;
pub mod http;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client against `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient {
            http: http::shared_client(),
            base_url,
            token: None,
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer token when one is present.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}
