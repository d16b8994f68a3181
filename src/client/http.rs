// Parley — HTTP plumbing
//
// Shared reqwest client factory plus response-to-error mapping.
//
// The client sets a connect timeout only: `/chat` replies stream for an
// unbounded time, and an overall request deadline would cut them off.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::{Client, Response};

use crate::atoms::error::{ClientError, ClientResult};

/// Longest error-body excerpt carried in a `ClientError::Api` message.
const ERROR_BODY_EXCERPT: usize = 200;

// ── Shared client ──────────────────────────────────────────────────────

/// One connection pool for every request the process makes.
static SHARED_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
});

pub fn shared_client() -> Client {
    SHARED_CLIENT.clone()
}

// ── Response handling ──────────────────────────────────────────────────

/// Pass a 2xx response through; map anything else to a `ClientError` with
/// a truncated excerpt of the error body. 401/403 become `Auth` so callers
/// can tell a stale token from a backend fault.
pub async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = truncate_utf8(&body, ERROR_BODY_EXCERPT).to_string();
    let code = status.as_u16();

    if code == 401 || code == 403 {
        return Err(ClientError::Auth(format!("{}: {}", status, message)));
    }
    Err(ClientError::Api {
        status: code,
        message,
    })
}

/// Truncate to at most `max` bytes without splitting a character.
pub fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_utf8("hello", 10), "hello");
        assert_eq!(truncate_utf8("hello", 3), "hel");
        // "éé" is 4 bytes; cutting at 3 would split the second char.
        assert_eq!(truncate_utf8("éé", 3), "é");
        assert_eq!(truncate_utf8("", 0), "");
    }
}
