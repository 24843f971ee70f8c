use reqwest::StatusCode;
use thiserror::Error;

const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum FeedError {
    /// The request could not be sent, or the connection failed mid-flight.
    #[error("network error: {0}")]
    Network(String),
    /// Missing, expired or rejected credential.
    #[error("not authorized: {0}")]
    Auth(String),
    /// Non-2xx with a body, an unexpected content type, or a malformed payload.
    #[error("invalid response{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Validation { status: Option<u16>, message: String },
    /// A like/unlike for this article is still outstanding.
    #[error("a like mutation for {0} is still pending")]
    MutationPending(String),
}

impl FeedError {
    pub fn validation(message: impl Into<String>) -> Self {
        FeedError::Validation { status: None, message: message.into() }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = preview(body);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            FeedError::Auth(format!("{status}: {message}"))
        } else {
            FeedError::Validation { status: Some(status.as_u16()), message }
        }
    }

    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FeedError::validation(err.to_string())
        } else {
            FeedError::Network(err.to_string())
        }
    }

    /// Whether the failure should be shown as a transient notification.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, FeedError::MutationPending(_))
    }
}

pub(crate) fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_PREVIEW_CHARS {
        return trimmed.to_string();
    }
    trimmed.chars().take(BODY_PREVIEW_CHARS).collect()
}
