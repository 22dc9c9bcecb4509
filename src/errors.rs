use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("{0}")]
    Rejected(String),

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The requested page exists but holds no rows.
    #[error("no data for this range")]
    NoData,

    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Transport and status failures share the generic alert; application
    /// failures carry the server's reason.
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status(_))
    }

    pub fn user_message(&self) -> String {
        if self.is_http() {
            format!("http error: {self}")
        } else {
            self.to_string()
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API token (set MYPAGE_API_TOKEN or pass --token)")]
    MissingToken,

    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid page limit {0:?}")]
    InvalidLimit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_get_generic_prefix() {
        let err = ApiError::Status(StatusCode::BAD_GATEWAY);
        assert_eq!(err.user_message(), "http error: unexpected status 502 Bad Gateway");
        assert!(err.is_http());
    }

    #[test]
    fn rejected_errors_show_reason_verbatim() {
        let err = ApiError::Rejected("tag not found".into());
        assert_eq!(err.user_message(), "tag not found");
        assert!(!err.is_http());
    }
}
