use thiserror::Error;

/// Errors that end a run (or a platform's part of it) before anything is sent.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("document error: {0}")]
    Document(String),

    #[error("invalid destination {0:?}: expected T (Telegram), B (Bale) or A (all)")]
    InvalidDestination(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{platform} session failed to open: {source}")]
    Session {
        platform: &'static str,
        #[source]
        source: SendError,
    },
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Document(format!("not a readable docx archive: {err}"))
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(err: quick_xml::Error) -> Self {
        AppError::Document(format!("malformed xml: {err}"))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Config(format!("invalid config file: {err}"))
    }
}

/// Outcome of a single failed platform call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum SendError {
    /// The platform asked us to wait before resending the same unit.
    #[error("rate limited, retry in {wait_secs} seconds")]
    RateLimited { wait_secs: u64 },

    /// Anything else; the unit is abandoned.
    #[error("{detail}")]
    Fatal { detail: String },
}

impl SendError {
    pub(crate) fn fatal(detail: impl Into<String>) -> Self {
        SendError::Fatal {
            detail: detail.into(),
        }
    }
}

impl From<reqwest::Error> for SendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SendError::fatal(format!("timed out: {err}"))
        } else {
            SendError::fatal(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_display_mentions_wait() {
        let err = SendError::RateLimited { wait_secs: 7 };
        assert_eq!(err.to_string(), "rate limited, retry in 7 seconds");
    }

    #[test]
    fn test_fatal_display_is_detail() {
        assert_eq!(SendError::fatal("Forbidden").to_string(), "Forbidden");
    }

    #[test]
    fn test_invalid_destination_message() {
        let err = AppError::InvalidDestination("X".to_string());
        assert!(err.to_string().contains("\"X\""));
        assert!(err.to_string().contains("T (Telegram)"));
    }
}
