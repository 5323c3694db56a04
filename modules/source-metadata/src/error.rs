use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetadataError>;

#[derive(Debug, Error)]
pub enum MetadataError {
    /// The request never produced an HTTP response (DNS, connect, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl MetadataError {
    /// Soft failures degrade to a hostname-only entry without flagging `error`.
    pub fn is_soft(&self) -> bool {
        matches!(self, MetadataError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_errors_are_soft() {
        assert!(MetadataError::Transport("connection refused".into()).is_soft());
        assert!(!MetadataError::Status {
            status: 404,
            url: "https://example.com".into()
        }
        .is_soft());
        assert!(!MetadataError::Body("truncated".into()).is_soft());
    }

    #[test]
    fn parse_errors_convert_to_invalid_url() {
        let err: MetadataError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, MetadataError::InvalidUrl(_)));
        assert!(!err.is_soft());
    }
}
