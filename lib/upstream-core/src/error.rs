use thiserror::Error;

pub type Result<T> = std::result::Result<T, UpstreamError>;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Malformed endpoint '{token}': {reason}")]
    ConfigFormat { token: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to resolve {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: std::io::Error,
    },
}

impl UpstreamError {
    pub(crate) fn config_format(token: &str, reason: impl Into<String>) -> Self {
        UpstreamError::ConfigFormat {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}
