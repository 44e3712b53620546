#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid target url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("outbound request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}
