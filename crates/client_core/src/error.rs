use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("server url {0:?} must use http or https")]
    UnsupportedScheme(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{context} failed with status {status}{detail}")]
    Status {
        context: &'static str,
        status: StatusCode,
        detail: String,
    },
    #[error("websocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("websocket is not connected")]
    NotConnected,
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
