use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("gRPC connection failed: {0}")]
    ConnectionFailed(String),

    #[error("gRPC stream error: {0}")]
    StreamError(String),

    #[error("Failed to parse transaction: {0}")]
    ParseError(String),

    #[error("Malformed transaction view: {0}")]
    ViewError(#[from] crate::view::ViewError),

    #[error("RPC error: {0}")]
    RpcError(#[from] solana_client::client_error::ClientError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel send error")]
    ChannelError,

    #[error("Maximum reconnection attempts exceeded")]
    MaxReconnectAttemptsExceeded,

    #[error("Timeout waiting for response")]
    Timeout,
}

/// Result type for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;
