use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The contract refused the call (revert with a reason). The reason is
    /// kept verbatim.
    #[error("rejected by contract: {0}")]
    Rejected(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("decode error: {0}")]
    Decode(String),
}
