use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid or unrecognized token")]
    InvalidToken,
    #[error("session expired or revoked")]
    SessionExpired,
}
