use alloc::string::String;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuantizeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("argsort index buffer has {indices} entries for {keys} keys")]
    LengthMismatch { keys: usize, indices: usize },
}
