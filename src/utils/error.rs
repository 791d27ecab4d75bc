//! The `error` module defines the error types used within `acksub`.
//!
//! Most broker operations are infallible by design: publishing to an unknown
//! topic or deleting a subscription that does not exist is silently ignored.
//! The only error surfaced to callers is a failure to mint a subscriber id.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// The operating system randomness source could not produce an id.
    #[error("failed to generate subscriber id: {0}")]
    IdGeneration(#[from] rand::Error),
}
