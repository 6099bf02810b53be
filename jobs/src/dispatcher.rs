//! Background dispatch contract.

use mooring_types::ProtocolId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("dispatch queue unavailable: {0}")]
    Unavailable(String),

    #[error("dispatch rejected: {0}")]
    Rejected(String),
}

/// Hands a protocol identifier to the background announcement machinery.
///
/// Dispatch is fire-and-forget from the caller's perspective: a successful
/// dispatch only means the announcement was queued, and a failed one is
/// independently retryable without touching any other state.
#[allow(async_fn_in_trait)]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, protocol_id: &ProtocolId) -> Result<(), DispatchError>;
}
