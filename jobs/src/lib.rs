//! Background work for the Mooring node.
//!
//! The pallet and identity layers stay synchronous and retry-free; anything
//! that must wait for chain state to appear lives here — the dispatch
//! contract for network announcements, the bounded-retry helper, and the
//! out-of-band key-registration task.

pub mod dispatcher;
pub mod register_keys;
pub mod retry;

pub use dispatcher::{DispatchError, Dispatcher};
pub use register_keys::{RegisterKeys, RegisterKeysError};
