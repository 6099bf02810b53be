//! Account storage for the Mooring node.
//!
//! The [`AccountStore`] trait binds chain identities to local signing key
//! material plus delivery configuration. Backends: an in-memory store for
//! tests and short-lived processes, and a file store that keeps signing
//! secrets encrypted at rest.

pub mod account;
pub mod error;
pub mod file;
pub mod keystore;
pub mod memory;

pub use account::{Account, AccountStore, PodOperator};
pub use error::StoreError;
pub use file::FileAccountStore;
pub use memory::MemoryAccountStore;
