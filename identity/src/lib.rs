//! Identity layer for the Mooring node.
//!
//! [`IdentityValidator`] answers trust questions against chain history: is
//! this account valid, was this key valid as of a past moment, did this key
//! produce this signature and was it valid then. [`AccountProvisioner`]
//! binds a new chain identity to a local account and hands the asynchronous
//! parts of bootstrap to the job layer.

pub mod error;
pub mod provisioner;
pub mod validator;

pub use error::IdentityError;
pub use provisioner::{AccountProvisioner, CreateIdentityRequest};
pub use validator::IdentityValidator;
