//! Pallet call layer for the Mooring node.
//!
//! Every mutating chain operation is routed through [`proxy::ProxyDelegate`]:
//! identities never sign directly; the pod operator's key acts through a
//! previously registered proxy relationship. On top of that sit the
//! [`keystore::KeystoreRegistry`] (versioned key records per identity) and
//! the [`anchors::AnchorRegistry`] (two-phase document commitments).

pub mod anchors;
pub mod keystore;
pub mod proxy;

pub use anchors::{AnchorError, AnchorRegistry};
pub use keystore::{KeystoreError, KeystoreRegistry};
pub use proxy::{ProxyDelegate, ProxyError};
