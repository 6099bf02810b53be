//! Delegated-authority (proxy) definitions.

use crate::identity::AccountId;
use serde::{Deserialize, Serialize};

/// The capability a proxy relationship is restricted to.
///
/// `Any` is the universal capability: a delegate holding it may execute
/// every call on behalf of the delegator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProxyType {
    Any,
    ProxyManagement,
    KeystoreManagement,
    PodOperation,
    PodAuth,
}

/// One delegation: `delegate` may act for the delegator under `proxy_type`,
/// after an announcement delay of `delay` blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyDefinition {
    pub delegate: AccountId,
    pub proxy_type: ProxyType,
    pub delay: u32,
}

/// The full set of proxy definitions registered for one delegator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStorageEntry {
    pub definitions: Vec<ProxyDefinition>,
    pub deposit: u128,
}

impl ProxyStorageEntry {
    /// Whether any definition delegates to `delegate` with the given
    /// capability or the universal one.
    pub fn delegates_to(&self, delegate: &AccountId, proxy_type: ProxyType) -> bool {
        self.definitions.iter().any(|d| {
            d.delegate == *delegate
                && (d.proxy_type == ProxyType::Any || d.proxy_type == proxy_type)
        })
    }

    /// Whether any definition carries the universal capability.
    pub fn has_any_capability(&self) -> bool {
        self.definitions
            .iter()
            .any(|d| d.proxy_type == ProxyType::Any)
    }
}
