//! File-backed account store.
//!
//! One JSON record per account under the store directory, named by the
//! identity's hex form. Signing secrets are encrypted at rest with the
//! store password.

use crate::account::{Account, AccountStore, PodOperator};
use crate::keystore::{decrypt_secret, encrypt_secret, EncryptedKey};
use crate::StoreError;
use mooring_crypto::keypair_from_private;
use mooring_types::{AccountId, PrivateKey, PublicKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const RECORD_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct AccountRecord {
    version: u32,
    /// Hex-encoded identity.
    identity: String,
    /// Hex-encoded signing public key.
    signing_public_key: String,
    signing_private_key: EncryptedKey,
    webhook_url: Option<String>,
    precommit_enabled: bool,
}

/// Account store persisting one encrypted JSON record per account.
pub struct FileAccountStore {
    dir: PathBuf,
    password: String,
    pod_operator: PodOperator,
}

impl FileAccountStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(
        dir: impl Into<PathBuf>,
        password: impl Into<String>,
        pod_operator: PodOperator,
    ) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| StoreError::Backend(format!("failed to create store directory: {e}")))?;
        Ok(Self {
            dir,
            password: password.into(),
            pod_operator,
        })
    }

    fn record_path(&self, identity: &AccountId) -> PathBuf {
        self.dir.join(format!("{}.json", identity.to_hex()))
    }

    fn load_record(&self, path: &Path) -> Result<Account, StoreError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Backend(format!("failed to read account record: {e}")))?;
        let record: AccountRecord = serde_json::from_str(&json)
            .map_err(|e| StoreError::Serialization(format!("invalid account record: {e}")))?;

        if record.version != RECORD_VERSION {
            return Err(StoreError::Serialization(format!(
                "unsupported account record version: {}",
                record.version
            )));
        }

        let identity = AccountId::new(decode32(&record.identity)?);
        let public = PublicKey(decode32(&record.signing_public_key)?);
        let secret = decrypt_secret(&record.signing_private_key, &self.password)?;
        let keypair = keypair_from_private(PrivateKey(secret));

        if keypair.public != public {
            return Err(StoreError::Key(
                "signing public key does not match decrypted secret".into(),
            ));
        }

        Ok(Account::new(
            identity,
            keypair,
            record.webhook_url,
            record.precommit_enabled,
        ))
    }
}

impl AccountStore for FileAccountStore {
    fn create_account(&self, account: &Account) -> Result<(), StoreError> {
        let path = self.record_path(account.identity());
        if path.exists() {
            return Err(StoreError::Duplicate(account.identity().to_string()));
        }

        let record = AccountRecord {
            version: RECORD_VERSION,
            identity: account.identity().to_hex(),
            signing_public_key: hex::encode(account.signing_public_key().as_bytes()),
            signing_private_key: encrypt_secret(&account.signing_private().0, &self.password)?,
            webhook_url: account.webhook_url().map(String::from),
            precommit_enabled: account.precommit_enabled(),
        };

        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| StoreError::Serialization(format!("JSON serialization failed: {e}")))?;
        std::fs::write(&path, json)
            .map_err(|e| StoreError::Backend(format!("failed to write account record: {e}")))?;
        Ok(())
    }

    fn account(&self, identity: &AccountId) -> Result<Account, StoreError> {
        let path = self.record_path(identity);
        if !path.exists() {
            return Err(StoreError::NotFound(identity.to_string()));
        }
        self.load_record(&path)
    }

    fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| StoreError::Backend(format!("failed to read store directory: {e}")))?;

        let mut accounts = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| StoreError::Backend(format!("failed to read entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                accounts.push(self.load_record(&path)?);
            }
        }
        Ok(accounts)
    }

    fn pod_operator(&self) -> Result<PodOperator, StoreError> {
        Ok(self.pod_operator.clone())
    }
}

fn decode32(hex_str: &str) -> Result<[u8; 32], StoreError> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| StoreError::Serialization(format!("invalid hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| StoreError::Serialization("expected 32 bytes".into()))
}
