use thiserror::Error;

/// The fixed error set of the identity layer.
///
/// Trust failures (revoked key, bad signature, non-delegate account) are
/// distinct from infrastructure failures so policy layers can map them to
/// different outcomes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid account ID")]
    InvalidAccountId,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid webhook URL")]
    InvalidWebhookUrl,

    #[error("key not found")]
    KeyNotFound,

    #[error("couldn't retrieve key")]
    KeyRetrieval,

    #[error("key is revoked")]
    KeyRevoked,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("couldn't retrieve metadata")]
    MetadataRetrieval,

    #[error("couldn't retrieve block hash")]
    BlockHashRetrieval,

    #[error("couldn't retrieve block")]
    BlockRetrieval,

    #[error("couldn't retrieve block timestamp")]
    BlockTimestampRetrieval,

    #[error("invalid account")]
    InvalidAccount,

    #[error("account is not an anonymous proxy")]
    AccountNotAnonymousProxy,

    #[error("couldn't retrieve account proxies")]
    AccountProxiesRetrieval,

    #[error("couldn't create account storage key")]
    AccountStorageKeyCreation,

    #[error("couldn't retrieve account from storage")]
    AccountStorageRetrieval,

    #[error("couldn't store account")]
    AccountStorage,

    #[error("couldn't dispatch protocol ID")]
    ProtocolIdDispatch,
}
