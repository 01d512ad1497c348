use crate::record::record::{SignedRecord, UnsignedRecord};

/// Holds the owner's key. Only pushing needs one.
#[async_trait::async_trait]
pub trait Signer: Send + Sync {
    fn public_key(&self) -> String;

    async fn sign(&self, record: UnsignedRecord) -> Result<SignedRecord, SignerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("Signer refused to sign: {0}")]
    Refused(String),
    #[error("Signer unavailable: {0}")]
    Unavailable(String),
}
