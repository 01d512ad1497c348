use crate::record::SignedRecord;
use tokio::time::Duration;

/// Publish/query access to a set of relays. Every call is bounded by the caller's timeout; an
/// implementation that exceeds it should return `EventStoreError::Timeout`.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Returns the union of matching records held by `endpoints`. Fails only if no endpoint
    /// answered.
    async fn query(
        &self,
        endpoints: &[String],
        filter: &RecordFilter,
        timeout: Duration,
    ) -> Result<Vec<SignedRecord>, EventStoreError>;

    /// Publishes `record` to every endpoint and reports the outcome per endpoint.
    async fn publish(
        &self,
        endpoints: &[String],
        record: &SignedRecord,
        timeout: Duration,
    ) -> Vec<(String, Result<(), EventStoreError>)>;
}

#[derive(Debug, thiserror::Error, Clone, Eq, PartialEq)]
pub enum EventStoreError {
    #[error("Relay {0} is unreachable")]
    Unreachable(String),
    #[error("Timed out talking to relay {0}")]
    Timeout(String),
    #[error("Relay {endpoint} rejected record: {reason}")]
    Rejected { endpoint: String, reason: String },
    #[error("No endpoints given")]
    NoEndpoints,
}

/// Subset of a relay subscription filter that this crate needs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordFilter {
    pub kinds: Vec<u16>,
    pub authors: Vec<String>,
    /// Values of the `d` tag.
    pub identifiers: Vec<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &SignedRecord) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&record.kind) {
            return false;
        }
        if !self.authors.is_empty() && !self.authors.contains(&record.pubkey) {
            return false;
        }
        if !self.identifiers.is_empty() {
            match record.identifier() {
                Some(d) => self.identifiers.iter().any(|i| i == d),
                None => false,
            }
        } else {
            true
        }
    }
}
