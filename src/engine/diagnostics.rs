/// Something went wrong that the operation recovered from. Collected per operation and returned
/// with its result so callers can act on (or assert on) specific conditions.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Warning {
    #[error("Query to {host} failed: {reason}")]
    ServerQueryFailed { host: String, reason: String },
    #[error("Discarded record {record_id} from {host}: {reason}")]
    DiscardedRecord {
        host: String,
        record_id: String,
        reason: String,
    },
    #[error("Discovery stopped after visiting {visited} servers")]
    DiscoveryTruncated { visited: usize },
    #[error("Configured mirrors {configured:?} differ from announced mirrors {announced:?}")]
    MirrorListDrift {
        configured: Vec<String>,
        announced: Vec<String>,
    },
    #[error("No state record found; falling back to plain git")]
    MissingState,
    #[error("Ref {ref_name} has no local tracking name")]
    UntrackedRef { ref_name: String },
    #[error("Refs without local commit data: {refs:?}")]
    UnresolvedRefs { refs: Vec<String> },
    #[error("Expected head commit {commit} is missing locally")]
    HeadCommitMissing { commit: String },
    #[error("Checkout of {branch} failed: {reason}")]
    CheckoutFailed { branch: String, reason: String },
    #[error("Probing {url} failed: {reason}")]
    ProbeFailed { url: String, reason: String },
    #[error("Clone from {url} failed: {reason}")]
    CloneAttemptFailed { url: String, reason: String },
    #[error("Fetch from {url} failed: {reason}")]
    FetchAttemptFailed { url: String, reason: String },
    #[error("Push to {url} failed: {reason}")]
    PushAttemptFailed { url: String, reason: String },
    #[error("Publishing {record_id} to {endpoint} failed: {reason}")]
    PublishFailed {
        endpoint: String,
        record_id: String,
        reason: String,
    },
    #[error("Resync of {host} failed: {reason}")]
    ResyncFailed { host: String, reason: String },
    #[error("Signer key {signer} is not the repository owner {owner}")]
    SignerKeyMismatch { signer: String, owner: String },
    #[error("Updating local ref {ref_name} failed: {reason}")]
    TrackingRefUpdateFailed { ref_name: String, reason: String },
}

pub struct Diagnostics {
    logger: slog::Logger,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub(crate) fn new(logger: slog::Logger) -> Self {
        Diagnostics { logger, warnings: vec![] }
    }

    pub(crate) fn logger(&self) -> &slog::Logger {
        &self.logger
    }

    pub(crate) fn warn(&mut self, warning: Warning) {
        slog::warn!(self.logger, "{}", warning);
        self.warnings.push(warning);
    }

    pub(crate) fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// The value an operation produced plus the warnings it recovered from along the way.
#[derive(Debug)]
pub struct Report<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Report<T> {
    pub(crate) fn new(value: T, diagnostics: Diagnostics) -> Self {
        Report {
            value,
            warnings: diagnostics.into_warnings(),
        }
    }

    pub fn has_warning<P: Fn(&Warning) -> bool>(&self, predicate: P) -> bool {
        self.warnings.iter().any(predicate)
    }
}
