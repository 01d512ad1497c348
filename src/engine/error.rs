use crate::git::GitError;
use crate::record::{AddressParseError, RecordError, SignerError};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("No announcement found for {identifier} owned by {owner}")]
    NotFound { owner: String, identifier: String },

    // Informational for clone/fetch/push. Raised only where a caller insists on having a state.
    #[error("Repository {identifier} has no state record")]
    MissingState { identifier: String },

    #[error("Announcement for {identifier} lists no clone URLs")]
    NoCloneUrls { identifier: String },

    #[error("Push of {ref_name} rejected: {local_commit} does not descend from {remote_commit}")]
    FastForwardRejected {
        ref_name: String,
        remote_commit: String,
        local_commit: String,
    },

    #[error("Commit data for {0:?} was not found on any clone URL")]
    UnresolvedRefs(Vec<String>),

    #[error("Every clone URL rejected the push")]
    PushFailed(Vec<(String, GitError)>),

    #[error("State for {identifier} has created_at {previous}; no later timestamp exists")]
    StateTimestampExhausted { identifier: String, previous: u64 },

    #[error("Pushing requires a signer")]
    SigningRequired,

    #[error(transparent)]
    InvalidAddress(#[from] AddressParseError),

    #[error("Remote {remote} has no repository address configured")]
    RemoteNotConfigured { remote: String },

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error("Record produced by signer is invalid: {0}")]
    Record(#[from] RecordError),
}
