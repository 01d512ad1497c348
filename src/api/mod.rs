//! This mod is meant to hold most of the code for the library's client-facing API.
mod client;
mod options;
mod types;
mod wiring;

pub use client::SyncClient;
pub use options::CloneOptions;
pub use options::FetchOptions;
pub use options::PushOptions;
pub use options::SyncOptions;
pub use types::CloneSummary;
pub use types::FetchResult;
pub use types::PushSummary;
pub use types::RepublishedRecord;
pub use types::ResyncSummary;
pub use wiring::try_create_sync_client;
pub use wiring::SyncClientConfig;
pub use wiring::SyncClientCreationError;

// So the orchestrator can read validated settings.
pub(crate) use options::SyncOptionsValidated;
