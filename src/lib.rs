mod api;
mod engine;
mod eventstore;
mod git;
mod orchestrator;
mod record;

pub use api::try_create_sync_client;
pub use api::CloneOptions;
pub use api::CloneSummary;
pub use api::FetchOptions;
pub use api::FetchResult;
pub use api::PushOptions;
pub use api::PushSummary;
pub use api::RepublishedRecord;
pub use api::ResyncSummary;
pub use api::SyncClient;
pub use api::SyncClientConfig;
pub use api::SyncClientCreationError;
pub use api::SyncOptions;
pub use engine::diff_against_mirror;
pub use engine::Clock;
pub use engine::DiscoveryOutcome;
pub use engine::FanoutError;
pub use engine::LocalReconciliation;
pub use engine::ManualClock;
pub use engine::RealClock;
pub use engine::RecordStatus;
pub use engine::RefDiff;
pub use engine::Report;
pub use engine::ServerSyncStatus;
pub use engine::SyncError;
pub use engine::Warning;
pub use eventstore::EventStore;
pub use eventstore::EventStoreError;
pub use eventstore::InMemoryEventStore;
pub use eventstore::RecordFilter;
pub use git::GitError;
pub use git::GitOperations;
pub use git::PushSpec;
pub use git::RemoteRefs;
pub use git::WriteRefMode;
pub use record::AddressParseError;
pub use record::Head;
pub use record::RecordError;
pub use record::RepositoryAddress;
pub use record::RepositoryAnnouncement;
pub use record::RepositoryState;
pub use record::SignedRecord;
pub use record::Signer;
pub use record::SignerError;
pub use record::StateBuilder;
pub use record::UnsignedRecord;
pub use record::REPOSITORY_ANNOUNCEMENT_KIND;
pub use record::REPOSITORY_STATE_KIND;

