mod address;
mod announcement;
mod host;
mod record;
mod signer;
mod state;

pub use address::AddressParseError;
pub use address::RepositoryAddress;
pub use announcement::RepositoryAnnouncement;
pub use record::RecordError;
pub use record::SignedRecord;
pub use record::UnsignedRecord;
pub use record::REPOSITORY_ANNOUNCEMENT_KIND;
pub use record::REPOSITORY_STATE_KIND;
pub use signer::Signer;
pub use signer::SignerError;
pub use state::Head;
pub use state::RepositoryState;
pub use state::StateBuilder;

pub(crate) use host::hostname;
pub(crate) use host::relay_endpoint;
