//! Discovery and reconciliation: the parts of syncing that decide what is true and what is out
//! of date, without deciding what to do about it.
mod diagnostics;
mod discovery;
mod error;
mod fanout;
mod reconcile;
mod time;

pub use diagnostics::Report;
pub use diagnostics::Warning;
pub use discovery::DiscoveryOutcome;
pub use discovery::RecordStatus;
pub use discovery::ServerSyncStatus;
pub use error::SyncError;
pub use fanout::FanoutError;
pub use reconcile::diff_against_mirror;
pub use reconcile::LocalReconciliation;
pub use reconcile::RefDiff;
pub use time::Clock;
pub use time::ManualClock;
pub use time::RealClock;

pub(crate) use diagnostics::Diagnostics;
pub(crate) use discovery::Discovery;
pub(crate) use fanout::first_success;
pub(crate) use fanout::wait_all_with_timeout;
pub(crate) use reconcile::reconcile_local;
