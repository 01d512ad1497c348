mod api;
mod refs;

pub use api::GitError;
pub use api::GitOperations;
pub use api::PushSpec;
pub use api::RemoteRefs;
pub use api::WriteRefMode;

pub(crate) use refs::qualify_branch;
pub(crate) use refs::remote_head;
pub(crate) use refs::remote_prefix;
pub(crate) use refs::short_branch;
pub(crate) use refs::tracking_ref;
pub(crate) use refs::HEADS_PREFIX;
pub(crate) use refs::TAGS_PREFIX;
