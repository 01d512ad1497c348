use crate::engine::RefDiff;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CloneSummary {
    /// The physical URL the clone came from. The repository's remote points at the logical
    /// address instead.
    pub cloned_from: String,
    pub head_commit: Option<String>,
    pub head_branch: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FetchResult {
    pub head_commit: Option<String>,
    pub head_branch: Option<String>,
    /// Clone URLs that were fetched from to find missing commit data. Empty when everything
    /// was already local.
    pub fetched_from: Vec<String>,
    pub resync: Option<ResyncSummary>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RepublishedRecord {
    Announcement,
    State,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResyncSummary {
    /// Diff of every clone URL that answered the probe.
    pub diffs: BTreeMap<String, RefDiff>,
    pub republished: Vec<(String, RepublishedRecord)>,
    /// (clone URL, ref name)
    pub refs_pushed: Vec<(String, String)>,
    pub refs_deleted: Vec<(String, String)>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PushSummary {
    pub accepted_urls: Vec<String>,
    pub rejected_urls: Vec<String>,
    pub announcement_published_to: Vec<String>,
    pub state_published_to: Vec<String>,
    pub state_id: String,
}
