use std::collections::BTreeMap;
use std::path::Path;

/// Plain Git primitives against a local repository (`dir`) and single remote URLs. This crate
/// decides *which* URL to talk to and *which* refs to move; the adapter does the Git work.
#[async_trait::async_trait]
pub trait GitOperations: Send + Sync {
    async fn clone_repo(&self, url: &str, dir: &Path) -> Result<(), GitError>;

    /// Downloads objects (and the adapter's own refs) from `url`. `ref_name` narrows the fetch.
    async fn fetch(&self, url: &str, dir: &Path, ref_name: Option<&str>) -> Result<(), GitError>;

    async fn push(&self, url: &str, dir: &Path, spec: &PushSpec) -> Result<(), GitError>;

    async fn remote_refs(&self, url: &str) -> Result<RemoteRefs, GitError>;

    /// Ok(false) when the commit object is not in the local store.
    async fn read_commit(&self, dir: &Path, oid: &str) -> Result<bool, GitError>;

    async fn is_descendant(&self, dir: &Path, ancestor: &str, oid: &str) -> Result<bool, GitError>;

    async fn current_branch(&self, dir: &Path) -> Result<Option<String>, GitError>;

    async fn checkout(&self, dir: &Path, ref_name: &str) -> Result<(), GitError>;

    async fn write_ref(&self, dir: &Path, ref_name: &str, value: &str, mode: WriteRefMode) -> Result<(), GitError>;

    async fn delete_ref(&self, dir: &Path, ref_name: &str) -> Result<(), GitError>;

    /// Fully-qualified ref name → commit id, for every ref under `prefix` (all refs if `None`).
    /// Symbolic refs are resolved.
    async fn list_refs(&self, dir: &Path, prefix: Option<&str>) -> Result<BTreeMap<String, String>, GitError>;

    async fn resolve_ref(&self, dir: &Path, ref_name: &str) -> Result<Option<String>, GitError>;

    async fn set_remote_url(&self, dir: &Path, remote: &str, url: &str) -> Result<(), GitError>;

    async fn set_config(&self, dir: &Path, key: &str, value: &str) -> Result<(), GitError>;

    async fn get_config(&self, dir: &Path, key: &str) -> Result<Option<String>, GitError>;
}

#[derive(Debug, thiserror::Error, Clone, Eq, PartialEq)]
pub enum GitError {
    #[error("Network failure talking to {url}: {message}")]
    Network { url: String, message: String },
    #[error("Remote {url} rejected the push: {message}")]
    Rejected { url: String, message: String },
    #[error("Object or ref not found: {0}")]
    NotFound(String),
    #[error("Local repository error: {0}")]
    Local(String),
}

/// `source` is a local ref name or commit id; `None` deletes `destination` on the remote.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PushSpec {
    pub source: Option<String>,
    pub destination: String,
    pub force: bool,
}

impl PushSpec {
    pub fn update(source: impl Into<String>, destination: impl Into<String>, force: bool) -> Self {
        PushSpec {
            source: Some(source.into()),
            destination: destination.into(),
            force,
        }
    }

    pub fn delete(destination: impl Into<String>) -> Self {
        PushSpec {
            source: None,
            destination: destination.into(),
            force: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WriteRefMode {
    pub symbolic: bool,
    pub force: bool,
}

impl WriteRefMode {
    pub fn forced() -> Self {
        WriteRefMode {
            symbolic: false,
            force: true,
        }
    }

    pub fn symbolic_forced() -> Self {
        WriteRefMode {
            symbolic: true,
            force: true,
        }
    }
}

/// A remote's branch and tag listing, keyed by short name (`main`, `v1.0`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RemoteRefs {
    pub heads: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
}

impl RemoteRefs {
    /// The listing as fully-qualified ref names.
    pub fn qualified(&self) -> BTreeMap<String, String> {
        let heads = self
            .heads
            .iter()
            .map(|(name, oid)| (format!("refs/heads/{}", name), oid.clone()));
        let tags = self
            .tags
            .iter()
            .map(|(name, oid)| (format!("refs/tags/{}", name), oid.clone()));
        heads.chain(tags).collect()
    }

    pub fn contains_commit(&self, oid: &str) -> bool {
        self.heads.values().chain(self.tags.values()).any(|v| v == oid)
    }
}
