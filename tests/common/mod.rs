#![allow(dead_code)]

use nostr_git_sync::{
    GitError, GitOperations, InMemoryEventStore, ManualClock, PushSpec, RemoteRefs, SignedRecord, Signer,
    SignerError, SyncClient, SyncClientConfig, SyncOptions, UnsignedRecord, WriteRefMode,
    REPOSITORY_ANNOUNCEMENT_KIND, REPOSITORY_STATE_KIND,
};
use slog::Drain;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

pub const OWNER: &str = "npub1owner";
pub const IDENTIFIER: &str = "proj1";
pub const START_TIME: u64 = 1_700_000_000;

/// Git servers and local clones sharing one commit graph. Every object a server or clone "has"
/// is tracked so missing-data paths can be exercised.
#[derive(Default)]
pub struct FakeGit {
    world: Mutex<World>,
}

#[derive(Default)]
struct World {
    parents: HashMap<String, Option<String>>,
    servers: BTreeMap<String, Server>,
    repos: HashMap<PathBuf, LocalRepo>,
    unreachable: HashSet<String>,
    unlisted: HashSet<String>,
    rejecting: HashSet<String>,
    clones: Vec<String>,
    fetches: Vec<String>,
    pushes: Vec<(String, PushSpec)>,
}

#[derive(Clone, Default)]
struct Server {
    objects: HashSet<String>,
    refs: BTreeMap<String, String>,
}

#[derive(Default)]
struct LocalRepo {
    objects: HashSet<String>,
    refs: BTreeMap<String, String>,
    symbolic: BTreeMap<String, String>,
    config: BTreeMap<String, String>,
    head_branch: Option<String>,
}

impl World {
    fn ancestry(&self, oid: &str) -> Vec<String> {
        let mut commits = vec![];
        let mut next = Some(oid.to_string());
        while let Some(commit) = next {
            next = self.parents.get(&commit).cloned().flatten();
            commits.push(commit);
        }
        commits
    }

    fn server(&self, url: &str) -> Result<&Server, GitError> {
        if self.unreachable.contains(url) {
            return Err(GitError::Network {
                url: url.to_string(),
                message: "connection refused".into(),
            });
        }
        self.servers
            .get(url)
            .ok_or_else(|| GitError::NotFound(format!("repository {}", url)))
    }

    fn repo(&mut self, dir: &Path) -> Result<&mut LocalRepo, GitError> {
        self.repos
            .get_mut(dir)
            .ok_or_else(|| GitError::Local(format!("not a repository: {}", dir.display())))
    }
}

impl LocalRepo {
    fn resolve(&self, name: &str) -> Option<String> {
        if name == "HEAD" {
            return self
                .head_branch
                .as_ref()
                .and_then(|b| self.refs.get(&format!("refs/heads/{}", b)))
                .cloned();
        }
        if let Some(target) = self.symbolic.get(name) {
            return self.refs.get(target).cloned();
        }
        self.refs.get(name).cloned()
    }
}

impl FakeGit {
    pub fn new() -> Self {
        FakeGit::default()
    }

    fn lock(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap()
    }

    /// Registers a commit in the shared graph. Nobody has it until it is given to a server or repo.
    pub fn commit(&self, oid: &str, parent: Option<&str>) {
        self.lock()
            .parents
            .insert(oid.to_string(), parent.map(str::to_string));
    }

    /// A server whose refs point at `refs` (fully qualified) with all their history.
    pub fn add_server(&self, url: &str, refs: &[(&str, &str)]) {
        let mut world = self.lock();
        let mut server = Server::default();
        for (name, oid) in refs {
            server.objects.extend(world.ancestry(oid));
            server.refs.insert(name.to_string(), oid.to_string());
        }
        world.servers.insert(url.to_string(), server);
    }

    pub fn server_refs(&self, url: &str) -> BTreeMap<String, String> {
        self.lock().servers.get(url).map(|s| s.refs.clone()).unwrap_or_default()
    }

    pub fn set_unreachable(&self, url: &str) {
        self.lock().unreachable.insert(url.to_string());
    }

    /// Ref listing fails while clone, fetch and push keep working.
    pub fn set_unlisted(&self, url: &str) {
        self.lock().unlisted.insert(url.to_string());
    }

    pub fn set_rejecting(&self, url: &str) {
        self.lock().rejecting.insert(url.to_string());
    }

    /// A local repository on `branch` with the given commit checked out.
    pub fn add_local_repo(&self, dir: &Path, branch: &str, oid: &str) {
        let mut world = self.lock();
        let mut repo = LocalRepo::default();
        repo.objects.extend(world.ancestry(oid));
        repo.refs.insert(format!("refs/heads/{}", branch), oid.to_string());
        repo.head_branch = Some(branch.to_string());
        world.repos.insert(dir.to_path_buf(), repo);
    }

    /// Commits `oid` on top of the checked-out branch.
    pub fn local_commit(&self, dir: &Path, oid: &str) {
        let mut world = self.lock();
        let repo = world.repos.get(dir).unwrap();
        let branch = repo.head_branch.clone().unwrap();
        let parent = repo.refs.get(&format!("refs/heads/{}", branch)).cloned();
        world.parents.insert(oid.to_string(), parent);
        let repo = world.repos.get_mut(dir).unwrap();
        repo.objects.insert(oid.to_string());
        repo.refs.insert(format!("refs/heads/{}", branch), oid.to_string());
    }

    /// Moves a local branch, bringing the commit's history with it.
    pub fn set_local_branch(&self, dir: &Path, branch: &str, oid: &str) {
        let mut world = self.lock();
        let ancestry = world.ancestry(oid);
        let repo = world.repos.get_mut(dir).unwrap();
        repo.objects.extend(ancestry);
        repo.refs.insert(format!("refs/heads/{}", branch), oid.to_string());
    }

    pub fn set_local_config(&self, dir: &Path, key: &str, value: &str) {
        let mut world = self.lock();
        world
            .repos
            .get_mut(dir)
            .unwrap()
            .config
            .insert(key.to_string(), value.to_string());
    }

    pub fn local_refs(&self, dir: &Path, prefix: &str) -> BTreeMap<String, String> {
        let world = self.lock();
        let repo = world.repos.get(dir).unwrap();
        repo.refs
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(n, c)| (n.clone(), c.clone()))
            .collect()
    }

    pub fn local_config(&self, dir: &Path, key: &str) -> Option<String> {
        self.lock().repos.get(dir).and_then(|r| r.config.get(key).cloned())
    }

    pub fn local_head_branch(&self, dir: &Path) -> Option<String> {
        self.lock().repos.get(dir).and_then(|r| r.head_branch.clone())
    }

    pub fn clones(&self) -> Vec<String> {
        self.lock().clones.clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.lock().fetches.clone()
    }

    pub fn pushes(&self) -> Vec<(String, PushSpec)> {
        self.lock().pushes.clone()
    }
}

#[async_trait::async_trait]
impl GitOperations for FakeGit {
    async fn clone_repo(&self, url: &str, dir: &Path) -> Result<(), GitError> {
        let mut world = self.lock();
        world.clones.push(url.to_string());
        let server = world.server(url)?.clone();

        let mut repo = LocalRepo {
            objects: server.objects,
            ..LocalRepo::default()
        };
        for (name, oid) in server.refs.iter() {
            if let Some(branch) = name.strip_prefix("refs/heads/") {
                repo.refs.insert(format!("refs/remotes/origin/{}", branch), oid.clone());
            } else {
                repo.refs.insert(name.clone(), oid.clone());
            }
        }
        if let Some(main) = server.refs.get("refs/heads/main") {
            repo.refs.insert("refs/heads/main".into(), main.clone());
            repo.head_branch = Some("main".into());
        }
        repo.config.insert("remote.origin.url".into(), url.to_string());
        world.repos.insert(dir.to_path_buf(), repo);
        Ok(())
    }

    async fn fetch(&self, url: &str, dir: &Path, _ref_name: Option<&str>) -> Result<(), GitError> {
        let mut world = self.lock();
        world.fetches.push(url.to_string());
        let objects = world.server(url)?.objects.clone();
        world.repo(dir)?.objects.extend(objects);
        Ok(())
    }

    async fn push(&self, url: &str, dir: &Path, spec: &PushSpec) -> Result<(), GitError> {
        let mut world = self.lock();
        world.pushes.push((url.to_string(), spec.clone()));
        world.server(url)?;
        if world.rejecting.contains(url) {
            return Err(GitError::Rejected {
                url: url.to_string(),
                message: "pre-receive hook declined".into(),
            });
        }

        let source = match &spec.source {
            Some(source) => {
                let repo = world.repo(dir)?;
                match repo.resolve(source) {
                    Some(oid) => Some(oid),
                    None if repo.objects.contains(source) => Some(source.clone()),
                    None => return Err(GitError::NotFound(source.clone())),
                }
            }
            None => None,
        };

        match source {
            Some(oid) => {
                let current = world.servers[url].refs.get(&spec.destination).cloned();
                if let Some(current) = current {
                    if !spec.force && !world.ancestry(&oid).contains(&current) {
                        return Err(GitError::Rejected {
                            url: url.to_string(),
                            message: "non-fast-forward".into(),
                        });
                    }
                }
                let ancestry = world.ancestry(&oid);
                let server = world.servers.get_mut(url).unwrap();
                server.objects.extend(ancestry);
                server.refs.insert(spec.destination.clone(), oid);
            }
            None => {
                world.servers.get_mut(url).unwrap().refs.remove(&spec.destination);
            }
        }
        Ok(())
    }

    async fn remote_refs(&self, url: &str) -> Result<RemoteRefs, GitError> {
        let world = self.lock();
        if world.unlisted.contains(url) {
            return Err(GitError::Network {
                url: url.to_string(),
                message: "ls-remote timed out".into(),
            });
        }
        let server = world.server(url)?;
        let mut refs = RemoteRefs::default();
        for (name, oid) in server.refs.iter() {
            if let Some(branch) = name.strip_prefix("refs/heads/") {
                refs.heads.insert(branch.to_string(), oid.clone());
            } else if let Some(tag) = name.strip_prefix("refs/tags/") {
                refs.tags.insert(tag.to_string(), oid.clone());
            }
        }
        Ok(refs)
    }

    async fn read_commit(&self, dir: &Path, oid: &str) -> Result<bool, GitError> {
        Ok(self.lock().repo(dir)?.objects.contains(oid))
    }

    async fn is_descendant(&self, dir: &Path, ancestor: &str, oid: &str) -> Result<bool, GitError> {
        let mut world = self.lock();
        let repo = world.repo(dir)?;
        if !repo.objects.contains(ancestor) || !repo.objects.contains(oid) {
            return Err(GitError::Local("missing object".into()));
        }
        Ok(world.ancestry(oid).iter().any(|c| c == ancestor))
    }

    async fn current_branch(&self, dir: &Path) -> Result<Option<String>, GitError> {
        Ok(self.lock().repo(dir)?.head_branch.clone())
    }

    async fn checkout(&self, dir: &Path, ref_name: &str) -> Result<(), GitError> {
        let mut world = self.lock();
        let repo = world.repo(dir)?;
        let local = format!("refs/heads/{}", ref_name);
        if !repo.refs.contains_key(&local) {
            let tracking = repo
                .resolve(&format!("refs/remotes/origin/{}", ref_name))
                .ok_or_else(|| GitError::NotFound(ref_name.to_string()))?;
            repo.refs.insert(local, tracking);
        }
        repo.head_branch = Some(ref_name.to_string());
        Ok(())
    }

    async fn write_ref(&self, dir: &Path, ref_name: &str, value: &str, mode: WriteRefMode) -> Result<(), GitError> {
        let mut world = self.lock();
        let repo = world.repo(dir)?;
        if mode.symbolic {
            repo.refs.remove(ref_name);
            repo.symbolic.insert(ref_name.to_string(), value.to_string());
        } else {
            repo.symbolic.remove(ref_name);
            repo.refs.insert(ref_name.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn delete_ref(&self, dir: &Path, ref_name: &str) -> Result<(), GitError> {
        let mut world = self.lock();
        let repo = world.repo(dir)?;
        repo.refs.remove(ref_name);
        repo.symbolic.remove(ref_name);
        Ok(())
    }

    async fn list_refs(&self, dir: &Path, prefix: Option<&str>) -> Result<BTreeMap<String, String>, GitError> {
        let mut world = self.lock();
        let repo = world.repo(dir)?;
        let prefix = prefix.unwrap_or("");
        let mut refs: BTreeMap<String, String> = repo
            .refs
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(n, c)| (n.clone(), c.clone()))
            .collect();
        for name in repo.symbolic.keys().filter(|name| name.starts_with(prefix)) {
            if let Some(oid) = repo.resolve(name) {
                refs.insert(name.clone(), oid);
            }
        }
        Ok(refs)
    }

    async fn resolve_ref(&self, dir: &Path, ref_name: &str) -> Result<Option<String>, GitError> {
        Ok(self.lock().repo(dir)?.resolve(ref_name))
    }

    async fn set_remote_url(&self, dir: &Path, remote: &str, url: &str) -> Result<(), GitError> {
        self.set_config(dir, &format!("remote.{}.url", remote), url).await
    }

    async fn set_config(&self, dir: &Path, key: &str, value: &str) -> Result<(), GitError> {
        let mut world = self.lock();
        world.repo(dir)?.config.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_config(&self, dir: &Path, key: &str) -> Result<Option<String>, GitError> {
        Ok(self.lock().repo(dir)?.config.get(key).cloned())
    }
}

/// Signs by fixing the id; the event store fakes only check ids.
pub struct TestSigner {
    pub key: String,
}

#[async_trait::async_trait]
impl Signer for TestSigner {
    fn public_key(&self) -> String {
        self.key.clone()
    }

    async fn sign(&self, record: UnsignedRecord) -> Result<SignedRecord, SignerError> {
        Ok(record.into_signed(self.key.clone(), "test-signature".into()))
    }
}

pub struct Harness {
    pub git: Arc<FakeGit>,
    pub relays: Arc<InMemoryEventStore>,
    pub clock: Arc<ManualClock>,
    pub client: SyncClient,
}

impl Harness {
    pub fn new(default_mirrors: &[&str]) -> Self {
        Harness::with_signer(default_mirrors, Some(OWNER))
    }

    pub fn with_signer(default_mirrors: &[&str], signer: Option<&str>) -> Self {
        let git = Arc::new(FakeGit::new());
        let relays = Arc::new(InMemoryEventStore::new());
        let clock = Arc::new(ManualClock::new(START_TIME));
        let signer = signer.map(|key| Arc::new(TestSigner { key: key.to_string() }) as Arc<dyn Signer>);

        let client = nostr_git_sync::try_create_sync_client(SyncClientConfig {
            logger: create_root_logger_for_stdout(),
            git: git.clone(),
            event_store: relays.clone(),
            signer,
            clock: clock.clone(),
            default_mirrors: default_mirrors.iter().map(|m| m.to_string()).collect(),
            default_relays: vec![],
            options: SyncOptions::default(),
        })
        .unwrap();

        Harness {
            git,
            relays,
            clock,
            client,
        }
    }
}

pub fn clone_url(host: &str) -> String {
    format!("https://{}/{}/{}.git", host, OWNER, IDENTIFIER)
}

pub fn endpoint(host: &str) -> String {
    format!("wss://{}", host)
}

/// An announcement listing each host as both a clone URL and a relay.
pub fn announcement(created_at: u64, mirrors: &[&str]) -> SignedRecord {
    let mut tags = vec![vec!["d".to_string(), IDENTIFIER.to_string()]];
    let mut clone = vec!["clone".to_string()];
    clone.extend(mirrors.iter().map(|h| clone_url(h)));
    let mut relays = vec!["relays".to_string()];
    relays.extend(mirrors.iter().map(|h| endpoint(h)));
    tags.push(clone);
    tags.push(relays);
    tags.push(vec!["name".to_string(), "Project One".to_string()]);

    UnsignedRecord {
        created_at,
        kind: REPOSITORY_ANNOUNCEMENT_KIND,
        tags,
        content: String::new(),
    }
    .into_signed(OWNER.to_string(), "test-signature".into())
}

pub fn state(created_at: u64, refs: &[(&str, &str)]) -> SignedRecord {
    let mut tags = vec![
        vec!["d".to_string(), IDENTIFIER.to_string()],
        vec!["HEAD".to_string(), "ref: refs/heads/main".to_string()],
    ];
    for (name, oid) in refs {
        tags.push(vec![name.to_string(), oid.to_string()]);
    }

    UnsignedRecord {
        created_at,
        kind: REPOSITORY_STATE_KIND,
        tags,
        content: String::new(),
    }
    .into_signed(OWNER.to_string(), "test-signature".into())
}

pub fn create_root_logger_for_stdout() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("Test" => "nostr-git-sync"))
}
