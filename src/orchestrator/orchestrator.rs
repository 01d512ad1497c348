use crate::api::SyncOptionsValidated;
use crate::engine::{wait_all_with_timeout, Clock, Diagnostics, Discovery, DiscoveryOutcome, FanoutError, SyncError};
use crate::eventstore::EventStore;
use crate::git::{GitError, GitOperations, RemoteRefs};
use crate::record::{RepositoryAddress, Signer};
use std::path::Path;
use std::sync::Arc;

pub(crate) const REPOSITORY_CONFIG_KEY: &str = "nostr.repo";

pub(crate) struct OrchestratorConfig {
    pub logger: slog::Logger,
    pub git: Arc<dyn GitOperations>,
    pub event_store: Arc<dyn EventStore>,
    pub signer: Option<Arc<dyn Signer>>,
    pub clock: Arc<dyn Clock>,
    pub default_mirrors: Vec<String>,
    pub default_relays: Vec<String>,
    pub options: SyncOptionsValidated,
}

/// Runs clone, fetch, push and resync. Holds no per-repository state: every call discovers,
/// reconciles and acts on its own copies.
pub(crate) struct Orchestrator {
    pub(super) logger: slog::Logger,
    pub(super) git: Arc<dyn GitOperations>,
    pub(super) event_store: Arc<dyn EventStore>,
    pub(super) signer: Option<Arc<dyn Signer>>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) default_mirrors: Vec<String>,
    pub(super) default_relays: Vec<String>,
    pub(super) options: SyncOptionsValidated,
}

impl Orchestrator {
    pub(crate) fn new(config: OrchestratorConfig) -> Self {
        Orchestrator {
            logger: config.logger,
            git: config.git,
            event_store: config.event_store,
            signer: config.signer,
            clock: config.clock,
            default_mirrors: config.default_mirrors,
            default_relays: config.default_relays,
            options: config.options,
        }
    }

    pub(crate) fn diagnostics(&self, op: &'static str, address: &RepositoryAddress) -> Diagnostics {
        Diagnostics::new(
            self.logger
                .new(slog::o!("op" => op, "repo" => address.identifier.clone())),
        )
    }

    pub(crate) async fn discover(
        &self,
        address: &RepositoryAddress,
        diagnostics: &mut Diagnostics,
    ) -> Result<DiscoveryOutcome, SyncError> {
        let discovery = Discovery {
            event_store: self.event_store.as_ref(),
            round_timeout: self.options.discovery_round_timeout,
            max_servers: self.options.max_discovery_servers,
        };
        discovery.discover(address, &self.default_mirrors, diagnostics).await
    }

    /// The logical address a remote was configured with at clone time.
    pub(crate) async fn resolve_address(&self, dir: &Path, remote: &str) -> Result<RepositoryAddress, SyncError> {
        let remote_url = self.git.get_config(dir, &format!("remote.{}.url", remote)).await?;
        if let Some(url) = remote_url {
            if url.starts_with("nostr://") {
                return Ok(url.parse()?);
            }
        }

        match self.git.get_config(dir, REPOSITORY_CONFIG_KEY).await? {
            Some(address) => Ok(address.parse()?),
            None => Err(SyncError::RemoteNotConfigured {
                remote: remote.to_string(),
            }),
        }
    }

    /// Lists every URL's refs concurrently, each bounded by the probe timeout.
    pub(crate) async fn probe_clone_urls(
        &self,
        urls: &[String],
    ) -> Vec<(String, Result<RemoteRefs, FanoutError<GitError>>)> {
        let git = self.git.as_ref();
        wait_all_with_timeout(urls.to_vec(), self.options.probe_timeout, |url: String| async move {
            git.remote_refs(&url).await
        })
        .await
    }

    pub(crate) async fn configure_logical_remote(
        &self,
        dir: &Path,
        remote: &str,
        address: &RepositoryAddress,
    ) -> Result<(), GitError> {
        let logical = address.to_string();
        self.git.set_remote_url(dir, remote, &logical).await?;
        self.git.set_config(dir, REPOSITORY_CONFIG_KEY, &logical).await
    }
}
