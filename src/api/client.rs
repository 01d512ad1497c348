use crate::api::options::{CloneOptions, FetchOptions, PushOptions};
use crate::api::types::{CloneSummary, FetchResult, PushSummary};
use crate::engine::{DiscoveryOutcome, Report, SyncError};
use crate::orchestrator::Orchestrator;
use crate::record::RepositoryAddress;
use std::path::Path;

/// Entry point for syncing repositories whose truth lives in signed records rather than on any
/// one git server. Created by `try_create_sync_client`.
pub struct SyncClient {
    pub(crate) orchestrator: Orchestrator,
}

impl SyncClient {
    /// Clones `address` into `dest` and points `options.remote` at the logical address.
    pub async fn clone_repository(
        &self,
        address: &RepositoryAddress,
        dest: &Path,
        options: &CloneOptions,
    ) -> Result<Report<CloneSummary>, SyncError> {
        self.orchestrator.clone_repository(address, dest, options).await
    }

    /// Makes `remote`'s tracking refs in `dir` match the latest state, fetching only what is
    /// missing locally.
    pub async fn fetch(
        &self,
        dir: &Path,
        remote: &str,
        options: &FetchOptions,
    ) -> Result<Report<FetchResult>, SyncError> {
        self.orchestrator.fetch(dir, remote, options).await
    }

    /// Publishes a new state with `remote_ref` at `local_ref`'s commit, then pushes the git data
    /// to every clone URL.
    pub async fn push(
        &self,
        dir: &Path,
        local_ref: &str,
        remote_ref: &str,
        options: &PushOptions,
    ) -> Result<Report<PushSummary>, SyncError> {
        self.orchestrator.push(dir, local_ref, remote_ref, options).await
    }

    pub async fn discover(&self, address: &RepositoryAddress) -> Result<Report<DiscoveryOutcome>, SyncError> {
        let mut diagnostics = self.orchestrator.diagnostics("discover", address);
        let outcome = self.orchestrator.discover(address, &mut diagnostics).await?;
        Ok(Report::new(outcome, diagnostics))
    }
}
