use crate::api::{CloneOptions, CloneSummary};
use crate::engine::{first_success, reconcile_local, Diagnostics, Report, SyncError, Warning};
use crate::git::{short_branch, GitError};
use crate::orchestrator::orchestrator::Orchestrator;
use crate::record::{RepositoryAddress, RepositoryState};
use std::path::Path;

impl Orchestrator {
    pub(crate) async fn clone_repository(
        &self,
        address: &RepositoryAddress,
        dest: &Path,
        options: &CloneOptions,
    ) -> Result<Report<CloneSummary>, SyncError> {
        let mut diagnostics = self.diagnostics("clone", address);
        let outcome = self.discover(address, &mut diagnostics).await?;

        let urls = outcome.announcement.https_clone_urls.clone();
        if urls.is_empty() {
            return Err(SyncError::NoCloneUrls {
                identifier: address.identifier.clone(),
            });
        }

        let state = match outcome.state {
            Some(state) => state,
            None => {
                let cloned_from = self.clone_in_order(urls, dest, &mut diagnostics).await?;
                self.configure_logical_remote(dest, &options.remote, address).await?;
                let summary = CloneSummary {
                    cloned_from,
                    head_commit: None,
                    head_branch: None,
                };
                return Ok(Report::new(summary, diagnostics));
            }
        };

        let preferred = self.pick_clone_url(&urls, &state, &mut diagnostics).await;
        let ordered = match preferred {
            Some(preferred) => {
                let mut ordered = vec![preferred.clone()];
                ordered.extend(urls.into_iter().filter(|u| *u != preferred));
                ordered
            }
            None => urls,
        };

        let cloned_from = self.clone_in_order(ordered, dest, &mut diagnostics).await?;
        self.configure_logical_remote(dest, &options.remote, address).await?;

        let reconciliation =
            reconcile_local(self.git.as_ref(), dest, &options.remote, &state, &mut diagnostics).await?;
        if !reconciliation.is_complete() {
            diagnostics.warn(Warning::UnresolvedRefs {
                refs: reconciliation.needs_remote_data,
            });
        }

        self.validate_clone(dest, &state, &mut diagnostics).await;

        let summary = CloneSummary {
            cloned_from,
            head_commit: state.head_commit().map(str::to_string),
            head_branch: state.head_ref().and_then(short_branch).map(str::to_string),
        };
        Ok(Report::new(summary, diagnostics))
    }

    /// First URL (in announcement order) already serving the state's head commit; otherwise the
    /// last URL that answered at all.
    async fn pick_clone_url(
        &self,
        urls: &[String],
        state: &RepositoryState,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        let probes = self.probe_clone_urls(urls).await;

        let mut last_reachable = None;
        for (url, probe) in probes {
            match probe {
                Ok(refs) => {
                    if let Some(head_commit) = state.head_commit() {
                        if refs.contains_commit(head_commit) {
                            slog::info!(diagnostics.logger(), "{} has head commit {}", url, head_commit);
                            return Some(url);
                        }
                    }
                    last_reachable = Some(url);
                }
                Err(e) => diagnostics.warn(Warning::ProbeFailed {
                    url,
                    reason: e.to_string(),
                }),
            }
        }

        last_reachable
    }

    async fn clone_in_order(
        &self,
        urls: Vec<String>,
        dest: &Path,
        diagnostics: &mut Diagnostics,
    ) -> Result<String, SyncError> {
        let git = self.git.as_ref();
        let attempts = first_success(urls, |url: String| async move { git.clone_repo(&url, dest).await }).await;

        let mut last_error = None;
        for (url, e) in attempts.failures {
            diagnostics.warn(Warning::CloneAttemptFailed {
                url,
                reason: e.to_string(),
            });
            last_error = Some(e);
        }

        match (attempts.success, last_error) {
            (Some((url, ())), _) => {
                slog::info!(diagnostics.logger(), "Cloned from {}", url);
                Ok(url)
            }
            (None, Some(e)) => Err(SyncError::Git(e)),
            // Callers never pass an empty list.
            (None, None) => Err(SyncError::Git(GitError::NotFound("no clone URL to try".into()))),
        }
    }

    // Problems here are reported, never fatal: the clone itself already succeeded.
    async fn validate_clone(&self, dest: &Path, state: &RepositoryState, diagnostics: &mut Diagnostics) {
        if let Some(head_commit) = state.head_commit() {
            match self.git.read_commit(dest, head_commit).await {
                Ok(true) => {}
                _ => diagnostics.warn(Warning::HeadCommitMissing {
                    commit: head_commit.to_string(),
                }),
            }
        }

        if let Some(branch) = state.head_ref().and_then(short_branch) {
            if let Err(e) = self.git.checkout(dest, branch).await {
                diagnostics.warn(Warning::CheckoutFailed {
                    branch: branch.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
}
