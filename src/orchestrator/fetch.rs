use crate::api::{FetchOptions, FetchResult};
use crate::engine::{first_success, reconcile_local, Report, SyncError, Warning};
use crate::git::{remote_head, short_branch};
use crate::orchestrator::orchestrator::Orchestrator;
use std::path::Path;

impl Orchestrator {
    pub(crate) async fn fetch(
        &self,
        dir: &Path,
        remote: &str,
        options: &FetchOptions,
    ) -> Result<Report<FetchResult>, SyncError> {
        let address = self.resolve_address(dir, remote).await?;
        let mut diagnostics = self.diagnostics("fetch", &address);
        let outcome = self.discover(&address, &mut diagnostics).await?;

        let urls = outcome.announcement.https_clone_urls.clone();
        if urls.is_empty() {
            return Err(SyncError::NoCloneUrls {
                identifier: address.identifier.clone(),
            });
        }

        let state = match &outcome.state {
            Some(state) => state,
            None => {
                // Nothing authoritative to reconcile against: behave like plain git.
                let git = self.git.as_ref();
                let attempts =
                    first_success(urls, |url: String| async move { git.fetch(&url, dir, None).await }).await;
                let mut last_error = None;
                for (url, e) in attempts.failures {
                    diagnostics.warn(Warning::FetchAttemptFailed {
                        url,
                        reason: e.to_string(),
                    });
                    last_error = Some(e);
                }
                let fetched_from = match (attempts.success, last_error) {
                    (Some((url, ())), _) => url,
                    (None, Some(e)) => return Err(SyncError::Git(e)),
                    (None, None) => {
                        return Err(SyncError::NoCloneUrls {
                            identifier: address.identifier.clone(),
                        })
                    }
                };

                let result = FetchResult {
                    head_commit: self.git.resolve_ref(dir, &remote_head(remote)).await?,
                    head_branch: None,
                    fetched_from: vec![fetched_from],
                    resync: None,
                };
                return Ok(Report::new(result, diagnostics));
            }
        };

        let mut reconciliation = reconcile_local(self.git.as_ref(), dir, remote, state, &mut diagnostics).await?;
        let mut fetched_from = vec![];
        let mut remaining_urls = urls.iter();
        while !reconciliation.is_complete() {
            let url = match remaining_urls.next() {
                Some(url) => url,
                None => {
                    let mut unresolved = reconciliation.needs_remote_data;
                    unresolved.sort();
                    return Err(SyncError::UnresolvedRefs(unresolved));
                }
            };

            slog::info!(
                diagnostics.logger(),
                "Fetching from {} for {:?}",
                url,
                reconciliation.needs_remote_data
            );
            if let Err(e) = self.git.fetch(url, dir, None).await {
                diagnostics.warn(Warning::FetchAttemptFailed {
                    url: url.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
            fetched_from.push(url.clone());
            reconciliation = reconcile_local(self.git.as_ref(), dir, remote, state, &mut diagnostics).await?;
        }

        let resync = if options.resync {
            Some(self.resync(dir, &outcome, &mut diagnostics).await)
        } else {
            None
        };

        let result = FetchResult {
            head_commit: state.head_commit().map(str::to_string),
            head_branch: state.head_ref().and_then(short_branch).map(str::to_string),
            fetched_from,
            resync,
        };
        Ok(Report::new(result, diagnostics))
    }
}
