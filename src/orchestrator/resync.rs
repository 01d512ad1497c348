use crate::api::{RepublishedRecord, ResyncSummary};
use crate::engine::{diff_against_mirror, Diagnostics, DiscoveryOutcome, RefDiff, Warning};
use crate::git::PushSpec;
use crate::orchestrator::orchestrator::Orchestrator;
use crate::record::{hostname, relay_endpoint, RepositoryState, SignedRecord};
use std::path::Path;

impl Orchestrator {
    /// Brings every reachable mirror up to the discovered truth: missing records are republished
    /// to the mirror's relay and its git refs are pushed to match the state. A mirror that failed
    /// discovery is left alone. Nothing here fails the caller.
    pub(crate) async fn resync(
        &self,
        dir: &Path,
        outcome: &DiscoveryOutcome,
        diagnostics: &mut Diagnostics,
    ) -> ResyncSummary {
        let mut summary = ResyncSummary::default();

        if let Some(state) = &outcome.state {
            for (url, probe) in self.probe_clone_urls(&outcome.announcement.https_clone_urls).await {
                match probe {
                    Ok(refs) => {
                        summary.diffs.insert(url, diff_against_mirror(state, &refs));
                    }
                    Err(e) => diagnostics.warn(Warning::ProbeFailed {
                        url,
                        reason: e.to_string(),
                    }),
                }
            }
        }

        for host in outcome.mirror_hosts.iter() {
            let status = match outcome.status(host) {
                Some(status) => status,
                None => continue,
            };
            if status.is_errored() {
                slog::info!(diagnostics.logger(), "Skipping resync of unreachable mirror {}", host);
                continue;
            }

            if status.needs_announcement() {
                let published = self
                    .republish(host, &outcome.announcement.raw, diagnostics)
                    .await;
                if published {
                    summary.republished.push((host.clone(), RepublishedRecord::Announcement));
                }
            }
            if let Some(state) = &outcome.state {
                if status.needs_state() && self.republish(host, &state.raw, diagnostics).await {
                    summary.republished.push((host.clone(), RepublishedRecord::State));
                }
            }
        }

        let state = match &outcome.state {
            Some(state) => state,
            None => return summary,
        };
        for (url, diff) in summary.diffs.clone() {
            if diff.is_empty() {
                continue;
            }
            let host = match hostname(&url) {
                Some(host) if outcome.mirror_hosts.contains(&host) => host,
                _ => continue,
            };
            if outcome.status(&host).map(|s| s.is_errored()).unwrap_or(true) {
                continue;
            }

            slog::info!(
                diagnostics.logger(),
                "Healing {}: {} to create, {} to update, {} to delete",
                url,
                diff.to_create.len(),
                diff.to_update.len(),
                diff.to_delete.len()
            );
            self.push_diff(dir, &url, state, &diff, &mut summary, diagnostics).await;
        }

        summary
    }

    async fn republish(&self, host: &str, record: &SignedRecord, diagnostics: &mut Diagnostics) -> bool {
        let endpoint = relay_endpoint(host);
        let results = self
            .event_store
            .publish(&[endpoint], record, self.options.publish_timeout)
            .await;

        let mut published = false;
        for (endpoint, result) in results {
            match result {
                Ok(()) => published = true,
                Err(e) => diagnostics.warn(Warning::ResyncFailed {
                    host: host.to_string(),
                    reason: format!("publishing {} to {}: {}", record.id, endpoint, e),
                }),
            }
        }
        published
    }

    async fn push_diff(
        &self,
        dir: &Path,
        url: &str,
        state: &RepositoryState,
        diff: &RefDiff,
        summary: &mut ResyncSummary,
        diagnostics: &mut Diagnostics,
    ) {
        let host = hostname(url).unwrap_or_default();
        for ref_name in diff.to_create.iter().chain(diff.to_update.iter()) {
            let commit = match state.commit_for(ref_name) {
                Some(commit) => commit,
                None => continue,
            };
            let spec = PushSpec::update(commit, ref_name.as_str(), true);
            match self.git.push(url, dir, &spec).await {
                Ok(()) => summary.refs_pushed.push((url.to_string(), ref_name.clone())),
                Err(e) => diagnostics.warn(Warning::ResyncFailed {
                    host: host.clone(),
                    reason: format!("pushing {} to {}: {}", ref_name, url, e),
                }),
            }
        }

        for ref_name in diff.to_delete.iter() {
            match self.git.push(url, dir, &PushSpec::delete(ref_name.as_str())).await {
                Ok(()) => summary.refs_deleted.push((url.to_string(), ref_name.clone())),
                Err(e) => diagnostics.warn(Warning::ResyncFailed {
                    host: host.clone(),
                    reason: format!("deleting {} on {}: {}", ref_name, url, e),
                }),
            }
        }
    }
}
