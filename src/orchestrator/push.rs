use crate::api::{PushOptions, PushSummary};
use crate::engine::{Diagnostics, DiscoveryOutcome, Report, SyncError, Warning};
use crate::git::{qualify_branch, tracking_ref, GitError, PushSpec, WriteRefMode, HEADS_PREFIX, TAGS_PREFIX};
use crate::orchestrator::orchestrator::Orchestrator;
use crate::record::{
    hostname, relay_endpoint, Head, RepositoryAddress, RepositoryState, SignedRecord, Signer, StateBuilder,
};
use std::convert::TryFrom;
use std::path::Path;
use std::sync::Arc;

impl Orchestrator {
    pub(crate) async fn push(
        &self,
        dir: &Path,
        local_ref: &str,
        remote_ref: &str,
        options: &PushOptions,
    ) -> Result<Report<PushSummary>, SyncError> {
        let signer = self.signer.clone().ok_or(SyncError::SigningRequired)?;

        let address = self.resolve_address(dir, &options.remote).await?;
        let mut diagnostics = self.diagnostics("push", &address);

        let local_ref = if local_ref == "HEAD" {
            local_ref.to_string()
        } else {
            qualify_branch(local_ref)
        };
        let remote_ref = qualify_branch(remote_ref);
        let local_commit = self
            .git
            .resolve_ref(dir, &local_ref)
            .await?
            .ok_or_else(|| GitError::NotFound(local_ref.clone()))?;

        let outcome = self.discover(&address, &mut diagnostics).await?;
        if outcome.announcement.https_clone_urls.is_empty() {
            return Err(SyncError::NoCloneUrls {
                identifier: address.identifier.clone(),
            });
        }

        if !options.force {
            self.check_fast_forward(dir, &outcome, &remote_ref, &local_commit, &diagnostics)
                .await?;
        }

        if signer.public_key() != address.owner {
            diagnostics.warn(Warning::SignerKeyMismatch {
                signer: signer.public_key(),
                owner: address.owner.clone(),
            });
        }

        let state = self
            .next_state(dir, &outcome, &remote_ref, &local_commit, &signer)
            .await?;

        // Records go out before git data so a provisioning mirror accepts the push.
        let mut announcement_published_to = vec![];
        for host in outcome.mirrors_needing_announcement() {
            let mut published = self
                .publish_record(vec![relay_endpoint(&host)], &outcome.announcement.raw, &mut diagnostics)
                .await;
            announcement_published_to.append(&mut published);
        }

        let state_endpoints = self.state_endpoints(&address, &outcome);
        slog::info!(
            diagnostics.logger(),
            "Publishing state {} to {:?}",
            state.raw.id,
            state_endpoints
        );
        let state_published_to = self
            .publish_record(state_endpoints, &state.raw, &mut diagnostics)
            .await;

        if !announcement_published_to.is_empty() {
            slog::info!(
                diagnostics.logger(),
                "Waiting {:?} for mirrors to provision",
                self.options.provisioning_grace
            );
            self.clock.sleep(self.options.provisioning_grace).await;
        }

        let spec = PushSpec::update(local_ref.as_str(), remote_ref.as_str(), options.force);
        let mut accepted_urls = vec![];
        let mut failures = vec![];
        for url in outcome.announcement.https_clone_urls.iter() {
            match self.git.push(url, dir, &spec).await {
                Ok(()) => {
                    slog::info!(diagnostics.logger(), "Pushed {} to {}", remote_ref, url);
                    accepted_urls.push(url.clone());
                }
                Err(e) => {
                    diagnostics.warn(Warning::PushAttemptFailed {
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                    failures.push((url.clone(), e));
                }
            }
        }
        if accepted_urls.is_empty() {
            return Err(SyncError::PushFailed(failures));
        }

        if let Some(tracking) = tracking_ref(&options.remote, &remote_ref) {
            let written = self
                .git
                .write_ref(dir, &tracking, &local_commit, WriteRefMode::forced())
                .await;
            if let Err(e) = written {
                diagnostics.warn(Warning::TrackingRefUpdateFailed {
                    ref_name: tracking,
                    reason: e.to_string(),
                });
            }
        }

        let summary = PushSummary {
            accepted_urls,
            rejected_urls: failures.into_iter().map(|(url, _)| url).collect(),
            announcement_published_to,
            state_published_to,
            state_id: state.raw.id,
        };
        Ok(Report::new(summary, diagnostics))
    }

    async fn check_fast_forward(
        &self,
        dir: &Path,
        outcome: &DiscoveryOutcome,
        remote_ref: &str,
        local_commit: &str,
        diagnostics: &Diagnostics,
    ) -> Result<(), SyncError> {
        let remote_commit = match outcome.state.as_ref().and_then(|s| s.commit_for(remote_ref)) {
            Some(commit) if commit != local_commit => commit,
            _ => return Ok(()),
        };

        match self.git.is_descendant(dir, remote_commit, local_commit).await {
            Ok(true) => Ok(()),
            ancestry => {
                if let Err(e) = ancestry {
                    slog::warn!(diagnostics.logger(), "Ancestry check failed: {}", e);
                }
                Err(SyncError::FastForwardRejected {
                    ref_name: remote_ref.to_string(),
                    remote_commit: remote_commit.to_string(),
                    local_commit: local_commit.to_string(),
                })
            }
        }
    }

    /// Signs the successor of the discovered state, or a first state synthesized from local refs.
    async fn next_state(
        &self,
        dir: &Path,
        outcome: &DiscoveryOutcome,
        remote_ref: &str,
        local_commit: &str,
        signer: &Arc<dyn Signer>,
    ) -> Result<RepositoryState, SyncError> {
        let (builder, previous_created_at) = match &outcome.state {
            Some(state) => (state.to_builder(), Some(state.created_at())),
            None => (self.synthesize_state(dir, &outcome.announcement.identifier).await?, None),
        };

        let mut builder = builder.with_ref(remote_ref, local_commit);
        if builder.head().is_none() && remote_ref.starts_with(HEADS_PREFIX) {
            builder = builder.with_head(Head::Symbolic(remote_ref.to_string()));
        }

        let created_at = successor_created_at(self.clock.unix_now(), previous_created_at).ok_or_else(|| {
            SyncError::StateTimestampExhausted {
                identifier: outcome.announcement.identifier.clone(),
                previous: previous_created_at.unwrap_or(u64::MAX),
            }
        })?;

        let signed = signer.sign(builder.build(created_at)).await?;
        Ok(RepositoryState::try_from(signed)?)
    }

    async fn synthesize_state(&self, dir: &Path, identifier: &str) -> Result<StateBuilder, GitError> {
        let mut builder = StateBuilder::new(identifier);
        for &prefix in [HEADS_PREFIX, TAGS_PREFIX].iter() {
            for (ref_name, commit) in self.git.list_refs(dir, Some(prefix)).await? {
                builder = builder.with_ref(ref_name, commit);
            }
        }

        if let Some(branch) = self.git.current_branch(dir).await? {
            builder = builder.with_head(Head::Symbolic(qualify_branch(&branch)));
        } else if let Some(commit) = self.git.resolve_ref(dir, "HEAD").await? {
            builder = builder.with_head(Head::Detached(commit));
        }
        Ok(builder)
    }

    /// Relay hints and mirror relays, normalized to endpoints; the configured defaults when the
    /// repository names neither.
    fn state_endpoints(&self, address: &RepositoryAddress, outcome: &DiscoveryOutcome) -> Vec<String> {
        let mut hosts: Vec<String> = vec![];
        let announced = outcome
            .announcement
            .relay_hints
            .iter()
            .chain(address.relay_hint.iter())
            .filter_map(|relay| hostname(relay))
            .chain(outcome.mirror_hosts.iter().cloned());
        for host in announced {
            if !hosts.contains(&host) {
                hosts.push(host);
            }
        }

        if hosts.is_empty() {
            for relay in self.default_relays.iter().filter_map(|relay| hostname(relay)) {
                if !hosts.contains(&relay) {
                    hosts.push(relay);
                }
            }
        }
        hosts.iter().map(|host| relay_endpoint(host)).collect()
    }

    /// Endpoints that accepted the record.
    async fn publish_record(
        &self,
        endpoints: Vec<String>,
        record: &SignedRecord,
        diagnostics: &mut Diagnostics,
    ) -> Vec<String> {
        let results = self
            .event_store
            .publish(&endpoints, record, self.options.publish_timeout)
            .await;

        let mut accepted = vec![];
        for (endpoint, result) in results {
            match result {
                Ok(()) => accepted.push(endpoint),
                Err(e) => diagnostics.warn(Warning::PublishFailed {
                    endpoint,
                    record_id: record.id.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        accepted
    }
}

/// A timestamp strictly after `previous` so the new state wins last-writer-wins. `None` once
/// `previous` is already the largest representable time.
fn successor_created_at(now: u64, previous: Option<u64>) -> Option<u64> {
    match previous {
        Some(previous) => previous.checked_add(1).map(|next| now.max(next)),
        None => Some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_created_at_moves_past_previous() {
        assert_eq!(successor_created_at(100, None), Some(100));
        assert_eq!(successor_created_at(100, Some(50)), Some(100));
        assert_eq!(successor_created_at(100, Some(100)), Some(101));
        assert_eq!(successor_created_at(100, Some(500)), Some(501));
    }

    #[test]
    fn successor_created_at_refuses_to_wrap() {
        assert_eq!(successor_created_at(100, Some(u64::MAX - 1)), Some(u64::MAX));
        assert_eq!(successor_created_at(100, Some(u64::MAX)), None);
        assert_eq!(successor_created_at(u64::MAX, Some(u64::MAX)), None);
    }
}
