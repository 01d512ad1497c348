use crate::engine::diagnostics::{Diagnostics, Warning};
use crate::engine::error::SyncError;
use crate::engine::fanout::{wait_all_with_timeout, FanoutError};
use crate::eventstore::{EventStore, EventStoreError, RecordFilter};
use crate::record::{
    hostname, relay_endpoint, RepositoryAddress, RepositoryAnnouncement, RepositoryState, SignedRecord,
    REPOSITORY_ANNOUNCEMENT_KIND, REPOSITORY_STATE_KIND,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordStatus {
    Current,
    Missing,
    Stale,
}

/// How far behind one server is, as seen by one discovery.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerSyncStatus {
    pub host: String,
    pub query_error: Option<String>,
    pub announcement: RecordStatus,
    pub state: RecordStatus,
}

impl ServerSyncStatus {
    pub fn is_errored(&self) -> bool {
        self.query_error.is_some()
    }

    pub fn needs_announcement(&self) -> bool {
        !self.is_errored() && self.announcement != RecordStatus::Current
    }

    pub fn needs_state(&self) -> bool {
        !self.is_errored() && self.state != RecordStatus::Current
    }

    pub fn is_behind(&self) -> bool {
        self.needs_announcement() || self.needs_state()
    }
}

#[derive(Clone, Debug)]
pub struct DiscoveryOutcome {
    pub announcement: RepositoryAnnouncement,
    pub state: Option<RepositoryState>,
    /// Every server queried, by hostname.
    pub servers: BTreeMap<String, ServerSyncStatus>,
    /// Mirrors to use from here on: the winning announcement's list.
    pub mirror_hosts: Vec<String>,
    pub rounds: usize,
}

impl DiscoveryOutcome {
    pub fn require_state(&self) -> Result<&RepositoryState, SyncError> {
        self.state.as_ref().ok_or_else(|| SyncError::MissingState {
            identifier: self.announcement.identifier.clone(),
        })
    }

    pub fn status(&self, host: &str) -> Option<&ServerSyncStatus> {
        self.servers.get(host)
    }

    /// Mirrors that answered but lack the winning announcement.
    pub fn mirrors_needing_announcement(&self) -> Vec<String> {
        self.mirror_hosts
            .iter()
            .filter(|host| self.status(host).map(|s| s.needs_announcement()).unwrap_or(false))
            .cloned()
            .collect()
    }
}

pub(crate) struct Discovery<'a> {
    pub(crate) event_store: &'a dyn EventStore,
    pub(crate) round_timeout: Duration,
    pub(crate) max_servers: usize,
}

#[derive(Default)]
struct HostRecords {
    error: Option<String>,
    announcements: Vec<RepositoryAnnouncement>,
    states: Vec<RepositoryState>,
}

impl<'a> Discovery<'a> {
    /// Breadth-first walk over mirror hostnames, starting at the address's relay hint and the
    /// configured mirrors. Each round's announcements name the next round's servers.
    pub(crate) async fn discover(
        &self,
        address: &RepositoryAddress,
        default_mirrors: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Result<DiscoveryOutcome, SyncError> {
        let logger = diagnostics.logger().clone();
        let filter = RecordFilter {
            kinds: vec![REPOSITORY_ANNOUNCEMENT_KIND, REPOSITORY_STATE_KIND],
            authors: vec![address.owner.clone()],
            identifiers: vec![address.identifier.clone()],
        };

        let mut frontier: Vec<String> = vec![];
        let starting_hosts = address.relay_hint.iter().chain(default_mirrors.iter());
        for host in starting_hosts.filter_map(|h| hostname(h)) {
            if !frontier.contains(&host) {
                frontier.push(host);
            }
        }
        if frontier.len() > self.max_servers {
            frontier.truncate(self.max_servers);
            diagnostics.warn(Warning::DiscoveryTruncated {
                visited: frontier.len(),
            });
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut per_host: BTreeMap<String, HostRecords> = BTreeMap::new();
        let mut rounds = 0;

        while !frontier.is_empty() {
            rounds += 1;
            slog::debug!(logger, "Discovery round {} querying {:?}", rounds, frontier);
            visited.extend(frontier.iter().cloned());

            let event_store = self.event_store;
            let filter_ref = &filter;
            let outcomes = wait_all_with_timeout(frontier, self.round_timeout, |host: String| async move {
                let endpoints = vec![relay_endpoint(&host)];
                event_store.query(&endpoints, filter_ref, self.round_timeout).await
            })
            .await;

            let mut next: Vec<String> = vec![];
            for (host, outcome) in outcomes {
                let records = self.collect_host_records(&host, address, outcome, diagnostics);
                for announcement in records.announcements.iter() {
                    for mirror in announcement.mirror_hosts.iter() {
                        if !visited.contains(mirror) && !next.contains(mirror) {
                            next.push(mirror.clone());
                        }
                    }
                }
                per_host.insert(host, records);
            }

            let room = self.max_servers.saturating_sub(visited.len());
            if next.len() > room {
                next.truncate(room);
                diagnostics.warn(Warning::DiscoveryTruncated {
                    visited: visited.len() + next.len(),
                });
            }
            frontier = next;
        }

        let announcement = per_host
            .values()
            .flat_map(|records| records.announcements.iter())
            .fold(None, |best: Option<&RepositoryAnnouncement>, candidate| match best {
                Some(current) if !candidate.raw.is_newer_than(&current.raw) => Some(current),
                _ => Some(candidate),
            })
            .cloned()
            .ok_or_else(|| SyncError::NotFound {
                owner: address.owner.clone(),
                identifier: address.identifier.clone(),
            })?;

        let state = per_host
            .values()
            .flat_map(|records| records.states.iter())
            .fold(None, |best: Option<&RepositoryState>, candidate| match best {
                Some(current) if !candidate.raw.is_newer_than(&current.raw) => Some(current),
                _ => Some(candidate),
            })
            .cloned();

        if state.is_none() {
            diagnostics.warn(Warning::MissingState);
        }

        let servers = per_host
            .iter()
            .map(|(host, records)| {
                let status = classify(host, records, &announcement, state.as_ref());
                (host.clone(), status)
            })
            .collect();

        let configured: BTreeSet<String> = default_mirrors.iter().filter_map(|h| hostname(h)).collect();
        let announced: BTreeSet<String> = announcement.mirror_hosts.iter().cloned().collect();
        if !configured.is_empty() && configured != announced {
            diagnostics.warn(Warning::MirrorListDrift {
                configured: configured.into_iter().collect(),
                announced: announced.into_iter().collect(),
            });
        }

        slog::info!(
            logger,
            "Discovered announcement {} (created_at {}) and state {:?} after {} round(s)",
            announcement.raw.id,
            announcement.created_at(),
            state.as_ref().map(|s| s.created_at()),
            rounds
        );

        Ok(DiscoveryOutcome {
            mirror_hosts: announcement.mirror_hosts.clone(),
            announcement,
            state,
            servers,
            rounds,
        })
    }

    fn collect_host_records(
        &self,
        host: &str,
        address: &RepositoryAddress,
        outcome: Result<Vec<SignedRecord>, FanoutError<EventStoreError>>,
        diagnostics: &mut Diagnostics,
    ) -> HostRecords {
        let records = match outcome {
            Ok(records) => records,
            Err(e) => {
                let reason = e.to_string();
                diagnostics.warn(Warning::ServerQueryFailed {
                    host: host.to_string(),
                    reason: reason.clone(),
                });
                return HostRecords {
                    error: Some(reason),
                    ..HostRecords::default()
                };
            }
        };

        let mut collected = HostRecords::default();
        for record in records {
            if let Err(reason) = check_record(&record, address) {
                diagnostics.warn(Warning::DiscardedRecord {
                    host: host.to_string(),
                    record_id: record.id.clone(),
                    reason: reason.to_string(),
                });
                continue;
            }

            let record_id = record.id.clone();
            let parsed = match record.kind {
                REPOSITORY_ANNOUNCEMENT_KIND => RepositoryAnnouncement::try_from(record)
                    .map(|a| collected.announcements.push(a)),
                _ => RepositoryState::try_from(record).map(|s| collected.states.push(s)),
            };
            if let Err(e) = parsed {
                diagnostics.warn(Warning::DiscardedRecord {
                    host: host.to_string(),
                    record_id,
                    reason: e.to_string(),
                });
            }
        }

        collected
    }
}

fn check_record(record: &SignedRecord, address: &RepositoryAddress) -> Result<(), &'static str> {
    if record.pubkey != address.owner {
        return Err("author is not the repository owner");
    }
    if record.kind != REPOSITORY_ANNOUNCEMENT_KIND && record.kind != REPOSITORY_STATE_KIND {
        return Err("unexpected kind");
    }
    if record.identifier() != Some(address.identifier.as_str()) {
        return Err("identifier mismatch");
    }
    if !record.verify_id() {
        return Err("id does not match content");
    }
    Ok(())
}

fn classify(
    host: &str,
    records: &HostRecords,
    announcement: &RepositoryAnnouncement,
    state: Option<&RepositoryState>,
) -> ServerSyncStatus {
    let announcement_status = if records.announcements.iter().any(|a| a.raw.id == announcement.raw.id) {
        RecordStatus::Current
    } else if records.announcements.is_empty() {
        RecordStatus::Missing
    } else {
        RecordStatus::Stale
    };

    let state_status = match state {
        None => RecordStatus::Current,
        Some(winner) => {
            if records.states.iter().any(|s| s.raw.id == winner.raw.id) {
                RecordStatus::Current
            } else if records.states.is_empty() {
                RecordStatus::Missing
            } else {
                RecordStatus::Stale
            }
        }
    };

    ServerSyncStatus {
        host: host.to_string(),
        query_error: records.error.clone(),
        announcement: announcement_status,
        state: state_status,
    }
}
