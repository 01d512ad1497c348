use crate::engine::diagnostics::{Diagnostics, Warning};
use crate::git::{remote_head, remote_prefix, tracking_ref, GitError, GitOperations, RemoteRefs, WriteRefMode};
use crate::record::{Head, RepositoryState};
use std::collections::BTreeSet;
use std::path::Path;

/// What a pass of local reconciliation did. Ref names are the state's names (`refs/heads/main`,
/// `HEAD`); deleted names are local tracking refs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LocalReconciliation {
    pub updated: Vec<String>,
    pub needs_remote_data: Vec<String>,
    pub deleted: Vec<String>,
}

impl LocalReconciliation {
    pub fn is_complete(&self) -> bool {
        self.needs_remote_data.is_empty()
    }
}

/// Per-mirror difference between its live refs and the authoritative state.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RefDiff {
    pub to_create: Vec<String>,
    pub to_update: Vec<String>,
    pub to_delete: Vec<String>,
}

impl RefDiff {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Makes the remote-tracking namespace of `remote` an exact copy of `state`, as far as local
/// commit data allows. Refs whose commits are not present locally are left for a fetch.
/// The tracking namespace belongs to this crate, so every write is forced.
pub(crate) async fn reconcile_local(
    git: &dyn GitOperations,
    dir: &Path,
    remote: &str,
    state: &RepositoryState,
    diagnostics: &mut Diagnostics,
) -> Result<LocalReconciliation, GitError> {
    let mut result = LocalReconciliation::default();
    let mut expected: BTreeSet<String> = BTreeSet::new();

    for (ref_name, commit) in state.refs.iter() {
        let local_name = match tracking_ref(remote, ref_name) {
            Some(name) => name,
            None => {
                diagnostics.warn(Warning::UntrackedRef {
                    ref_name: ref_name.clone(),
                });
                continue;
            }
        };
        expected.insert(local_name.clone());

        if git.read_commit(dir, commit).await? {
            git.write_ref(dir, &local_name, commit, WriteRefMode::forced()).await?;
            result.updated.push(ref_name.clone());
        } else {
            result.needs_remote_data.push(ref_name.clone());
        }
    }

    let head_name = remote_head(remote);
    match &state.head {
        Some(Head::Symbolic(target)) => match tracking_ref(remote, target) {
            Some(local_target) => {
                git.write_ref(dir, &head_name, &local_target, WriteRefMode::symbolic_forced())
                    .await?;
                expected.insert(head_name);
                result.updated.push("HEAD".to_string());
            }
            None => diagnostics.warn(Warning::UntrackedRef {
                ref_name: target.clone(),
            }),
        },
        Some(Head::Detached(commit)) => {
            expected.insert(head_name.clone());
            if git.read_commit(dir, commit).await? {
                git.write_ref(dir, &head_name, commit, WriteRefMode::forced()).await?;
                result.updated.push("HEAD".to_string());
            } else {
                result.needs_remote_data.push("HEAD".to_string());
            }
        }
        None => {}
    }

    let existing = git.list_refs(dir, Some(&remote_prefix(remote))).await?;
    for local_name in existing.keys() {
        if !expected.contains(local_name) {
            git.delete_ref(dir, local_name).await?;
            result.deleted.push(local_name.clone());
        }
    }

    slog::debug!(
        diagnostics.logger(),
        "Local reconcile: {} updated, {} need remote data, {} deleted",
        result.updated.len(),
        result.needs_remote_data.len(),
        result.deleted.len()
    );

    Ok(result)
}

pub fn diff_against_mirror(state: &RepositoryState, mirror: &RemoteRefs) -> RefDiff {
    let live = mirror.qualified();
    let mut diff = RefDiff::default();

    for (ref_name, commit) in state.refs.iter() {
        match live.get(ref_name) {
            None => diff.to_create.push(ref_name.clone()),
            Some(live_commit) if live_commit != commit => diff.to_update.push(ref_name.clone()),
            Some(_) => {}
        }
    }
    for ref_name in live.keys() {
        if !state.refs.contains_key(ref_name) {
            diff.to_delete.push(ref_name.clone());
        }
    }

    diff
}
