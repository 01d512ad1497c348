//! Naming rules for the remote-tracking namespace this crate owns.

pub const HEADS_PREFIX: &str = "refs/heads/";
pub const TAGS_PREFIX: &str = "refs/tags/";

pub fn remote_prefix(remote: &str) -> String {
    format!("refs/remotes/{}/", remote)
}

pub fn remote_head(remote: &str) -> String {
    format!("refs/remotes/{}/HEAD", remote)
}

/// Where a ref from the authoritative state lives locally. Branches go under the remote's
/// tracking namespace; tags are shared. Other namespaces have no local home.
pub fn tracking_ref(remote: &str, ref_name: &str) -> Option<String> {
    if let Some(branch) = ref_name.strip_prefix(HEADS_PREFIX) {
        if branch.is_empty() {
            return None;
        }
        return Some(format!("{}{}", remote_prefix(remote), branch));
    }
    if let Some(tag) = ref_name.strip_prefix(TAGS_PREFIX) {
        if tag.is_empty() {
            return None;
        }
        return Some(ref_name.to_string());
    }
    None
}

/// Accepts `main`, `heads/main` or `refs/heads/main`.
pub fn qualify_branch(name: &str) -> String {
    if name.starts_with("refs/") {
        name.to_string()
    } else if let Some(rest) = name.strip_prefix("heads/") {
        format!("{}{}", HEADS_PREFIX, rest)
    } else {
        format!("{}{}", HEADS_PREFIX, name)
    }
}

pub fn short_branch(ref_name: &str) -> Option<&str> {
    ref_name.strip_prefix(HEADS_PREFIX)
}
