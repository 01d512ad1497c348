use crate::record::host::hostname;
use crate::record::record::{RecordError, SignedRecord, REPOSITORY_ANNOUNCEMENT_KIND};
use std::convert::TryFrom;

/// The owner's description of a repository: where it can be cloned from and which relays carry
/// its records. Immutable; a newer description is a new record.
#[derive(Clone, Debug, PartialEq)]
pub struct RepositoryAnnouncement {
    pub owner: String,
    pub identifier: String,
    pub https_clone_urls: Vec<String>,
    /// GRASP servers: hosts serving both a clone URL and a relay.
    pub mirror_hosts: Vec<String>,
    pub relay_hints: Vec<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub web: Vec<String>,
    pub maintainers: Vec<String>,
    pub raw: SignedRecord,
}

impl RepositoryAnnouncement {
    pub fn created_at(&self) -> u64 {
        self.raw.created_at
    }

    /// Clone URLs served by `host`.
    pub fn clone_urls_on(&self, host: &str) -> Vec<&str> {
        self.https_clone_urls
            .iter()
            .filter(|url| hostname(url).as_deref() == Some(host))
            .map(String::as_str)
            .collect()
    }
}

impl TryFrom<SignedRecord> for RepositoryAnnouncement {
    type Error = RecordError;

    fn try_from(raw: SignedRecord) -> Result<Self, Self::Error> {
        if raw.kind != REPOSITORY_ANNOUNCEMENT_KIND {
            return Err(RecordError::WrongKind {
                expected: REPOSITORY_ANNOUNCEMENT_KIND,
                actual: raw.kind,
            });
        }
        let identifier = raw
            .identifier()
            .ok_or_else(|| RecordError::MissingIdentifier(raw.id.clone()))?
            .to_string();

        let https_clone_urls = dedup(raw.tag_values("clone"));
        let relay_hints = dedup(raw.tag_values("relays"));

        let relay_hosts: Vec<String> = relay_hints.iter().filter_map(|r| hostname(r)).collect();
        let mut mirror_hosts: Vec<String> = Vec::new();
        for url in https_clone_urls.iter() {
            if let Some(host) = hostname(url) {
                if relay_hosts.contains(&host) && !mirror_hosts.contains(&host) {
                    mirror_hosts.push(host);
                }
            }
        }

        Ok(RepositoryAnnouncement {
            owner: raw.pubkey.clone(),
            identifier,
            https_clone_urls,
            mirror_hosts,
            relay_hints,
            name: raw.first_tag_value("name").map(str::to_string),
            description: raw.first_tag_value("description").map(str::to_string),
            web: dedup(raw.tag_values("web")),
            maintainers: dedup(raw.tag_values("maintainers")),
            raw,
        })
    }
}

fn dedup(values: Vec<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}
