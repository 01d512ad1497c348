use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const REPOSITORY_ANNOUNCEMENT_KIND: u16 = 30617;
pub const REPOSITORY_STATE_KIND: u16 = 30618;

/// A record as it travels over the event store: an event in the NIP-01 shape.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SignedRecord {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    pub sig: String,
}

/// The part of a record a `Signer` commits to. The signer supplies `pubkey`, `id` and `sig`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnsignedRecord {
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum RecordError {
    #[error("Expected record of kind {expected}, got {actual}")]
    WrongKind { expected: u16, actual: u16 },
    #[error("Record {0} has no 'd' tag")]
    MissingIdentifier(String),
    #[error("Malformed tag '{tag}' in record {record_id}: {reason}")]
    MalformedTag {
        record_id: String,
        tag: String,
        reason: String,
    },
}

impl UnsignedRecord {
    /// Computes the id this record will have once signed by `pubkey`.
    pub fn compute_id(&self, pubkey: &str) -> String {
        compute_id(pubkey, self.created_at, self.kind, &self.tags, &self.content)
    }

    pub fn into_signed(self, pubkey: String, sig: String) -> SignedRecord {
        let id = self.compute_id(&pubkey);
        SignedRecord {
            id,
            pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig,
        }
    }
}

impl SignedRecord {
    /// Returns true if `id` is the hash of this record's content. Signature checks belong to the
    /// event store client.
    pub fn verify_id(&self) -> bool {
        compute_id(&self.pubkey, self.created_at, self.kind, &self.tags, &self.content) == self.id
    }

    pub fn first_tag_value(&self, name: &str) -> Option<&str> {
        first_tag_value(&self.tags, name)
    }

    /// All values of all tags called `name`, in order.
    pub fn tag_values(&self, name: &str) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|tag| tag.first().map(|n| n == name).unwrap_or(false))
            .flat_map(|tag| tag.iter().skip(1).map(String::as_str))
            .collect()
    }

    pub fn identifier(&self) -> Option<&str> {
        self.first_tag_value("d")
    }

    /// Ordering used to pick the authoritative copy: later `created_at` wins, and on equal
    /// timestamps the smaller id wins.
    pub fn is_newer_than(&self, other: &SignedRecord) -> bool {
        if self.created_at != other.created_at {
            return self.created_at > other.created_at;
        }
        self.id < other.id
    }
}

pub(crate) fn first_tag_value<'a>(tags: &'a [Vec<String>], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.first().map(|n| n == name).unwrap_or(false))
        .and_then(|tag| tag.get(1))
        .map(String::as_str)
}

fn compute_id(pubkey: &str, created_at: u64, kind: u16, tags: &[Vec<String>], content: &str) -> String {
    let canonical = serde_json::json!([0, pubkey, created_at, kind, tags, content]);
    let digest = Sha256::digest(canonical.to_string().as_bytes());
    hex::encode(digest)
}
