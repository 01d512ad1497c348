use crate::record::record::{RecordError, SignedRecord, UnsignedRecord, REPOSITORY_STATE_KIND};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;

const SYMBOLIC_PREFIX: &str = "ref: ";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Head {
    /// `ref: refs/heads/main`
    Symbolic(String),
    /// A commit id.
    Detached(String),
}

impl Head {
    pub fn parse(value: &str) -> Head {
        match value.strip_prefix(SYMBOLIC_PREFIX) {
            Some(target) => Head::Symbolic(target.trim().to_string()),
            None => Head::Detached(value.trim().to_string()),
        }
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Head::Symbolic(target) => write!(f, "{}{}", SYMBOLIC_PREFIX, target),
            Head::Detached(oid) => write!(f, "{}", oid),
        }
    }
}

/// The authoritative ref snapshot of a repository at one point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct RepositoryState {
    pub identifier: String,
    pub head: Option<Head>,
    pub refs: BTreeMap<String, String>,
    pub raw: SignedRecord,
}

impl RepositoryState {
    pub fn created_at(&self) -> u64 {
        self.raw.created_at
    }

    /// The branch HEAD points at, if HEAD is symbolic.
    pub fn head_ref(&self) -> Option<&str> {
        match &self.head {
            Some(Head::Symbolic(target)) => Some(target.as_str()),
            _ => None,
        }
    }

    /// The commit HEAD resolves to, if it resolves at all.
    pub fn head_commit(&self) -> Option<&str> {
        match &self.head {
            Some(Head::Symbolic(target)) => self.refs.get(target).map(String::as_str),
            Some(Head::Detached(oid)) => Some(oid.as_str()),
            None => None,
        }
    }

    pub fn commit_for(&self, ref_name: &str) -> Option<&str> {
        self.refs.get(ref_name).map(String::as_str)
    }

    pub fn to_builder(&self) -> StateBuilder {
        let preserved_tags = self
            .raw
            .tags
            .iter()
            .filter(|tag| match tag.first() {
                Some(name) => name != "d" && name != "HEAD" && !name.starts_with("refs/"),
                None => false,
            })
            .cloned()
            .collect();

        StateBuilder {
            identifier: self.identifier.clone(),
            head: self.head.clone(),
            refs: self.refs.clone(),
            preserved_tags,
            content: self.raw.content.clone(),
        }
    }
}

impl TryFrom<SignedRecord> for RepositoryState {
    type Error = RecordError;

    fn try_from(raw: SignedRecord) -> Result<Self, Self::Error> {
        if raw.kind != REPOSITORY_STATE_KIND {
            return Err(RecordError::WrongKind {
                expected: REPOSITORY_STATE_KIND,
                actual: raw.kind,
            });
        }
        let identifier = raw
            .identifier()
            .ok_or_else(|| RecordError::MissingIdentifier(raw.id.clone()))?
            .to_string();

        let mut head = None;
        let mut refs = BTreeMap::new();
        for tag in raw.tags.iter() {
            let (name, value) = match (tag.first(), tag.get(1)) {
                (Some(name), Some(value)) => (name, value),
                _ => continue,
            };

            if name == "HEAD" {
                head = Some(Head::parse(value));
            } else if name.starts_with("refs/") {
                if value.trim().is_empty() {
                    return Err(RecordError::MalformedTag {
                        record_id: raw.id.clone(),
                        tag: name.clone(),
                        reason: "empty commit id".into(),
                    });
                }
                refs.insert(name.clone(), value.trim().to_string());
            }
        }

        Ok(RepositoryState {
            identifier,
            head,
            refs,
            raw,
        })
    }
}

/// Pure-functional editor for a state record. Produces a new `UnsignedRecord` to be signed; the
/// state it was built from is left untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct StateBuilder {
    identifier: String,
    head: Option<Head>,
    refs: BTreeMap<String, String>,
    preserved_tags: Vec<Vec<String>>,
    content: String,
}

impl StateBuilder {
    pub fn new(identifier: impl Into<String>) -> Self {
        StateBuilder {
            identifier: identifier.into(),
            head: None,
            refs: BTreeMap::new(),
            preserved_tags: vec![],
            content: String::new(),
        }
    }

    pub fn with_ref(mut self, ref_name: impl Into<String>, commit: impl Into<String>) -> Self {
        self.refs.insert(ref_name.into(), commit.into());
        self
    }

    pub fn without_ref(mut self, ref_name: &str) -> Self {
        self.refs.remove(ref_name);
        self
    }

    pub fn with_head(mut self, head: Head) -> Self {
        self.head = Some(head);
        self
    }

    pub fn head(&self) -> Option<&Head> {
        self.head.as_ref()
    }

    pub fn refs(&self) -> &BTreeMap<String, String> {
        &self.refs
    }

    pub fn build(self, created_at: u64) -> UnsignedRecord {
        let mut tags = Vec::with_capacity(self.refs.len() + self.preserved_tags.len() + 2);
        tags.push(vec!["d".to_string(), self.identifier]);
        if let Some(head) = self.head {
            tags.push(vec!["HEAD".to_string(), head.to_string()]);
        }
        for (name, commit) in self.refs {
            tags.push(vec![name, commit]);
        }
        tags.extend(self.preserved_tags);

        UnsignedRecord {
            created_at,
            kind: REPOSITORY_STATE_KIND,
            tags,
            content: self.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_record(created_at: u64, tags: Vec<Vec<&str>>) -> SignedRecord {
        UnsignedRecord {
            created_at,
            kind: REPOSITORY_STATE_KIND,
            tags: tags
                .into_iter()
                .map(|t| t.into_iter().map(String::from).collect())
                .collect(),
            content: String::new(),
        }
        .into_signed("owner".into(), "sig".into())
    }

    #[test]
    fn parses_refs_and_symbolic_head() {
        let raw = state_record(
            100,
            vec![
                vec!["d", "proj1"],
                vec!["HEAD", "ref: refs/heads/main"],
                vec!["refs/heads/main", "aaa", "parent1"],
                vec!["refs/tags/v1", "ttt"],
                vec!["unknown", "keep-me"],
            ],
        );
        let state = RepositoryState::try_from(raw).unwrap();

        assert_eq!(state.identifier, "proj1");
        assert_eq!(state.head, Some(Head::Symbolic("refs/heads/main".into())));
        assert_eq!(state.head_ref(), Some("refs/heads/main"));
        assert_eq!(state.head_commit(), Some("aaa"));
        assert_eq!(state.refs.len(), 2);
        assert_eq!(state.commit_for("refs/tags/v1"), Some("ttt"));
        assert_eq!(state.created_at(), 100);
    }

    #[test]
    fn detached_head() {
        let raw = state_record(1, vec![vec!["d", "p"], vec!["HEAD", "abc"]]);
        let state = RepositoryState::try_from(raw).unwrap();
        assert_eq!(state.head_ref(), None);
        assert_eq!(state.head_commit(), Some("abc"));
    }

    #[test]
    fn rejects_empty_commit() {
        let raw = state_record(1, vec![vec!["d", "p"], vec!["refs/heads/main", ""]]);
        assert!(matches!(
            RepositoryState::try_from(raw),
            Err(RecordError::MalformedTag { .. })
        ));
    }

    #[test]
    fn builder_leaves_original_untouched() {
        let raw = state_record(
            100,
            vec![
                vec!["d", "proj1"],
                vec!["HEAD", "ref: refs/heads/main"],
                vec!["refs/heads/main", "aaa"],
                vec!["unknown", "keep-me"],
            ],
        );
        let original = RepositoryState::try_from(raw).unwrap();

        let unsigned = original
            .to_builder()
            .with_ref("refs/heads/main", "bbb")
            .with_ref("refs/heads/feature", "fff")
            .build(200);
        let updated = RepositoryState::try_from(unsigned.into_signed("owner".into(), "sig".into())).unwrap();

        assert_eq!(original.commit_for("refs/heads/main"), Some("aaa"));
        assert_eq!(updated.commit_for("refs/heads/main"), Some("bbb"));
        assert_eq!(updated.commit_for("refs/heads/feature"), Some("fff"));
        assert_eq!(updated.head_commit(), Some("bbb"));
        assert_eq!(updated.created_at(), 200);
        assert_eq!(updated.raw.first_tag_value("unknown"), Some("keep-me"));
        assert_ne!(updated.raw.id, original.raw.id);
    }

    #[test]
    fn head_display_round_trips() {
        let symbolic = Head::Symbolic("refs/heads/main".into());
        assert_eq!(Head::parse(&symbolic.to_string()), symbolic);
        let detached = Head::Detached("abc".into());
        assert_eq!(Head::parse(&detached.to_string()), detached);
    }
}
