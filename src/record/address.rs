use std::fmt;
use std::str::FromStr;

const SCHEME: &str = "nostr://";

/// Logical address of a repository, independent of any mirror that hosts it:
/// `nostr://<owner>/<identifier>` or `nostr://<owner>/<relay-host>/<identifier>`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RepositoryAddress {
    pub owner: String,
    pub relay_hint: Option<String>,
    pub identifier: String,
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
#[error("Invalid repository address '{address}': {reason}")]
pub struct AddressParseError {
    pub address: String,
    pub reason: &'static str,
}

impl RepositoryAddress {
    pub fn new(owner: impl Into<String>, identifier: impl Into<String>) -> Self {
        RepositoryAddress {
            owner: owner.into(),
            relay_hint: None,
            identifier: identifier.into(),
        }
    }

    pub fn with_relay_hint(mut self, relay_host: impl Into<String>) -> Self {
        self.relay_hint = Some(relay_host.into());
        self
    }
}

impl FromStr for RepositoryAddress {
    type Err = AddressParseError;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        let err = |reason| AddressParseError {
            address: address.to_string(),
            reason,
        };

        let rest = address.trim().strip_prefix(SCHEME).ok_or_else(|| err("missing nostr:// scheme"))?;
        let parts: Vec<&str> = rest.trim_end_matches('/').split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(err("empty path segment"));
        }

        match parts.as_slice() {
            [owner, identifier] => Ok(RepositoryAddress::new(*owner, *identifier)),
            [owner, relay, identifier] => Ok(RepositoryAddress::new(*owner, *identifier).with_relay_hint(*relay)),
            _ => Err(err("expected nostr://<owner>[/<relay>]/<identifier>")),
        }
    }
}

impl fmt::Display for RepositoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relay_hint {
            Some(relay) => write!(f, "{}{}/{}/{}", SCHEME, self.owner, relay, self.identifier),
            None => write!(f, "{}{}/{}", SCHEME, self.owner, self.identifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let plain: RepositoryAddress = "nostr://abcd/proj1".parse().unwrap();
        assert_eq!(plain, RepositoryAddress::new("abcd", "proj1"));
        assert_eq!(plain.to_string(), "nostr://abcd/proj1");

        let hinted: RepositoryAddress = "nostr://abcd/relay.example/proj1/".parse().unwrap();
        assert_eq!(hinted.relay_hint.as_deref(), Some("relay.example"));
        assert_eq!(hinted.to_string(), "nostr://abcd/relay.example/proj1");
    }

    #[test]
    fn parse_errors() {
        assert!("https://abcd/proj1".parse::<RepositoryAddress>().is_err());
        assert!("nostr://abcd".parse::<RepositoryAddress>().is_err());
        assert!("nostr://abcd//proj1".parse::<RepositoryAddress>().is_err());
        assert!("nostr://a/b/c/d".parse::<RepositoryAddress>().is_err());
    }
}
