use url::Url;

/// Extracts a lowercase hostname (with port, if any) from a URL or a bare hostname.
pub fn hostname(url_or_host: &str) -> Option<String> {
    let trimmed = url_or_host.trim();
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed.contains("://") {
        let host = trimmed.split('/').next().unwrap_or(trimmed);
        return if host.is_empty() { None } else { Some(host.to_lowercase()) };
    }

    let parsed = Url::parse(trimmed).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    match parsed.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// The relay endpoint a host speaks the event store protocol on.
pub fn relay_endpoint(host: &str) -> String {
    format!("wss://{}", host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostnames() {
        assert_eq!(hostname("https://A.example/npub/x.git"), Some("a.example".to_string()));
        assert_eq!(hostname("wss://relay.example/"), Some("relay.example".to_string()));
        assert_eq!(hostname("wss://relay.example:7777"), Some("relay.example:7777".to_string()));
        assert_eq!(hostname("b.example"), Some("b.example".to_string()));
        assert_eq!(hostname("  "), None);
        assert_eq!(hostname("https://"), None);
    }
}
