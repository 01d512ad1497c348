use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct SyncOptions {
    pub discovery_round_timeout: Option<Duration>,
    pub probe_timeout: Option<Duration>,
    pub publish_timeout: Option<Duration>,
    pub provisioning_grace: Option<Duration>,
    pub max_discovery_servers: Option<usize>,
}

pub(crate) struct SyncOptionsValidated {
    pub discovery_round_timeout: Duration,
    pub probe_timeout: Duration,
    pub publish_timeout: Duration,
    pub provisioning_grace: Duration,
    pub max_discovery_servers: usize,
}

impl SyncOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.discovery_round_timeout.is_zero() {
            return Err("Discovery round timeout must be non-zero");
        }
        if self.probe_timeout.is_zero() || self.publish_timeout.is_zero() {
            return Err("Probe and publish timeouts must be non-zero");
        }
        if self.probe_timeout < self.discovery_round_timeout {
            return Err("Probe timeout must be at least the discovery round timeout");
        }
        if self.max_discovery_servers == 0 {
            return Err("Discovery must be allowed to query at least one server");
        }

        Ok(())
    }
}

impl TryFrom<SyncOptions> for SyncOptionsValidated {
    type Error = &'static str;

    fn try_from(options: SyncOptions) -> Result<Self, Self::Error> {
        let values = SyncOptionsValidated {
            discovery_round_timeout: options.discovery_round_timeout.unwrap_or(Duration::from_secs(1)),
            probe_timeout: options.probe_timeout.unwrap_or(Duration::from_secs(10)),
            publish_timeout: options.publish_timeout.unwrap_or(Duration::from_secs(5)),
            // Time a mirror gets to provision a repository after receiving its announcement.
            provisioning_grace: options.provisioning_grace.unwrap_or(Duration::from_secs(5)),
            max_discovery_servers: options.max_discovery_servers.unwrap_or(64),
        };

        values.validate()?;
        Ok(values)
    }
}

#[derive(Clone, Debug)]
pub struct CloneOptions {
    pub remote: String,
}

impl Default for CloneOptions {
    fn default() -> Self {
        CloneOptions {
            remote: "origin".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FetchOptions {
    /// Heal mirrors found behind during discovery once the fetch has succeeded.
    pub resync: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions { resync: true }
    }
}

#[derive(Clone, Debug)]
pub struct PushOptions {
    pub force: bool,
    pub remote: String,
}

impl Default for PushOptions {
    fn default() -> Self {
        PushOptions {
            force: false,
            remote: "origin".to_string(),
        }
    }
}
