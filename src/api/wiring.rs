use crate::api::client::SyncClient;
use crate::api::options::{SyncOptions, SyncOptionsValidated};
use crate::engine::Clock;
use crate::eventstore::EventStore;
use crate::git::GitOperations;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::record::{hostname, Signer};
use std::convert::TryFrom;
use std::sync::Arc;

pub struct SyncClientConfig {
    pub logger: slog::Logger,
    pub git: Arc<dyn GitOperations>,
    pub event_store: Arc<dyn EventStore>,
    // Clone and fetch work without one; push fails with `SigningRequired`.
    pub signer: Option<Arc<dyn Signer>>,
    pub clock: Arc<dyn Clock>,
    /// Mirror hosts (or URLs on them) to start discovery from, alongside the address's relay.
    pub default_mirrors: Vec<String>,
    /// Relays for state records of repositories that announce none.
    pub default_relays: Vec<String>,
    pub options: SyncOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncClientCreationError {
    #[error("Illegal options for configuring client: {0}")]
    IllegalClientOptions(String),
    #[error("Not a host or URL: {0}")]
    InvalidServer(String),
}

pub fn try_create_sync_client(config: SyncClientConfig) -> Result<SyncClient, SyncClientCreationError> {
    let options = SyncOptionsValidated::try_from(config.options)
        .map_err(|e| SyncClientCreationError::IllegalClientOptions(e.to_string()))?;

    let default_mirrors = normalize_hosts(config.default_mirrors)?;
    // Validated here, normalized at publish time.
    normalize_hosts(config.default_relays.clone())?;

    slog::info!(
        config.logger,
        "Creating sync client with default mirrors {:?}",
        default_mirrors
    );

    let orchestrator = Orchestrator::new(OrchestratorConfig {
        logger: config.logger,
        git: config.git,
        event_store: config.event_store,
        signer: config.signer,
        clock: config.clock,
        default_mirrors,
        default_relays: config.default_relays,
        options,
    });

    Ok(SyncClient { orchestrator })
}

fn normalize_hosts(servers: Vec<String>) -> Result<Vec<String>, SyncClientCreationError> {
    let mut hosts = Vec::with_capacity(servers.len());
    for server in servers {
        let host = hostname(&server).ok_or(SyncClientCreationError::InvalidServer(server))?;
        if !hosts.contains(&host) {
            hosts.push(host);
        }
    }
    Ok(hosts)
}
