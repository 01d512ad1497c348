use crate::eventstore::api::{EventStore, EventStoreError, RecordFilter};
use crate::record::SignedRecord;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::time::Duration;

const REPLACEABLE_KINDS: std::ops::Range<u16> = 30000..40000;

// Keeps every endpoint's records in memory. Good enough to stand in for a relay network in tests
// and in embedders that don't talk to real relays.
#[derive(Default)]
pub struct InMemoryEventStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, Vec<SignedRecord>>,
    unreachable: HashSet<String>,
    rejecting: HashSet<String>,
    latency: HashMap<String, Duration>,
    queries: HashMap<String, usize>,
    publishes: HashMap<String, usize>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record on `endpoint` without counting it as a publish.
    pub fn insert(&self, endpoint: &str, record: SignedRecord) {
        let mut inner = self.lock();
        store(inner.records.entry(endpoint.to_string()).or_default(), record);
    }

    pub fn set_unreachable(&self, endpoint: &str, unreachable: bool) {
        let mut inner = self.lock();
        if unreachable {
            inner.unreachable.insert(endpoint.to_string());
        } else {
            inner.unreachable.remove(endpoint);
        }
    }

    pub fn set_rejecting(&self, endpoint: &str, rejecting: bool) {
        let mut inner = self.lock();
        if rejecting {
            inner.rejecting.insert(endpoint.to_string());
        } else {
            inner.rejecting.remove(endpoint);
        }
    }

    pub fn set_latency(&self, endpoint: &str, latency: Duration) {
        self.lock().latency.insert(endpoint.to_string(), latency);
    }

    pub fn records(&self, endpoint: &str) -> Vec<SignedRecord> {
        self.lock().records.get(endpoint).cloned().unwrap_or_default()
    }

    pub fn query_count(&self, endpoint: &str) -> usize {
        self.lock().queries.get(endpoint).copied().unwrap_or(0)
    }

    pub fn publish_count(&self, endpoint: &str) -> usize {
        self.lock().publishes.get(endpoint).copied().unwrap_or(0)
    }

    pub fn total_publish_count(&self) -> usize {
        self.lock().publishes.values().sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked mid-update; the maps are still
        // usable.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Waits out the endpoint's simulated latency. Returns false if that exceeds `timeout`.
    async fn simulate_latency(&self, endpoint: &str, timeout: Duration) -> bool {
        let latency = self.lock().latency.get(endpoint).copied();
        match latency {
            Some(latency) if latency >= timeout => {
                tokio::time::sleep(timeout).await;
                false
            }
            Some(latency) => {
                tokio::time::sleep(latency).await;
                true
            }
            None => true,
        }
    }

    fn reachable(&self, endpoint: &str) -> bool {
        !self.lock().unreachable.contains(endpoint)
    }
}

#[async_trait::async_trait]
impl EventStore for InMemoryEventStore {
    async fn query(
        &self,
        endpoints: &[String],
        filter: &RecordFilter,
        timeout: Duration,
    ) -> Result<Vec<SignedRecord>, EventStoreError> {
        if endpoints.is_empty() {
            return Err(EventStoreError::NoEndpoints);
        }

        let mut answered = false;
        let mut last_error = EventStoreError::NoEndpoints;
        let mut found: Vec<SignedRecord> = vec![];
        for endpoint in endpoints {
            *self.lock().queries.entry(endpoint.clone()).or_default() += 1;

            if !self.reachable(endpoint) {
                last_error = EventStoreError::Unreachable(endpoint.clone());
                continue;
            }
            if !self.simulate_latency(endpoint, timeout).await {
                last_error = EventStoreError::Timeout(endpoint.clone());
                continue;
            }

            answered = true;
            let inner = self.lock();
            if let Some(records) = inner.records.get(endpoint) {
                for record in records.iter().filter(|r| filter.matches(r)) {
                    if !found.iter().any(|f| f.id == record.id) {
                        found.push(record.clone());
                    }
                }
            }
        }

        if answered {
            Ok(found)
        } else {
            Err(last_error)
        }
    }

    async fn publish(
        &self,
        endpoints: &[String],
        record: &SignedRecord,
        timeout: Duration,
    ) -> Vec<(String, Result<(), EventStoreError>)> {
        let mut results = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            *self.lock().publishes.entry(endpoint.clone()).or_default() += 1;

            let result = if !self.reachable(endpoint) {
                Err(EventStoreError::Unreachable(endpoint.clone()))
            } else if !self.simulate_latency(endpoint, timeout).await {
                Err(EventStoreError::Timeout(endpoint.clone()))
            } else if self.lock().rejecting.contains(endpoint) {
                Err(EventStoreError::Rejected {
                    endpoint: endpoint.clone(),
                    reason: "blocked".into(),
                })
            } else {
                let mut inner = self.lock();
                store(inner.records.entry(endpoint.clone()).or_default(), record.clone());
                Ok(())
            };
            results.push((endpoint.clone(), result));
        }
        results
    }
}

// Parameterized replaceable records: a relay keeps only the newest per (kind, author, d).
fn store(records: &mut Vec<SignedRecord>, record: SignedRecord) {
    if records.iter().any(|r| r.id == record.id) {
        return;
    }
    if !REPLACEABLE_KINDS.contains(&record.kind) {
        records.push(record);
        return;
    }

    let same_slot = |r: &SignedRecord| {
        r.kind == record.kind && r.pubkey == record.pubkey && r.identifier() == record.identifier()
    };
    match records.iter().position(same_slot) {
        Some(index) => {
            if record.is_newer_than(&records[index]) {
                records[index] = record;
            }
        }
        None => records.push(record),
    }
}
