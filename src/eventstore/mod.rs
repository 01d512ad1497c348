mod api;
mod in_memory;

pub use api::EventStore;
pub use api::EventStoreError;
pub use api::RecordFilter;
pub use in_memory::InMemoryEventStore;
