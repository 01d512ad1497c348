mod clone;
mod fetch;
mod orchestrator;
mod push;
mod resync;

pub(crate) use orchestrator::Orchestrator;
pub(crate) use orchestrator::OrchestratorConfig;
