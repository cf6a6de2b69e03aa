pub mod agents;
pub mod executor;
pub mod factory;
pub mod sinks;
