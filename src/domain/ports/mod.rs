pub mod alias_source;
pub mod completion_port;
pub mod message_store;
pub mod metrics_store;
pub mod narrative_port;
