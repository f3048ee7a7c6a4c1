pub mod alias_repo;
pub mod message_repo;
pub mod metrics_repo;
pub mod migrations;
