pub mod alert_cycle;
pub mod alert_worker;
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod rate_client;
pub mod routes;
pub mod startup;
pub mod subscriber_store;
pub mod telemetry;
pub mod utils;
