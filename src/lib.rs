pub mod configuration;
pub mod dispatch;
pub mod domain;
pub mod email_client;
pub mod lifecycle;
pub mod routes;
pub mod signed_link;
pub mod startup;
pub mod storage;
pub mod telemetry;
