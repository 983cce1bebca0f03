// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod envelope;
pub mod session_store;
pub mod sheet_client;
