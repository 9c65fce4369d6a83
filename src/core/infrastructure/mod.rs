pub mod api_client;
pub mod identity_cli;
pub mod session;
pub mod snapshot_store;
