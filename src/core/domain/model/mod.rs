pub mod inventory_config;
pub mod progress;
pub mod report;
pub mod resource;
pub mod scope;
pub mod service_catalog;
