pub mod inventory_service;
pub mod progress_reporter;
pub mod report_builder;
pub mod scope_resolver;
