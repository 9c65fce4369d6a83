pub mod collector;
pub mod service;
