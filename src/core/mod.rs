pub mod catalog;
pub mod error;
pub mod file_store;
pub mod hooks;
pub mod mapping;
pub mod resolve;
pub mod store;
pub mod types;
pub mod validate;
