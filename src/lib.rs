pub mod config;
pub mod import;
pub mod index;
pub mod link;
pub mod query;
pub mod store;
