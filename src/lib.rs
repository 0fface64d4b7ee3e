pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod filters;
pub mod kv;
pub mod local_store;
pub mod logging;
pub mod mock_data;
pub mod server;
pub mod service;
