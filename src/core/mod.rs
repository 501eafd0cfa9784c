//! Configuration, domain models and the message cache

pub mod cache;
pub mod config;
pub mod models;
