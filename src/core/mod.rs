pub mod types;
pub mod error;
pub mod config;
pub mod stats;
pub mod index;
pub mod database;
