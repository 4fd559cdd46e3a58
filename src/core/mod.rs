pub mod config;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
