pub mod agent;
pub mod cli;
pub mod core;
pub mod providers;
pub mod skills;
pub mod stream;
pub mod tools;
pub mod web;
