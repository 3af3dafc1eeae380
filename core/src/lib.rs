pub mod actions;
pub mod api;
pub mod config;
pub mod definition;
pub mod error;
pub mod executor;
pub mod runner;
