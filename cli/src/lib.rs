//! monobuild-cli library: command implementations and renderers, exposed for unit tests.

pub mod app;
pub mod commands;
pub mod error;
pub mod progress;
pub mod render;
