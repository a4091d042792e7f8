// Library interface for the binary and integration tests

pub mod config;
pub mod constants;
pub mod error;
pub mod files;
pub mod models;
pub mod resolver;
pub mod serve;
pub mod show;
pub mod state;
pub mod streaming;

pub use config::{Args, Config};
pub use serve::{build_router, serve, AppState};
