// Public modules
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod dates;
pub mod error;
pub mod input;
pub mod monitor;
pub mod observability;
pub mod render;
pub mod retry;
pub mod session;
pub mod tunnel;
pub mod types;

// Re-exports
pub use client::HubClient;
pub use error::{Error, Result};
pub use types::*;
