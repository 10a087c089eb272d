//! console-core: Shared infrastructure for the inventory console workspace.
pub mod config;
pub mod observability;

pub use reqwest;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
