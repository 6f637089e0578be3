//! Configuration
//!
//! Typed configuration loaded from environment variables plus the two
//! operator-maintained text files (quarters, status mapping).

pub mod loader;
pub mod mappings;
pub mod schema;

pub use loader::load_config;
pub use mappings::{load_quarters, load_status_mapping};
pub use schema::{CadenceConfig, DatabaseConfig, HierarchyConfig, MetricsConfig, TrackerConfig};
