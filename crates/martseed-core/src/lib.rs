pub mod config;
pub mod dimensions;
pub mod error;
pub mod facts;
pub mod load;
pub mod money;
pub mod output;
pub mod report;
pub mod verify;

// Re-export key types for convenience
pub use config::WarehouseConfig;
pub use error::{MartSeedError, Result};
