// Library interface for CycleFem modules
// The engines are pure functions over cycle histories; records, import,
// export and config are the service layer the CLI drives.

pub mod calendar;
pub mod config;
pub mod dates;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;
pub mod prediction;
pub mod records;
pub mod risk;
pub mod statistics;

// Re-export commonly used types for convenience
pub use models::*;
pub use prediction::{predict, PredictionConfig, PredictionEngine};
pub use risk::classify;
pub use statistics::{summarize, StatisticsConfig, StatisticsEngine};
pub use records::{CycleUpdate, NewCycle, UserProfile, UserRecords};
pub use error::{CycleFemError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
