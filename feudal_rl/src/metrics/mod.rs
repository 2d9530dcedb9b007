//! Training metrics and logging.
//!
//! ## Metrics
//!
//! - [`TrainingMetrics`]: counters for training progress
//!
//! ## Loggers
//!
//! - [`ConsoleLogger`]: column-aligned console output
//! - [`CSVLogger`]: CSV file logging for analysis
//! - [`MultiLogger`]: combine multiple loggers

pub mod logger;
pub mod training_metrics;

pub use logger::{CSVLogger, ConsoleLogger, MetricsLogger, MultiLogger, TrainingSnapshot};
pub use training_metrics::TrainingMetrics;
