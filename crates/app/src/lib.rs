pub mod config;
pub mod error;
pub mod scheduler;
pub mod startup;
pub mod tracker;

pub use config::{LogFormat, LoggingConfig, TrackerConfig};
pub use error::{AppError, Result};
pub use scheduler::{Scheduler, log_cycle};
pub use startup::{AppPaths, ensure_app_data_dir};
pub use tracker::{CycleReport, Tracker};
