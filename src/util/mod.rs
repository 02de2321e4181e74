//! Shared utilities

mod paths;

pub use paths::{data_dir, database_path, log_file_path, logs_dir};
