//! Path utilities for replaydeck data directories

use std::path::PathBuf;

/// Get the base replaydeck data directory (~/.replaydeck)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".replaydeck"))
        .unwrap_or_else(|| PathBuf::from(".replaydeck"))
}

/// Get the replay store path (~/.replaydeck/replays.db)
pub fn database_path() -> PathBuf {
    data_dir().join("replays.db")
}

/// Get the logs directory (~/.replaydeck/logs)
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Get the default log file path (~/.replaydeck/logs/replaydeck.log)
pub fn log_file_path() -> PathBuf {
    logs_dir().join("replaydeck.log")
}
