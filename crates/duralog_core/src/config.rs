//! Store configuration.

/// Configuration for opening a durable store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to sync the log on every commit (safer but slower).
    ///
    /// When false, commits only flush to the OS; a power loss can lose
    /// recently "committed" transactions, though the log stays consistent.
    pub sync_on_commit: bool,

    /// Whether to take a snapshot automatically when the log has grown by
    /// more than `snapshot_threshold_bytes` since the last one.
    pub auto_snapshot: bool,

    /// Log growth (in bytes) since the last snapshot that triggers an
    /// automatic snapshot.
    pub snapshot_threshold_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync_on_commit: true,
            auto_snapshot: true,
            snapshot_threshold_bytes: 4 * 1024 * 1024, // 4 MB
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to sync the log on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets whether to snapshot automatically.
    #[must_use]
    pub const fn auto_snapshot(mut self, value: bool) -> Self {
        self.auto_snapshot = value;
        self
    }

    /// Sets the automatic snapshot threshold in bytes.
    #[must_use]
    pub const fn snapshot_threshold_bytes(mut self, bytes: u64) -> Self {
        self.snapshot_threshold_bytes = bytes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.sync_on_commit);
        assert!(config.auto_snapshot);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .sync_on_commit(false)
            .auto_snapshot(false)
            .snapshot_threshold_bytes(1024);

        assert!(!config.sync_on_commit);
        assert!(!config.auto_snapshot);
        assert_eq!(config.snapshot_threshold_bytes, 1024);
    }
}
