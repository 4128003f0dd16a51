//! Driver configuration

/// Channel driver configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Commands that may be queued before senders wait
    pub command_capacity: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            command_capacity: 256,
        }
    }
}

impl DriverConfig {
    /// Set the command queue capacity (at least 1)
    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }
}
