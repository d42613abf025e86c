use std::time::Duration;

use crate::classifier::classify;
use crate::config::AssemblerConfig;

/// Decides when buffered text becomes a chunk
///
/// Natural text boundaries flush first. The size and idle bounds guarantee
/// progress on streams that never produce a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPolicy {
    pub max_chunk_chars: usize,
    pub max_idle: Duration,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self::from(&AssemblerConfig::default())
    }
}

impl From<&AssemblerConfig> for FlushPolicy {
    fn from(config: &AssemblerConfig) -> Self {
        Self {
            max_chunk_chars: config.max_chunk_chars,
            max_idle: config.max_idle,
        }
    }
}

impl FlushPolicy {
    pub fn should_flush(&self, buffer: &str, elapsed: Duration) -> bool {
        if buffer.trim().is_empty() {
            return false;
        }
        if classify(buffer).is_boundary() {
            return true;
        }
        if self.exceeds_size(buffer) {
            return true;
        }
        self.idle_due(elapsed)
    }

    pub fn exceeds_size(&self, buffer: &str) -> bool {
        buffer.chars().count() > self.max_chunk_chars
    }

    /// The idle bound is inclusive so a timer set for exactly `max_idle` fires
    pub fn idle_due(&self, elapsed: Duration) -> bool {
        elapsed >= self.max_idle
    }
}
