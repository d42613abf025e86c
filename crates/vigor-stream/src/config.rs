use std::time::Duration;

pub const DEFAULT_MAX_CHUNK_CHARS: usize = 200;
pub const DEFAULT_MAX_IDLE: Duration = Duration::from_millis(500);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(150);
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Tuning knobs for a [`crate::StreamAssembler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Size ceiling for buffered text, in characters
    pub max_chunk_chars: usize,
    /// Time since the last emitted chunk after which buffered text is flushed
    pub max_idle: Duration,
    /// Longest a single pull waits before yielding a keep-alive
    pub poll_timeout: Duration,
    /// Capacity of the producer to assembler channel
    pub queue_capacity: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            max_idle: DEFAULT_MAX_IDLE,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl AssemblerConfig {
    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars.max(1);
        self
    }

    pub fn with_max_idle(mut self, max_idle: Duration) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        // tokio's mpsc panics on zero capacity
        self.queue_capacity = queue_capacity.max(1);
        self
    }
}
