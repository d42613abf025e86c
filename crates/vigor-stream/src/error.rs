use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    /// A chunk was requested after the stream already finished. This is a
    /// consumer bug, not a recoverable condition.
    #[error("stream assembler is closed; no further chunks can be pulled")]
    Closed,
}
