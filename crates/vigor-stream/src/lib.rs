//! Streaming response assembly.
//!
//! A [`SourceAdapter`] produces [`RawEvent`]s for one user turn. A
//! [`StreamAssembler`] buffers text fragments and cuts them into
//! display-ready [`OutputChunk`]s at natural boundaries, bounded by size and
//! idle time, with tool markers placed exactly where they occurred.

pub mod adapter;
pub mod assembler;
pub mod classifier;
pub mod config;
pub mod error;
pub mod event;
pub mod flush;
pub mod format;

pub use adapter::{ChatSourceAdapter, SourceAdapter, SourceOptions};
pub use assembler::{AssemblerState, ChunkStream, StreamAssembler};
pub use classifier::{classify, ChunkKind};
pub use config::AssemblerConfig;
pub use error::AssemblerError;
pub use event::{OutputChunk, RawEvent, RawEventStream, DIAGNOSTIC_PREFIX};
pub use flush::FlushPolicy;
