use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::AssemblerConfig;
use crate::error::AssemblerError;
use crate::event::{OutputChunk, RawEvent, RawEventStream};
use crate::flush::FlushPolicy;
use crate::format::{format_block, format_tool_marker, format_tool_result};

pub type ChunkStream = Pin<Box<dyn Stream<Item = OutputChunk> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// No pull has happened yet
    Idle,
    Streaming,
    /// End of stream seen; remaining chunks are being handed out
    Draining,
    /// Upstream failed; remaining chunks end with one diagnostic
    Failed,
    Closed,
}

/// Turns one source stream into an ordered sequence of display chunks
///
/// A background producer drains the source into a bounded channel so the
/// consumer's pace never stalls the upstream read. The buffer is owned here
/// and touched only by the pulling task. Dropping the assembler cancels the
/// producer, which drops the source.
pub struct StreamAssembler {
    rx: mpsc::Receiver<RawEvent>,
    cancel: CancellationToken,
    policy: FlushPolicy,
    config: AssemblerConfig,
    state: AssemblerState,
    buffer: String,
    last_flush: Instant,
    pending: VecDeque<OutputChunk>,
}

impl StreamAssembler {
    /// Spawn a producer for `source` and return the consuming side.
    /// Must be called from within a tokio runtime.
    pub fn new(source: RawEventStream, config: AssemblerConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let cancel = CancellationToken::new();

        tokio::spawn(pump(source, tx, cancel.clone()));

        Self::from_channel(rx, cancel, config)
    }

    /// Consume an existing channel; the caller owns the producer
    pub fn from_channel(
        rx: mpsc::Receiver<RawEvent>,
        cancel: CancellationToken,
        config: AssemblerConfig,
    ) -> Self {
        Self {
            rx,
            cancel,
            policy: FlushPolicy::from(&config),
            config,
            state: AssemblerState::Idle,
            buffer: String::new(),
            last_flush: Instant::now(),
            pending: VecDeque::new(),
        }
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Text received but not yet emitted
    pub fn residual(&self) -> &str {
        &self.buffer
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the producer. Already received events are still handed out.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Next chunk, `Ok(None)` once the stream has finished.
    ///
    /// Waits at most `poll_timeout` and yields [`OutputChunk::Empty`] when
    /// nothing is ready. Pulling again after `Ok(None)` is an error.
    pub async fn next_chunk(&mut self) -> Result<Option<OutputChunk>, AssemblerError> {
        if let Some(chunk) = self.pending.pop_front() {
            return Ok(Some(chunk));
        }

        match self.state {
            AssemblerState::Closed => return Err(AssemblerError::Closed),
            AssemblerState::Draining | AssemblerState::Failed => {
                self.close();
                return Ok(None);
            }
            AssemblerState::Idle => {
                tracing::debug!("Stream assembler started");
                self.state = AssemblerState::Streaming;
                self.last_flush = Instant::now();
            }
            AssemblerState::Streaming => {}
        }

        let poll_deadline = Instant::now() + self.config.poll_timeout;

        loop {
            let deadline = match self.idle_deadline() {
                Some(idle) => idle.min(poll_deadline),
                None => poll_deadline,
            };

            match timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(event)) => self.handle_event(event),
                Ok(None) if self.cancel.is_cancelled() => {
                    // cancelled by the consumer: hand out what arrived
                    self.flush_buffer();
                    self.state = AssemblerState::Draining;
                }
                Ok(None) => {
                    self.fail("upstream closed without end-of-stream");
                }
                Err(_) => {
                    if self.policy.idle_due(self.last_flush.elapsed()) {
                        tracing::debug!(chars = self.buffer.len(), "Idle flush");
                        self.flush_buffer();
                    }
                    if self.pending.is_empty() && Instant::now() >= poll_deadline {
                        return Ok(Some(OutputChunk::Empty));
                    }
                }
            }

            if let Some(chunk) = self.pending.pop_front() {
                return Ok(Some(chunk));
            }
            if matches!(self.state, AssemblerState::Draining | AssemblerState::Failed) {
                self.close();
                return Ok(None);
            }
        }
    }

    /// Consume the assembler as a stream that ends with the source.
    pub fn into_stream(mut self) -> ChunkStream {
        Box::pin(async_stream::stream! {
            while let Ok(Some(chunk)) = self.next_chunk().await {
                yield chunk;
            }
        })
    }

    fn handle_event(&mut self, event: RawEvent) {
        match event {
            RawEvent::Text(fragment) => {
                if fragment.is_empty() {
                    return;
                }
                self.buffer.push_str(&fragment);
                self.carve_oversize();
                if self.policy.should_flush(&self.buffer, self.last_flush.elapsed()) {
                    self.flush_buffer();
                }
            }
            RawEvent::ToolCallStarted(name) => {
                self.flush_buffer();
                tracing::debug!(tool = %name, "Tool call marker");
                let rendered = format_tool_marker(&name);
                self.emit(OutputChunk::ToolCall { name, rendered });
            }
            RawEvent::ToolResult(payload) => {
                self.flush_buffer();
                self.emit(OutputChunk::ToolResult(format_tool_result(&payload)));
            }
            RawEvent::StreamError(message) => {
                self.fail(&message);
            }
            RawEvent::End => {
                self.flush_buffer();
                self.state = AssemblerState::Draining;
                self.cancel.cancel();
                tracing::debug!("End of stream");
            }
        }
    }

    /// Emit prefixes while the buffer is over the size ceiling, splitting at
    /// the last whitespace inside the limit when there is one.
    fn carve_oversize(&mut self) {
        let max = self.policy.max_chunk_chars;

        while self.policy.exceeds_size(&self.buffer) {
            let limit = self
                .buffer
                .char_indices()
                .nth(max)
                .map(|(idx, _)| idx)
                .unwrap_or(self.buffer.len());

            let split = self.buffer[..limit]
                .char_indices()
                .rev()
                .find(|(idx, c)| *idx > 0 && c.is_whitespace())
                .map(|(idx, c)| idx + c.len_utf8())
                .unwrap_or(limit);

            let rest = self.buffer.split_off(split);
            let head = std::mem::replace(&mut self.buffer, rest);
            tracing::debug!(chars = head.chars().count(), "Size flush");
            self.emit_text(&head);
        }
    }

    fn flush_buffer(&mut self) {
        if self.buffer.trim().is_empty() {
            self.buffer.clear();
            return;
        }
        let content = std::mem::take(&mut self.buffer);
        self.emit_text(&content);
    }

    fn emit_text(&mut self, content: &str) {
        let formatted = format_block(content);
        if !formatted.is_empty() {
            self.emit(OutputChunk::Text(formatted));
        }
    }

    fn emit(&mut self, chunk: OutputChunk) {
        self.pending.push_back(chunk);
        self.last_flush = Instant::now();
    }

    fn fail(&mut self, message: &str) {
        tracing::error!(error = %message, "Stream source failed");
        self.flush_buffer();
        self.emit(OutputChunk::diagnostic(message));
        self.state = AssemblerState::Failed;
        self.cancel.cancel();
    }

    fn close(&mut self) {
        self.state = AssemblerState::Closed;
        self.rx.close();
        tracing::debug!("Stream assembler closed");
    }

    fn idle_deadline(&self) -> Option<Instant> {
        if self.buffer.trim().is_empty() {
            None
        } else {
            Some(self.last_flush + self.policy.max_idle)
        }
    }
}

impl Drop for StreamAssembler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Forward `source` into `tx` until it ends, fails, or `cancel` fires.
///
/// Exhaustion of the source counts as a normal end of stream.
pub async fn pump(mut source: RawEventStream, tx: mpsc::Sender<RawEvent>, cancel: CancellationToken) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Producer cancelled");
                return;
            }
            next = source.next() => next,
        };

        let event = next.unwrap_or(RawEvent::End);
        let terminal = event.is_terminal();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Producer cancelled while sending");
                return;
            }
            sent = tx.send(event) => {
                if sent.is_err() {
                    return;
                }
            }
        }

        if terminal {
            return;
        }
    }
}
