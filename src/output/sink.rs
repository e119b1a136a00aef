use super::Stream;
use std::fmt;
use std::sync::Arc;

/// Log target used for relayed mongod output.
pub const MONGOD_TARGET: &str = "memongo::mongod";

/// Destination for every line of server output.
///
/// Implementations must be cheap and non-blocking: they are called from the
/// stream-reading tasks once per line.
pub trait LogSink: Send + Sync {
    fn line(&self, server: &str, stream: Stream, line: &str);
}

/// Default sink: emits each line as a `tracing` debug event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn line(&self, server: &str, stream: Stream, line: &str) {
        tracing::debug!(target: MONGOD_TARGET, server, %stream, "{}", line);
    }
}

/// Shared, cloneable reference to a [`LogSink`].
#[derive(Clone)]
pub struct SinkRef(Arc<dyn LogSink>);

impl SinkRef {
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Self(Arc::new(sink))
    }

    pub fn line(&self, server: &str, stream: Stream, line: &str) {
        self.0.line(server, stream, line);
    }
}

impl Default for SinkRef {
    fn default() -> Self {
        Self::new(TracingSink)
    }
}

impl fmt::Debug for SinkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SinkRef(..)")
    }
}

/// Sink that keeps every line in memory. Handy in tests that assert on output.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<parking_lot::Mutex<Vec<(Stream, String)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines received so far.
    pub fn lines(&self) -> Vec<(Stream, String)> {
        self.lines.lock().clone()
    }

    pub fn lines_for(&self, stream: Stream) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(s, _)| *s == stream)
            .map(|(_, l)| l.clone())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn line(&self, _server: &str, stream: Stream, line: &str) {
        self.lines.lock().push((stream, line.to_string()));
    }
}
