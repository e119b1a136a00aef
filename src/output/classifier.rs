//! One-shot startup classification of mongod stdout.

use super::{classify_line, SinkRef, StartupFailure, StartupOutcome, Stream};
use super::lines::LossyLines;
use tokio::io::AsyncRead;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Set-once latch around the outcome channel.
///
/// The first call to [`OutcomeLatch::set`] sends; later calls are ignored.
/// A dropped receiver (coordinator already gave up) is not an error.
struct OutcomeLatch {
    sender: Option<oneshot::Sender<StartupOutcome>>,
}

impl OutcomeLatch {
    fn new(sender: oneshot::Sender<StartupOutcome>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    fn is_set(&self) -> bool {
        self.sender.is_none()
    }

    fn set(&mut self, outcome: StartupOutcome) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(outcome);
        }
    }
}

/// Handle to a running classifier task.
pub struct OutputClassifier {
    task: JoinHandle<()>,
}

impl OutputClassifier {
    /// Start scanning `stdout` on a background task.
    ///
    /// Every line is forwarded to `sink` for as long as the stream stays open,
    /// including lines after the outcome was sent. Exactly one outcome is ever
    /// sent on the returned receiver.
    pub fn spawn<R>(
        stdout: R,
        server: String,
        sink: SinkRef,
    ) -> (Self, oneshot::Receiver<StartupOutcome>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut latch = OutcomeLatch::new(tx);
            let mut lines = LossyLines::new(stdout);

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        sink.line(&server, Stream::Stdout, &line);

                        if latch.is_set() {
                            continue;
                        }
                        if let Some(outcome) = classify_line(&line) {
                            tracing::debug!(server = %server, ?outcome, "classified mongod output");
                            latch.set(outcome);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("reading mongod stdout for '{}' failed: {}", server, e);
                        break;
                    }
                }
            }

            latch.set(StartupOutcome::Failed(StartupFailure::ExitedBeforeReady));
        });

        (Self { task }, rx)
    }

    /// Whether the stream has closed and the task finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop forwarding output.
    pub fn abort(&self) {
        self.task.abort();
    }
}
