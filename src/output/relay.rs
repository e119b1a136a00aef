use super::{SinkRef, Stream};
use super::lines::LossyLines;
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;

/// Forwards mongod stderr to the sink. No classification happens here.
pub struct StderrRelay {
    task: JoinHandle<()>,
}

impl StderrRelay {
    pub fn spawn<R>(stderr: R, server: String, sink: SinkRef) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut lines = LossyLines::new(stderr);
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => sink.line(&server, Stream::Stderr, &line),
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("reading mongod stderr for '{}' failed: {}", server, e);
                        break;
                    }
                }
            }
        });
        Self { task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}
