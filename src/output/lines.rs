use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Line reader over raw process output.
///
/// mongod and the shells may write bytes that are not valid UTF-8; those are
/// replaced rather than ending the stream. Trailing `\n` and `\r\n` are stripped.
pub(crate) struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    /// Next line, or `None` once the stream is closed.
    pub(crate) async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}
