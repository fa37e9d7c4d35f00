//! Line reader over the CLI's combined stdout and stderr.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

/// Default number of lines buffered between the pipe readers and the run loop.
pub const DEFAULT_LINE_BUFFER: usize = 64;

/// Ordered stream of text lines read from one or more pipes.
///
/// Each pipe is drained by its own task; lines from a single pipe keep their
/// order, lines from different pipes interleave in arrival order. The stream
/// ends once every pipe has reached EOF.
#[derive(Debug)]
pub struct OutputLines {
    rx: mpsc::Receiver<io::Result<String>>,
}

impl OutputLines {
    /// Read lines from a single reader.
    #[must_use]
    pub fn from_reader<R>(reader: R, buffer: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        tokio::spawn(forward_lines(reader, tx));
        Self { rx }
    }

    /// Read lines from two readers merged into one stream.
    #[must_use]
    pub fn merge<A, B>(first: A, second: B, buffer: usize) -> Self
    where
        A: AsyncRead + Unpin + Send + 'static,
        B: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        tokio::spawn(forward_lines(first, tx.clone()));
        tokio::spawn(forward_lines(second, tx));
        Self { rx }
    }

    /// Wait for the next line.
    ///
    /// Returns `None` once all readers are exhausted. Trailing `\n` / `\r\n`
    /// are stripped and invalid UTF-8 is replaced rather than rejected.
    pub async fn next_line(&mut self) -> Option<io::Result<String>> {
        self.rx.recv().await
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::Sender<io::Result<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.send(Ok(line)).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Output pipe read failed");
                let _ = tx.send(Err(e)).await;
                break;
            }
        }
    }
}
