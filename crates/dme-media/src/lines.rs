//! Line splitting for transcoder output.
//!
//! FFmpeg redraws its status line with `\r`, so both `\r` and `\n` end a
//! line here. Bytes are decoded lossily and empty segments are dropped.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::trace;

/// Read one `\r`/`\n`-terminated segment into `buf` (terminator excluded).
///
/// Returns the number of bytes consumed, 0 at end of stream.
pub async fn read_segment<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut consumed = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(consumed);
        }

        match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
            Some(i) => {
                buf.extend_from_slice(&available[..i]);
                reader.consume(i + 1);
                return Ok(consumed + i + 1);
            }
            None => {
                let len = available.len();
                buf.extend_from_slice(available);
                reader.consume(len);
                consumed += len;
            }
        }
    }
}

/// Forward every non-empty line of `reader` into `tx` until end of stream.
///
/// Stops early, without error, once the receiving side is gone.
pub async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if read_segment(&mut reader, &mut buf).await? == 0 {
            return Ok(());
        }
        if buf.is_empty() {
            continue;
        }

        let line = String::from_utf8_lossy(&buf).into_owned();
        if tx.send(line).is_err() {
            trace!("Line receiver closed, stopping output reader");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn split_bytes(chunks: Vec<Vec<u8>>) -> Vec<String> {
        let mut builder = tokio_test::io::Builder::new();
        for chunk in &chunks {
            builder.read(chunk);
        }
        let (tx, mut rx) = mpsc::unbounded_channel();
        forward_lines(builder.build(), tx).await.unwrap();

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        lines
    }

    async fn split(chunks: &[&str]) -> Vec<String> {
        split_bytes(chunks.iter().map(|c| c.as_bytes().to_vec()).collect()).await
    }

    #[tokio::test]
    async fn test_splits_on_carriage_return_and_newline() {
        let lines = split(&["Input #0\nframe=1 time=00:00:01.00\rframe=2 time=00:00:02.00\r\nend"]).await;
        assert_eq!(
            lines,
            vec![
                "Input #0",
                "frame=1 time=00:00:01.00",
                "frame=2 time=00:00:02.00",
                "end",
            ]
        );
    }

    #[tokio::test]
    async fn test_lines_spanning_reads() {
        let lines = split(&["frame=1 ti", "me=00:00:0", "3.00\r"]).await;
        assert_eq!(lines, vec!["frame=1 time=00:00:03.00"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let lines = split_bytes(vec![b"bad \xff byte\n".to_vec()]).await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("bad "));
        assert!(lines[0].ends_with(" byte"));
    }

    #[tokio::test]
    async fn test_empty_stream() {
        assert!(split(&[]).await.is_empty());
    }
}
