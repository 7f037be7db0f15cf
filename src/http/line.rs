//! CRLF line reader with a hard length cap.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Largest accepted raw line, terminator included.
pub const MAX_LINE_LENGTH: usize = 8300;

/// A single non-blank line pulled from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line bytes. CRLF is stripped when `terminated` is set, otherwise
    /// the bytes are kept verbatim.
    pub content: Vec<u8>,
    /// Whether the line ended with `\r\n`.
    pub terminated: bool,
}

/// Result of one read from the connection.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadLine {
    Line(Line),
    /// A line consisting of exactly `\r\n`.
    Blank,
    /// The peer closed its side of the stream.
    Eof,
}

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error("line exceeds {} bytes", MAX_LINE_LENGTH)]
    TooLong,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads the next line from `reader`.
///
/// At most `MAX_LINE_LENGTH + 1` bytes are consumed, so an oversized line is
/// detected without buffering the rest of it.
pub async fn read_line<R>(reader: &mut R) -> Result<ReadLine, LineError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(128);
    let mut limited = (&mut *reader).take(MAX_LINE_LENGTH as u64 + 1);
    let n = limited.read_until(b'\n', &mut buf).await?;

    if n == 0 {
        return Ok(ReadLine::Eof);
    }

    if buf.len() > MAX_LINE_LENGTH {
        return Err(LineError::TooLong);
    }

    if buf == b"\r\n" {
        return Ok(ReadLine::Blank);
    }

    let terminated = buf.ends_with(b"\r\n");
    if terminated {
        buf.truncate(buf.len() - 2);
    }

    Ok(ReadLine::Line(Line {
        content: buf,
        terminated,
    }))
}
