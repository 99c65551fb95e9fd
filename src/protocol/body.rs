//! Request body framing
//!
//! v2 publishers send chunked transfer coding; older tooling sends a
//! `Content-Length`-bounded or close-delimited body. All three shapes are
//! normalized to one `AsyncRead` the mount pump consumes, decoded
//! incrementally off the buffered socket.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncBufRead, AsyncRead, ReadBuf};

use crate::error::{Error, Result};

use super::request::RequestHead;

/// Request body as one readable byte stream
///
/// End-of-stream maps to the framing: the final zero chunk, the byte
/// count running out, or the peer closing the connection.
pub enum Body<R> {
    Chunked(ChunkedBody<R>),
    Limited { inner: R, remaining: u64 },
    CloseDelimited(R),
}

impl<R> Body<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Pick the framing from the request headers
    ///
    /// `Transfer-Encoding: chunked` wins over `Content-Length`; a
    /// malformed length is a bad request.
    pub fn from_head(head: &RequestHead, inner: R) -> Result<Body<R>> {
        let chunked = head
            .header("Transfer-Encoding")
            .is_some_and(|value| value.to_ascii_lowercase().contains("chunked"));
        if chunked {
            return Ok(Body::Chunked(ChunkedBody::new(inner)));
        }

        if let Some(value) = head.header("Content-Length") {
            let remaining = value.parse::<u64>().map_err(|_| Error::BadRequest)?;
            return Ok(Body::Limited { inner, remaining });
        }

        Ok(Body::CloseDelimited(inner))
    }
}

impl<R> AsyncRead for Body<R>
where
    R: AsyncBufRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Body::Chunked(body) => Pin::new(body).poll_read(cx, buf),
            Body::CloseDelimited(inner) => Pin::new(inner).poll_read(cx, buf),
            Body::Limited { inner, remaining } => {
                if *remaining == 0 {
                    return Poll::Ready(Ok(()));
                }

                let chunk = ready!(Pin::new(&mut *inner).poll_fill_buf(cx))?;
                if chunk.is_empty() {
                    // Peer closed early; surface as end-of-stream
                    return Poll::Ready(Ok(()));
                }

                let n = chunk
                    .len()
                    .min(buf.remaining())
                    .min(usize::try_from(*remaining).unwrap_or(usize::MAX));
                buf.put_slice(&chunk[..n]);
                Pin::new(inner).consume(n);
                *remaining -= n as u64;
                Poll::Ready(Ok(()))
            }
        }
    }
}

/// Incremental chunked transfer decoder
pub struct ChunkedBody<R> {
    inner: R,
    state: ChunkState,
}

enum ChunkState {
    /// Accumulating a chunk-size line
    Size(Vec<u8>),
    /// Serving chunk payload
    Data(u64),
    /// Consuming the CRLF that trails each chunk payload
    DataEnd(Vec<u8>),
    /// Consuming trailer lines after the zero chunk
    Trailers(Vec<u8>),
    Done,
}

/// Chunk-size lines and trailers are tiny; anything bigger is garbage
const MAX_LINE_BYTES: usize = 256;

impl<R> ChunkedBody<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            state: ChunkState::Size(Vec::new()),
        }
    }
}

impl<R> AsyncRead for ChunkedBody<R>
where
    R: AsyncBufRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        loop {
            match &mut this.state {
                ChunkState::Done => return Poll::Ready(Ok(())),

                ChunkState::Size(line) => {
                    match ready!(poll_line(&mut this.inner, cx, line))? {
                        None => continue,
                        Some(()) => {
                            let size = parse_chunk_size(line)?;
                            this.state = if size == 0 {
                                ChunkState::Trailers(Vec::new())
                            } else {
                                ChunkState::Data(size)
                            };
                        }
                    }
                }

                ChunkState::Data(remaining) => {
                    let chunk = ready!(Pin::new(&mut this.inner).poll_fill_buf(cx))?;
                    if chunk.is_empty() {
                        return Poll::Ready(Err(unexpected_eof()));
                    }

                    let n = chunk
                        .len()
                        .min(buf.remaining())
                        .min(usize::try_from(*remaining).unwrap_or(usize::MAX));
                    buf.put_slice(&chunk[..n]);
                    Pin::new(&mut this.inner).consume(n);
                    *remaining -= n as u64;

                    if *remaining == 0 {
                        this.state = ChunkState::DataEnd(Vec::new());
                    }
                    return Poll::Ready(Ok(()));
                }

                ChunkState::DataEnd(line) => {
                    if ready!(poll_line(&mut this.inner, cx, line))?.is_some() {
                        if !line.is_empty() {
                            return Poll::Ready(Err(invalid_data("missing chunk terminator")));
                        }
                        this.state = ChunkState::Size(Vec::new());
                    }
                }

                ChunkState::Trailers(line) => {
                    if ready!(poll_line(&mut this.inner, cx, line))?.is_some() {
                        if line.is_empty() {
                            this.state = ChunkState::Done;
                        } else {
                            line.clear();
                        }
                    }
                }
            }
        }
    }
}

/// Accumulate bytes into `line` until LF; `Some(())` when a full line is
/// in hand with the terminator stripped, `None` when more input is needed
fn poll_line<R>(
    inner: &mut R,
    cx: &mut Context<'_>,
    line: &mut Vec<u8>,
) -> Poll<io::Result<Option<()>>>
where
    R: AsyncBufRead + Unpin,
{
    let chunk = ready!(Pin::new(&mut *inner).poll_fill_buf(cx))?;
    if chunk.is_empty() {
        return Poll::Ready(Err(unexpected_eof()));
    }

    match chunk.iter().position(|b| *b == b'\n') {
        Some(idx) => {
            line.extend_from_slice(&chunk[..idx]);
            Pin::new(inner).consume(idx + 1);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            Poll::Ready(Ok(Some(())))
        }
        None => {
            line.extend_from_slice(chunk);
            let n = chunk.len();
            Pin::new(inner).consume(n);
            if line.len() > MAX_LINE_BYTES {
                return Poll::Ready(Err(invalid_data("chunk line too long")));
            }
            Poll::Ready(Ok(None))
        }
    }
}

fn parse_chunk_size(line: &[u8]) -> io::Result<u64> {
    let text = std::str::from_utf8(line).map_err(|_| invalid_data("chunk size not utf-8"))?;
    // Chunk extensions follow a ';'
    let size = text.split(';').next().unwrap_or("").trim();
    u64::from_str_radix(size, 16).map_err(|_| invalid_data("invalid chunk size"))
}

fn unexpected_eof() -> io::Error {
    io::ErrorKind::UnexpectedEof.into()
}

fn invalid_data(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::super::request::RequestHead;
    use super::*;

    async fn head(raw: &str) -> RequestHead {
        let mut reader = raw.as_bytes();
        RequestHead::read(&mut reader).await.unwrap()
    }

    #[tokio::test]
    async fn test_chunked_decode() {
        let head = head("POST /M HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n").await;
        let raw: &[u8] = b"4\r\nsome\r\nA\r\n test data\r\n0\r\n\r\n";

        let mut body = Body::from_head(&head, raw).unwrap();
        let mut out = Vec::new();
        body.read_to_end(&mut out).await.unwrap();

        assert_eq!(out, b"some test data");
    }

    #[tokio::test]
    async fn test_chunked_with_extension_and_trailer() {
        let head = head("POST /M HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n").await;
        let raw: &[u8] = b"3;ext=1\r\nabc\r\n0\r\nTrailer: x\r\n\r\n";

        let mut body = Body::from_head(&head, raw).unwrap();
        let mut out = Vec::new();
        body.read_to_end(&mut out).await.unwrap();

        assert_eq!(out, b"abc");
    }

    #[tokio::test]
    async fn test_chunked_truncated_is_error() {
        let head = head("POST /M HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n").await;
        let raw: &[u8] = b"4\r\nso";

        let mut body = Body::from_head(&head, raw).unwrap();
        let mut out = Vec::new();
        assert!(body.read_to_end(&mut out).await.is_err());
    }

    #[tokio::test]
    async fn test_chunked_bad_size_is_error() {
        let head = head("POST /M HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n").await;
        let raw: &[u8] = b"zz\r\nabc\r\n0\r\n\r\n";

        let mut body = Body::from_head(&head, raw).unwrap();
        let mut out = Vec::new();
        assert!(body.read_to_end(&mut out).await.is_err());
    }

    #[tokio::test]
    async fn test_content_length_bound() {
        let head = head("POST /M HTTP/1.1\r\nContent-Length: 4\r\n\r\n").await;
        let raw: &[u8] = b"bodyEXTRA";

        let mut body = Body::from_head(&head, raw).unwrap();
        let mut out = Vec::new();
        body.read_to_end(&mut out).await.unwrap();

        assert_eq!(out, b"body");
    }

    #[tokio::test]
    async fn test_malformed_content_length() {
        let head = head("POST /M HTTP/1.1\r\nContent-Length: nope\r\n\r\n").await;
        assert!(matches!(
            Body::from_head(&head, b"".as_slice()),
            Err(Error::BadRequest)
        ));
    }

    #[tokio::test]
    async fn test_close_delimited() {
        let head = head("POST /M HTTP/1.1\r\n\r\n").await;
        let raw: &[u8] = b"everything until close";

        let mut body = Body::from_head(&head, raw).unwrap();
        let mut out = Vec::new();
        body.read_to_end(&mut out).await.unwrap();

        assert_eq!(out, b"everything until close");
    }
}
