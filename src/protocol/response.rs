//! Response preludes
//!
//! v2 responses are ordinary HTTP/1.1 heads. v1 responses are written
//! byte-exactly: the ICY/SOURCETABLE preludes are not valid HTTP, and the
//! synthetic error frames rejected v1 clients receive have a fixed header
//! order that fielded rovers match verbatim.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;

/// Reason phrase for the status codes the caster emits
pub fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        _ => "Unknown",
    }
}

/// Write an HTTP/1.1 response head: status line, headers, blank line
pub async fn write_head<W>(writer: &mut W, status: u16, headers: &[(&str, &str)]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut head = format!("HTTP/1.1 {} {}\r\n", status, reason(status));
    for (name, value) in headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    writer.write_all(head.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Write the synthetic HTTP error frame v1 clients receive
///
/// The WWW-Authenticate challenge is present on every status, not just
/// 401, and the header order is fixed.
pub async fn write_v1_error<W>(writer: &mut W, status: u16, path: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = format!(
        "HTTP/1.1 {} {}\r\nConnection: close\r\nWWW-Authenticate: Basic realm=\"{}\"\r\nContent-Length: 0\r\n\r\n",
        status,
        reason(status),
        path,
    );

    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Write the v1 sourcetable prelude and body
pub async fn write_v1_sourcetable<W>(writer: &mut W, body: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = format!(
        "SOURCETABLE 200 OK\r\nConnection: close\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body,
    );

    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
