//! Per-connection protocol dispatcher
//!
//! One instance per accepted socket. Classifies the request (dialect,
//! method, path), authorizes it, then runs the matching wire exchange.
//! The dialect split happens before any response byte: v1 preludes are
//! not valid HTTP, so nothing may write an HTTP status line first.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::auth::{Action, AuthError, Authorizer};
use crate::error::{Error, Result};
use crate::protocol::body::Body;
use crate::protocol::constants::{
    CONTENT_TYPE_GNSS_DATA, CONTENT_TYPE_SOURCETABLE, ICY_200_OK, NTRIP_VERSION_HEADER,
    NTRIP_VERSION_V2, REQUEST_ID_HEADER, SERVER_NAME,
};
use crate::protocol::request::{Method, RequestHead};
use crate::protocol::response;
use crate::protocol::ProtocolVersion;
use crate::registry::{MountRegistry, RegistryError, Subscription};
use crate::session::RequestContext;
use crate::sourcetable::Sourcetable;

use super::config::CasterConfig;

pub(crate) struct Connection<A> {
    config: CasterConfig,
    registry: Arc<MountRegistry>,
    authorizer: Arc<A>,
    peer_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl<A: Authorizer> Connection<A> {
    pub(crate) fn new(
        config: CasterConfig,
        registry: Arc<MountRegistry>,
        authorizer: Arc<A>,
        peer_addr: SocketAddr,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            registry,
            authorizer,
            peer_addr,
            shutdown,
        }
    }

    pub(crate) async fn run(self, socket: TcpStream) {
        let peer = self.peer_addr;
        let (read_half, mut writer) = socket.into_split();
        let mut reader = BufReader::new(read_half);

        // The idle timeout covers only the request head; established
        // streams carry no whole-connection deadline
        let head = match timeout(self.config.idle_timeout, RequestHead::read(&mut reader)).await {
            Err(_) => {
                tracing::debug!(source_ip = %peer, "Idle connection dropped before request head");
                return;
            }
            Ok(Err(Error::BadRequest)) => {
                tracing::debug!(source_ip = %peer, "Malformed request head");
                let _ = response::write_head(
                    &mut writer,
                    400,
                    &[("Connection", "close"), ("Content-Length", "0")],
                )
                .await;
                return;
            }
            Ok(Err(err)) => {
                tracing::debug!(source_ip = %peer, error = %err, "Connection closed before request");
                return;
            }
            Ok(Ok(head)) => head,
        };

        let ctx = RequestContext::new(head.version(), peer)
            .with_credentials(head.credentials())
            .with_gga(head.gga().map(str::to_string));

        tracing::info!(
            request_id = %ctx.request_id,
            request_version = %ctx.version,
            method = %head.method,
            path = %head.path(),
            source_ip = %peer,
            "Request received"
        );

        let result = match ctx.version {
            ProtocolVersion::V2 => self.handle_v2(&mut reader, &mut writer, &head, &ctx).await,
            ProtocolVersion::V1 => self.handle_v1(&mut reader, &mut writer, &head, &ctx).await,
        };

        if let Err(err) = result {
            tracing::debug!(request_id = %ctx.request_id, error = %err, "Connection error");
        }
    }

    // ---- v2: conformant HTTP/1.1 -------------------------------------

    async fn handle_v2<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        head: &RequestHead,
        ctx: &RequestContext,
    ) -> Result<()>
    where
        R: tokio::io::AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if head.path() == "/" {
            return self.sourcetable_v2(writer, head, ctx).await;
        }

        match head.method {
            Method::Get => self.subscribe_v2(reader, writer, head, ctx).await,
            Method::Post => self.publish_v2(reader, writer, head, ctx).await,
            _ => {
                tracing::debug!(request_id = %ctx.request_id, method = %head.method, "Unsupported method");
                self.write_v2_error(writer, 501, head, ctx).await
            }
        }
    }

    async fn sourcetable_v2<W>(
        &self,
        writer: &mut W,
        head: &RequestHead,
        ctx: &RequestContext,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let body = self.filtered_sourcetable(head, ctx).await.render();
        let length = body.len().to_string();

        self.write_v2_head(
            writer,
            200,
            ctx,
            &[
                ("Content-Type", CONTENT_TYPE_SOURCETABLE),
                ("Content-Length", &length),
            ],
        )
        .await?;
        writer.write_all(body.as_bytes()).await?;
        writer.flush().await?;

        tracing::info!(request_id = %ctx.request_id, "Sourcetable written to client");
        Ok(())
    }

    async fn subscribe_v2<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        head: &RequestHead,
        ctx: &RequestContext,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mount = head.mount();

        if let Err(err) = self
            .authorizer
            .authorize(Action::Subscribe, mount, &ctx.credentials)
            .await
        {
            tracing::info!(request_id = %ctx.request_id, mount = %mount, reason = %err, "Subscribe refused");
            return self.write_v2_error(writer, auth_status(&err), head, ctx).await;
        }

        let sub = match self.registry.open_subscriber(mount).await {
            Ok(sub) => sub,
            Err(err) => {
                tracing::info!(request_id = %ctx.request_id, mount = %mount, reason = %err, "Subscribe refused");
                return self
                    .write_v2_error(writer, registry_status(&err), head, ctx)
                    .await;
            }
        };

        // Headers are flushed before the first stream byte; the body is
        // close-delimited raw chunks
        self.write_v2_head(writer, 200, ctx, &[("Content-Type", CONTENT_TYPE_GNSS_DATA)])
            .await?;
        tracing::info!(request_id = %ctx.request_id, mount = %mount, "Accepted subscriber");

        let reason = self.stream_to_client(reader, writer, sub, None).await;
        tracing::info!(request_id = %ctx.request_id, mount = %mount, reason, "Subscriber connection closed");
        Ok(())
    }

    async fn publish_v2<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        head: &RequestHead,
        ctx: &RequestContext,
    ) -> Result<()>
    where
        R: tokio::io::AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mount = head.mount();

        if let Err(err) = self
            .authorizer
            .authorize(Action::Publish, mount, &ctx.credentials)
            .await
        {
            tracing::info!(request_id = %ctx.request_id, mount = %mount, reason = %err, "Publish refused");
            return self.write_v2_error(writer, auth_status(&err), head, ctx).await;
        }

        let body = match Body::from_head(head, reader) {
            Ok(body) => body,
            Err(_) => {
                tracing::info!(request_id = %ctx.request_id, mount = %mount, "Publish refused: bad body framing");
                return self.write_v2_error(writer, 400, head, ctx).await;
            }
        };

        let publisher = match self.registry.open_publisher(mount).await {
            Ok(publisher) => publisher,
            Err(err) => {
                tracing::info!(request_id = %ctx.request_id, mount = %mount, reason = %err, "Publish refused");
                return self
                    .write_v2_error(writer, registry_status(&err), head, ctx)
                    .await;
            }
        };

        // Reply before copying the body so the client starts sending
        self.write_v2_head(writer, 200, ctx, &[("Content-Length", "0")])
            .await?;
        tracing::info!(request_id = %ctx.request_id, mount = %mount, "Accepted publisher");

        let exit = publisher.run(body).await;
        tracing::info!(request_id = %ctx.request_id, mount = %mount, reason = %exit, "Publisher connection closed");
        Ok(())
    }

    // ---- v1: ICY-style over the same listener ------------------------

    async fn handle_v1<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        head: &RequestHead,
        ctx: &RequestContext,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // Anything but GET is answered with plain HTTP before the point
        // where v1 preludes take over the wire
        if head.method != Method::Get {
            tracing::debug!(request_id = %ctx.request_id, method = %head.method, "Unsupported v1 method");
            return response::write_head(
                writer,
                501,
                &[("Connection", "close"), ("Content-Length", "0")],
            )
            .await;
        }

        if head.path() == "/" {
            let body = self.filtered_sourcetable(head, ctx).await.render();
            response::write_v1_sourcetable(writer, &body).await?;
            tracing::info!(request_id = %ctx.request_id, "Sourcetable written to client");
            return Ok(());
        }

        self.subscribe_v1(reader, writer, head, ctx).await
    }

    async fn subscribe_v1<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        head: &RequestHead,
        ctx: &RequestContext,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mount = head.mount();

        if let Err(err) = self
            .authorizer
            .authorize(Action::Subscribe, mount, &ctx.credentials)
            .await
        {
            tracing::info!(request_id = %ctx.request_id, mount = %mount, reason = %err, "Subscribe refused");
            return response::write_v1_error(writer, auth_status(&err), head.path()).await;
        }

        let sub = match self.registry.open_subscriber(mount).await {
            Ok(sub) => sub,
            Err(err) => {
                tracing::info!(request_id = %ctx.request_id, mount = %mount, reason = %err, "Subscribe refused");
                return response::write_v1_error(writer, registry_status(&err), head.path()).await;
            }
        };

        writer.write_all(ICY_200_OK).await?;
        writer.flush().await?;
        tracing::info!(request_id = %ctx.request_id, mount = %mount, "Accepted subscriber");

        let reason = self
            .stream_to_client(reader, writer, sub, Some(self.config.write_timeout))
            .await;
        tracing::info!(request_id = %ctx.request_id, mount = %mount, reason, "Subscriber connection closed");
        Ok(())
    }

    // ---- shared ------------------------------------------------------

    async fn filtered_sourcetable(&self, head: &RequestHead, ctx: &RequestContext) -> Sourcetable {
        let table = self.registry.snapshot_sourcetable().await;
        match table.filter(head.query()) {
            Ok(filtered) => filtered,
            Err(err) => {
                // Filter failures are ignored; the full table is served
                tracing::warn!(request_id = %ctx.request_id, error = %err, "Invalid sourcetable filter");
                table
            }
        }
    }

    /// Copy fan-out chunks to the client until the mount closes, the
    /// client disconnects, or the server shuts down
    ///
    /// The read half is watched only to observe disconnect; client bytes
    /// (periodic GGA updates) are drained and ignored.
    async fn stream_to_client<R, W>(
        &self,
        reader: &mut R,
        writer: &mut W,
        mut sub: Subscription,
        write_deadline: Option<Duration>,
    ) -> &'static str
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut drain = [0u8; 512];

        loop {
            tokio::select! {
                chunk = sub.recv() => {
                    let Some(data) = chunk else {
                        return "mount closed connection";
                    };

                    let write = async {
                        writer.write_all(&data).await?;
                        writer.flush().await
                    };

                    let result = match write_deadline {
                        Some(deadline) => match timeout(deadline, write).await {
                            Err(_) => return "timeout writing to client",
                            Ok(result) => result,
                        },
                        None => write.await,
                    };

                    if result.is_err() {
                        return "write to client failed";
                    }
                }
                read = reader.read(&mut drain) => {
                    if matches!(read, Ok(0) | Err(_)) {
                        return "client closed connection";
                    }
                }
                _ = self.shutdown.cancelled() => {
                    return "server shutting down";
                }
            }
        }
    }

    async fn write_v2_head<W>(
        &self,
        writer: &mut W,
        status: u16,
        ctx: &RequestContext,
        extra: &[(&str, &str)],
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let request_id = ctx.request_id.to_string();
        let mut headers: Vec<(&str, &str)> = vec![
            (REQUEST_ID_HEADER, request_id.as_str()),
            (NTRIP_VERSION_HEADER, NTRIP_VERSION_V2),
            ("Server", SERVER_NAME),
            ("Connection", "close"),
        ];
        headers.extend_from_slice(extra);

        response::write_head(writer, status, &headers).await
    }

    async fn write_v2_error<W>(
        &self,
        writer: &mut W,
        status: u16,
        head: &RequestHead,
        ctx: &RequestContext,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let challenge = format!("Basic realm=\"{}\"", head.path());
        let mut extra: Vec<(&str, &str)> = Vec::new();
        if status == 401 {
            extra.push(("WWW-Authenticate", challenge.as_str()));
        }
        extra.push(("Content-Length", "0"));

        self.write_v2_head(writer, status, ctx, &extra).await
    }
}

pub(crate) fn auth_status(err: &AuthError) -> u16 {
    match err {
        AuthError::NotAuthorized => 401,
        AuthError::NotFound => 404,
        AuthError::Internal(_) => 500,
    }
}

pub(crate) fn registry_status(err: &RegistryError) -> u16 {
    match err {
        RegistryError::MountNotFound(_) | RegistryError::MountOffline(_) => 404,
        RegistryError::MountInUse(_) => 409,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(auth_status(&AuthError::NotAuthorized), 401);
        assert_eq!(auth_status(&AuthError::NotFound), 404);
        assert_eq!(auth_status(&AuthError::Internal("db down".into())), 500);

        assert_eq!(registry_status(&RegistryError::MountNotFound("M".into())), 404);
        assert_eq!(registry_status(&RegistryError::MountOffline("M".into())), 404);
        assert_eq!(registry_status(&RegistryError::MountInUse("M".into())), 409);
    }
}
