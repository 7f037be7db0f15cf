use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::http::parser::{read_request_head, validate_request, ParseError, RequestHead};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::resource::resolver::{Resolution, ServerContext};

/// Serves sequential requests on one client stream.
pub struct Connection<S> {
    stream: BufReader<S>,
    context: Arc<ServerContext>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Validating(RequestHead),
    Dispatching(Request),
    Writing {
        writer: ResponseWriter,
        /// Read another request once the response is sent.
        keep_alive: bool,
    },
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, context: Arc<ServerContext>) -> Self {
        Self {
            stream: BufReader::new(stream),
            context,
            state: ConnectionState::Reading,
        }
    }

    /// Runs the state machine until the connection closes.
    ///
    /// Transport failures end the connection with an error; the stream is
    /// shut down exactly once on every other exit.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            self.state = match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => match read_request_head(&mut self.stream).await {
                    Ok(Some(head)) => ConnectionState::Validating(head),
                    Ok(None) => {
                        tracing::debug!("Client closed connection");
                        ConnectionState::Closed
                    }
                    Err(e) => Self::reject(e, false)?,
                },

                ConnectionState::Validating(head) => {
                    let keep_alive = !head.requests_close();
                    match validate_request(head) {
                        Ok(request) => ConnectionState::Dispatching(request),
                        Err(e) => Self::reject(e, keep_alive)?,
                    }
                }

                ConnectionState::Dispatching(request) => {
                    let (response, keep_alive) = self.handle_request(&request).await;

                    tracing::info!(
                        method = %request.method,
                        path = %request.target,
                        status = response.status.as_u16(),
                        reason = %response.reason,
                        "Request served"
                    );

                    ConnectionState::Writing {
                        writer: ResponseWriter::new(&response),
                        keep_alive,
                    }
                }

                ConnectionState::Writing {
                    mut writer,
                    keep_alive,
                } => {
                    tracing::trace!(bytes = writer.remaining(), "Writing response");
                    writer
                        .write_to_stream(&mut self.stream)
                        .await
                        .context("Failed to send response")?;

                    if keep_alive {
                        ConnectionState::Reading // go back for next request
                    } else {
                        ConnectionState::Closed
                    }
                }

                ConnectionState::Closed => break,
            };
        }

        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(error = %e, "Shutdown after close failed");
        }

        Ok(())
    }

    /// Turns a rejected request into the error response to send.
    ///
    /// `keep_alive` only matters for rejections that do not force a close.
    fn reject(err: ParseError, keep_alive: bool) -> anyhow::Result<ConnectionState> {
        let Some((status, reason)) = err.status() else {
            return Err(anyhow::Error::new(err).context("Failed to read request"));
        };

        tracing::debug!(
            status = status.as_u16(),
            reason,
            error = %err,
            "Request rejected"
        );

        let keep_alive = keep_alive && !err.closes_connection();
        let response = Response::error(status, reason);
        Ok(ConnectionState::Writing {
            writer: ResponseWriter::new(&response),
            keep_alive,
        })
    }

    async fn handle_request(&self, req: &Request) -> (Response, bool) {
        if !req.method.is_supported() {
            return (
                Response::error(StatusCode::NotImplemented, "Method not available"),
                false,
            );
        }

        if !req.target.starts_with('/') {
            return (Response::error(StatusCode::BadRequest, "Bad resource"), false);
        }

        // `Connection: close` ends the loop after redirects and 404s too.
        let keep_alive = req.keep_alive();

        match self.context.resolve(&req.target).await {
            Resolution::File(path) => match tokio::fs::read(&path).await {
                Ok(contents) => (Response::file(contents, req.wants_body()), keep_alive),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot open file");
                    (Response::error(StatusCode::BadRequest, "Cannot open file"), false)
                }
            },
            Resolution::Redirect(server) => (Response::redirect(&server, &req.target), keep_alive),
            Resolution::NotRegular => (Response::error(StatusCode::NotFound, "Bad resource"), keep_alive),
            Resolution::Missing => (
                Response::error(StatusCode::NotFound, "Resource does not exist"),
                keep_alive,
            ),
        }
    }
}
