//! Line transport.
//!
//! The connection is any `AsyncRead + AsyncWrite` framed with a
//! [`LinesCodec`]. Outbound lines are queued by the [`Bot`] and written by a
//! dedicated task so handlers never wait on the socket.
//!
//! [`Bot`]: perch_framework::Bot

use futures::{Sink, SinkExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use crate::config::CoreConfig;
use crate::error::{RuntimeError, RuntimeResult};
use perch_core::verb;

/// Longest accepted inbound line: 8191 bytes of tags plus a 512-byte message.
pub const MAX_LINE_LENGTH: usize = 8191 + 512;

/// Frames `io` as CRLF/LF-terminated lines.
pub fn framed<T: AsyncRead + AsyncWrite>(io: T) -> Framed<T, LinesCodec> {
    Framed::new(io, LinesCodec::new_with_max_length(MAX_LINE_LENGTH))
}

/// Opens a TCP connection to the configured server.
pub async fn connect(core: &CoreConfig) -> RuntimeResult<TcpStream> {
    let address = core.address();
    info!(address = %address, "Connecting");
    TcpStream::connect(&address)
        .await
        .map_err(|source| RuntimeError::Connect { address, source })
}

/// Lines that register the connection: `PASS` (when configured), `NICK`
/// and `USER`.
pub fn registration_lines(core: &CoreConfig) -> Vec<String> {
    let mut lines = Vec::with_capacity(3);
    if let Some(password) = &core.password {
        lines.push(format!("PASS {password}"));
    }
    lines.push(format!("{} {}", verb::NICK, core.nick));
    lines.push(format!("USER {} 0 * :{}", core.user, core.name));
    lines
}

/// Spawns the writer task.
///
/// The task writes every queued line in order. Once `shutdown` is cancelled
/// it flushes what is already queued, closes the sink and exits.
pub fn spawn_writer<S>(
    mut sink: S,
    mut outbound: UnboundedReceiver<String>,
    shutdown: CancellationToken,
) -> JoinHandle<Result<(), LinesCodecError>>
where
    S: Sink<String, Error = LinesCodecError> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                line = outbound.recv() => match line {
                    Some(line) => send_line(&mut sink, line).await?,
                    None => break,
                },
                () = shutdown.cancelled() => {
                    while let Ok(line) = outbound.try_recv() {
                        send_line(&mut sink, line).await?;
                    }
                    break;
                }
            }
        }
        sink.close().await
    })
}

async fn send_line<S>(sink: &mut S, line: String) -> Result<(), LinesCodecError>
where
    S: Sink<String, Error = LinesCodecError> + Unpin,
{
    trace!(">> {line}");
    // LinesCodec terminates with LF only.
    sink.send(line + "\r").await
}
