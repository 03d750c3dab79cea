//! WebSocket listener.
//!
//! One thread accepts, one thread per connection reads and decodes. Decoded
//! frames go to the presenter through a bounded queue, so a slow display
//! stalls the socket reads instead of reordering or dropping frames.

use std::{
    io::{self, ErrorKind},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::mpsc::SyncSender,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};
use tungstenite::{
    Message, WebSocket,
    error::ProtocolError,
    protocol::{CloseFrame, frame::coding::CloseCode},
};

use crate::{
    error::{ConnectionError, ServerError},
    frame::{Frame, decode_payload},
};

/// Upper bound on waiting for the peer to acknowledge our close frame.
const CLOSE_LINGER: Duration = Duration::from_secs(1);

pub struct FrameServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

/// How a connection ended when it ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEnd {
    /// The peer closed or the socket went away.
    Closed { frames: u64 },
    /// The presenter is gone, nobody will show further frames.
    DisplayGone { frames: u64 },
}

impl FrameServer {
    pub fn bind(addr: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).map_err(|e| ServerError::bind(addr, e))?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "listening for frames");
        Ok(FrameServer {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts forever. Each connection gets its own thread so a bad peer
    /// only ever takes itself down.
    pub fn serve(self, frames: SyncSender<Frame>) -> Result<(), ServerError> {
        let mut next_connection = 0u64;
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("accept failed: {e}");
                    continue;
                }
            };

            next_connection += 1;
            let connection = next_connection;
            let frames = frames.clone();
            let spawned = thread::Builder::new()
                .name(format!("conn-{connection}"))
                .spawn(move || run_connection(connection, stream, frames));
            if let Err(e) = spawned {
                warn!(conn = connection, "failed to spawn connection thread: {e}");
            }
        }
        Ok(())
    }

    pub fn spawn(
        self,
        frames: SyncSender<Frame>,
    ) -> Result<JoinHandle<Result<(), ServerError>>, ServerError> {
        let handle = thread::Builder::new()
            .name("listener".to_string())
            .spawn(move || self.serve(frames))?;
        Ok(handle)
    }
}

fn run_connection(connection: u64, stream: TcpStream, frames: SyncSender<Frame>) {
    let peer = stream
        .peer_addr()
        .map_or_else(|_| "unknown".to_string(), |addr| addr.to_string());
    info!(conn = connection, %peer, "connection accepted");
    match handle_connection(connection, stream, &frames) {
        Ok(end) => info!(conn = connection, ?end, "connection finished"),
        Err(e) => warn!(conn = connection, "connection dropped: {e}"),
    }
}

/// Handshake, then receive, decode and forward text messages in order until
/// the peer goes away. A payload that fails to decode closes the connection
/// with 1007 and is reported as an error.
pub fn handle_connection(
    connection: u64,
    stream: TcpStream,
    frames: &SyncSender<Frame>,
) -> Result<ConnectionEnd, ConnectionError> {
    let mut websocket =
        tungstenite::accept(stream).map_err(|e| ConnectionError::Handshake(e.to_string()))?;

    let mut sequence = 0u64;
    loop {
        let message = match websocket.read() {
            Ok(message) => message,
            Err(e) if is_disconnect(&e) => return Ok(ConnectionEnd::Closed { frames: sequence }),
            Err(e) => return Err(e.into()),
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Binary(data) => {
                warn!(conn = connection, len = data.len(), "ignoring binary message");
                continue;
            }
            Message::Close(close) => {
                // tungstenite queues the reply; the next read reports the close.
                debug!(conn = connection, ?close, "peer is closing");
                continue;
            }
            _ => continue,
        };

        let started = Instant::now();
        let image = match decode_payload(text.as_str()) {
            Ok(image) => image,
            Err(source) => {
                close_with(
                    &mut websocket,
                    CloseCode::Invalid,
                    "frame could not be decoded",
                );
                return Err(ConnectionError::Frame { sequence, source });
            }
        };
        debug!(
            conn = connection,
            seq = sequence,
            width = image.width(),
            height = image.height(),
            decode_ms = started.elapsed().as_secs_f64() * 1000.0,
            "decoded frame"
        );

        let frame = Frame {
            connection,
            sequence,
            image,
        };
        if frames.send(frame).is_err() {
            close_with(&mut websocket, CloseCode::Away, "display closed");
            return Ok(ConnectionEnd::DisplayGone { frames: sequence });
        }
        sequence += 1;
    }
}

fn is_disconnect(e: &tungstenite::Error) -> bool {
    match e {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => true,
        tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        tungstenite::Error::Io(io) => is_disconnect_io(io),
        _ => false,
    }
}

fn is_disconnect_io(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
    )
}

/// Starts the closing handshake and waits at most [`CLOSE_LINGER`] in total
/// for the peer's reply. Data the peer keeps sending meanwhile is discarded.
fn close_with(websocket: &mut WebSocket<TcpStream>, code: CloseCode, reason: &'static str) {
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    if let Err(e) = websocket.close(Some(frame)) {
        debug!("close failed: {e}");
        return;
    }

    let deadline = Instant::now() + CLOSE_LINGER;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            debug!("peer did not acknowledge close in time");
            return;
        }
        if let Err(e) = websocket.get_mut().set_read_timeout(Some(remaining)) {
            debug!("could not set linger timeout: {e}");
            return;
        }
        match websocket.read() {
            Ok(Message::Close(_)) | Err(_) => return,
            Ok(_) => {}
        }
    }
}
