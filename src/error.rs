use std::io;

use thiserror::Error;

/// Failure turning an inbound payload into pixels, or pixels back into a payload.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not a supported image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to encode frame as png: {0}")]
    Encode(#[source] image::ImageError),
}

/// Ends a single connection's receive loop. Never fatal to the listener.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("websocket handshake failed: {0}")]
    Handshake(String),
    #[error("websocket protocol error: {0}")]
    Protocol(#[from] tungstenite::Error),
    #[error("frame {sequence} could not be decoded: {source}")]
    Frame {
        sequence: u64,
        #[source]
        source: FrameError,
    },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("listener error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("sdl: {0}")]
    Sdl(String),
    #[error("frame {width}x{height} has no pixels")]
    BadFrame { width: u32, height: u32 },
}

impl ServerError {
    pub(crate) fn bind(addr: impl ToString, source: io::Error) -> Self {
        ServerError::Bind {
            addr: addr.to_string(),
            source,
        }
    }
}

/// Failure in the `send` subcommand.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("websocket error: {0}")]
    Socket(#[from] tungstenite::Error),
}
