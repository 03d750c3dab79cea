//! Receive base64 PNG frames over a local WebSocket and show them in a window.
//!
//! Data flow: [`server`] accepts connections and decodes each text message
//! with [`frame::decode_payload`]; decoded frames travel over a bounded queue
//! to [`display::present`], which hands them to a [`display::FrameSink`].

pub mod config;
pub mod display;
pub mod error;
pub mod frame;
pub mod logging;
pub mod sender;
pub mod server;

pub use error::{ConnectionError, DisplayError, FrameError, SendError, ServerError};
pub use frame::{DATA_URI_PREFIX, Frame, RgbFrame};
