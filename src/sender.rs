//! Pushes frames at a running viewer, the way a browser canvas would.

use std::{path::Path, thread, time::Duration};

use tracing::{debug, info};
use tungstenite::Message;

use crate::{
    error::SendError,
    frame::{RgbFrame, encode_data_uri},
};

pub fn load_frame(path: &Path) -> Result<RgbFrame, SendError> {
    let image = image::open(path).map_err(|source| SendError::Load {
        path: path.display().to_string(),
        source,
    })?;
    Ok(image.into_rgb8().into())
}

/// Sends each payload as one text message, `repeat` times over, then closes.
/// Returns the number of messages sent.
pub fn send_payloads(
    url: &str,
    payloads: &[String],
    repeat: u32,
    interval: Duration,
) -> Result<u64, SendError> {
    let (mut socket, _response) = tungstenite::connect(url)?;
    info!(url, frames = payloads.len(), repeat, "connected");

    let mut sent = 0u64;
    for _ in 0..repeat {
        for payload in payloads {
            socket.send(Message::Text(payload.clone().into()))?;
            sent += 1;
            debug!(sent, "frame sent");
            if !interval.is_zero() {
                thread::sleep(interval);
            }
        }
    }

    socket.close(None)?;
    // Wait for the server's half of the closing handshake.
    while socket.read().is_ok() {}
    Ok(sent)
}

pub fn send_files<P: AsRef<Path>>(
    url: &str,
    files: &[P],
    repeat: u32,
    interval: Duration,
) -> Result<u64, SendError> {
    let payloads = files
        .iter()
        .map(|path| {
            let frame = load_frame(path.as_ref())?;
            Ok(encode_data_uri(&frame)?)
        })
        .collect::<Result<Vec<_>, SendError>>()?;
    send_payloads(url, &payloads, repeat, interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_frame(Path::new("/nonexistent/frame.png")).unwrap_err();
        assert!(matches!(err, SendError::Load { .. }), "{err}");
        assert!(err.to_string().contains("frame.png"));
    }

    #[test]
    fn unreachable_viewer_is_a_socket_error() {
        // Port 1 on loopback is essentially never listening.
        let err = send_payloads("ws://127.0.0.1:1", &["x".to_string()], 1, Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, SendError::Socket(_)), "{err}");
    }
}
