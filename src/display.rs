//! Presenting decoded frames.
//!
//! The presenter owns the receiving end of the frame queue and a [`FrameSink`].
//! It runs on the thread that created the sink, which for SDL has to be the
//! main thread.

use std::{
    sync::mpsc::{Receiver, RecvTimeoutError},
    time::Duration,
};

use tracing::{debug, info, warn};

use crate::{error::DisplayError, frame::Frame};

#[cfg(feature = "window")]
pub mod sdl;

/// How long the presenter waits for a frame before servicing UI events again.
pub const EVENT_POLL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkControl {
    Continue,
    Quit,
}

/// Something that can put a frame on screen (or pretend to).
pub trait FrameSink {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Drains pending UI events. Must not block.
    fn pump(&mut self) -> SinkControl;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PresentSummary {
    pub shown: u64,
    pub failed: u64,
}

/// Runs until the sink asks to quit or every frame sender is gone.
pub fn present<S>(frames: &Receiver<Frame>, sink: &mut S, poll: Duration) -> PresentSummary
where
    S: FrameSink + ?Sized,
{
    let mut summary = PresentSummary::default();
    loop {
        if sink.pump() == SinkControl::Quit {
            info!("display closed");
            break;
        }

        match frames.recv_timeout(poll) {
            Ok(frame) => match sink.show(&frame) {
                Ok(()) => summary.shown += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(conn = frame.connection, seq = frame.sequence, "failed to show frame: {e}");
                }
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("frame source closed");
                break;
            }
        }
    }
    debug!(shown = summary.shown, failed = summary.failed, "presenter stopped");
    summary
}

/// Destination rectangle inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Scales `src` to fit `dst` keeping aspect ratio, centered.
pub fn letterbox(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> FitRect {
    if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
        return FitRect {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
    }

    let scale_w = dst_w as f32 / src_w as f32;
    let scale_h = dst_h as f32 / src_h as f32;
    let scale = scale_w.min(scale_h);

    let width = ((src_w as f32 * scale).round() as u32).clamp(1, dst_w);
    let height = ((src_h as f32 * scale).round() as u32).clamp(1, dst_h);
    FitRect {
        x: ((dst_w - width) / 2) as i32,
        y: ((dst_h - height) / 2) as i32,
        width,
        height,
    }
}

/// Logs frames instead of drawing them. Used by `--headless`.
#[derive(Debug, Default)]
pub struct HeadlessSink {
    shown: u64,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> u64 {
        self.shown
    }
}

impl FrameSink for HeadlessSink {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        self.shown += 1;
        info!(
            conn = frame.connection,
            seq = frame.sequence,
            width = frame.image.width(),
            height = frame.image.height(),
            "frame"
        );
        Ok(())
    }

    fn pump(&mut self) -> SinkControl {
        SinkControl::Continue
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::frame::RgbFrame;

    struct Recording {
        seen: Vec<(u64, u64)>,
        quit_after: Option<usize>,
        fail_seq: Option<u64>,
    }

    impl FrameSink for Recording {
        fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
            if self.fail_seq == Some(frame.sequence) {
                return Err(DisplayError::Sdl("texture lost".into()));
            }
            self.seen.push((frame.connection, frame.sequence));
            Ok(())
        }

        fn pump(&mut self) -> SinkControl {
            match self.quit_after {
                Some(n) if self.seen.len() >= n => SinkControl::Quit,
                _ => SinkControl::Continue,
            }
        }
    }

    fn frame(connection: u64, sequence: u64) -> Frame {
        Frame {
            connection,
            sequence,
            image: RgbFrame::new(1, 1, vec![255, 0, 0]).unwrap(),
        }
    }

    #[test]
    fn presents_in_arrival_order_until_source_closes() {
        let (tx, rx) = mpsc::sync_channel(8);
        for seq in 0..3 {
            tx.send(frame(1, seq)).unwrap();
        }
        drop(tx);

        let mut sink = Recording {
            seen: Vec::new(),
            quit_after: None,
            fail_seq: None,
        };
        let summary = present(&rx, &mut sink, EVENT_POLL);
        assert_eq!(sink.seen, vec![(1, 0), (1, 1), (1, 2)]);
        assert_eq!(summary, PresentSummary { shown: 3, failed: 0 });
    }

    #[test]
    fn quit_stops_before_draining_queue() {
        let (tx, rx) = mpsc::sync_channel(8);
        for seq in 0..5 {
            tx.send(frame(7, seq)).unwrap();
        }

        let mut sink = Recording {
            seen: Vec::new(),
            quit_after: Some(2),
            fail_seq: None,
        };
        present(&rx, &mut sink, EVENT_POLL);
        assert_eq!(sink.seen.len(), 2);
    }

    #[test]
    fn show_failure_does_not_stop_presenter() {
        let (tx, rx) = mpsc::sync_channel(8);
        for seq in 0..3 {
            tx.send(frame(2, seq)).unwrap();
        }
        drop(tx);

        let mut sink = Recording {
            seen: Vec::new(),
            quit_after: None,
            fail_seq: Some(1),
        };
        let summary = present(&rx, &mut sink, EVENT_POLL);
        assert_eq!(sink.seen, vec![(2, 0), (2, 2)]);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn letterbox_pillarboxes_tall_source() {
        let rect = letterbox(100, 200, 400, 400);
        assert_eq!(
            rect,
            FitRect {
                x: 100,
                y: 0,
                width: 200,
                height: 400
            }
        );
    }

    #[test]
    fn letterbox_fills_matching_aspect() {
        let rect = letterbox(640, 480, 1280, 960);
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 0, 1280, 960));
    }

    #[test]
    fn letterbox_handles_empty_sizes() {
        assert_eq!(letterbox(0, 10, 100, 100).width, 0);
        assert_eq!(letterbox(10, 10, 100, 0).height, 0);
    }

    #[test]
    fn headless_sink_counts() {
        let mut sink = HeadlessSink::new();
        sink.show(&frame(1, 0)).unwrap();
        assert_eq!(sink.shown(), 1);
        assert_eq!(sink.pump(), SinkControl::Continue);
    }
}
