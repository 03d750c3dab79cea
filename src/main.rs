use std::{sync::mpsc, time::Duration};

use clap::Parser;
use frameshow::{
    config::{Command, Config},
    display::{self, EVENT_POLL, FrameSink, HeadlessSink},
    logging, sender,
    server::FrameServer,
};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    logging::init(config.verbose);

    if let Some(Command::Send {
        files,
        repeat,
        interval_ms,
    }) = &config.command
    {
        let sent = sender::send_files(
            &config.ws_url(),
            files,
            *repeat,
            Duration::from_millis(*interval_ms),
        )?;
        info!(sent, "done");
        return Ok(());
    }

    // Window first: if there is no display there is no point in listening.
    let mut sink = open_sink(&config)?;

    let server = FrameServer::bind(&config.listen_addr())?;
    let (frames_tx, frames_rx) = mpsc::sync_channel(config.queue_depth());
    let _listener = server.spawn(frames_tx)?;

    let summary = display::present(&frames_rx, sink.as_mut(), EVENT_POLL);
    info!(shown = summary.shown, failed = summary.failed, "shutting down");
    Ok(())
}

#[cfg(feature = "window")]
fn open_sink(config: &Config) -> Result<Box<dyn FrameSink>, Box<dyn std::error::Error>> {
    if config.headless {
        return Ok(Box::new(HeadlessSink::new()));
    }
    Ok(Box::new(display::sdl::SdlWindow::open(&config.title)?))
}

#[cfg(not(feature = "window"))]
fn open_sink(config: &Config) -> Result<Box<dyn FrameSink>, Box<dyn std::error::Error>> {
    if !config.headless {
        tracing::warn!("built without the `window` feature, running headless");
    }
    Ok(Box::new(HeadlessSink::new()))
}
