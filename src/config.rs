use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_TITLE: &str = "image";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "frameshow",
    version,
    about = "Shows base64 PNG frames received over a local WebSocket"
)]
pub struct Config {
    /// Address to listen on (or to connect to, for `send`).
    #[arg(long, env = "FRAMESHOW_HOST", default_value = DEFAULT_HOST, global = true)]
    pub host: String,

    #[arg(long, env = "FRAMESHOW_PORT", default_value_t = DEFAULT_PORT, global = true)]
    pub port: u16,

    /// Window title.
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Log frames instead of opening a window.
    #[arg(long)]
    pub headless: bool,

    /// Decoded frames allowed to wait for the display before readers stall.
    #[arg(long, default_value_t = 4)]
    pub queue_depth: usize,

    /// -v for debug, -vv for trace. RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Send image files to a running viewer, in order.
    Send {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Times to send the whole list.
        #[arg(long, default_value_t = 1)]
        repeat: u32,

        /// Pause between frames, in milliseconds.
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },
}

impl Config {
    /// `host:port`, bracketing IPv6 literals.
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.listen_addr())
    }

    pub fn queue_depth(&self) -> usize {
        self.queue_depth.max(1)
    }
}
