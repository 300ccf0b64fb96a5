use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use iptvplayer::{
    BgraSink, FrameSink, OutputBuffer, PlaneCopySink, Player, PlayerConfig, VideoDecoderConfig,
    library_version,
};

#[derive(Parser, Debug)]
#[command(name = "iptvplayer")]
#[command(about = "Decode the first video stream of a file or network stream")]
pub struct Args {
    /// File path or URL to open
    pub locator: String,

    /// Stop after this many frames
    #[arg(long, default_value_t = 100)]
    pub frames: u64,

    /// Pause between frames, in milliseconds
    #[arg(long, default_value_t = 60)]
    pub interval_ms: u64,

    /// Convert frames to packed BGRA
    #[arg(long)]
    pub bgra: bool,

    /// Decoder thread count (codec default if unset)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Give up after this many packets in a row are rejected by the decoder
    #[arg(long)]
    pub max_send_failures: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn run(self) -> Result<()> {
        init_logging(&self.log_level);

        println!("FFmpeg version: {}", library_version());

        let config = self.player_config();
        if self.bgra {
            self.play(Player::new(BgraSink::new(), config))
        } else {
            self.play(Player::new(PlaneCopySink, config))
        }
    }

    fn player_config(&self) -> PlayerConfig {
        let mut decoder = VideoDecoderConfig::default();
        if let Some(threads) = self.threads {
            decoder = decoder.with_threads(threads);
        }
        if let Some(limit) = self.max_send_failures {
            decoder = decoder.with_max_consecutive_send_failures(limit);
        }
        PlayerConfig::default().with_decoder(decoder)
    }

    fn play<S: FrameSink<Output = OutputBuffer>>(&self, mut player: Player<S>) -> Result<()> {
        player
            .open(&self.locator)
            .with_context(|| format!("failed to open {}", self.locator))?;

        let interval = Duration::from_millis(self.interval_ms);
        let mut decoded = 0;
        while decoded < self.frames {
            match player.decode_next_frame() {
                Ok(Some(frame)) => {
                    let pts = frame
                        .pts
                        .map_or_else(|| "none".to_string(), |pts| pts.to_string());
                    println!("decoded frame: {}x{}, pts={}", frame.width, frame.height, pts);
                    decoded += 1;
                }
                Ok(None) => {
                    info!("end of stream");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "decoding stopped");
                    break;
                }
            }
            thread::sleep(interval);
        }

        info!(frames = decoded, stats = ?player.stats(), "done");
        player.close();
        Ok(())
    }
}

fn init_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();
}
