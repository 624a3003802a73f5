mod bootstrap;
mod capture;
mod config;
mod discovery;
mod effects;
mod error;
mod face;
mod output;
mod pipeline;
mod session;
mod snapshot;

use anyhow::{Context, Result};
use bootstrap::Options;
use clap::{Parser, Subcommand};
use effects::BezelLayout;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    camera: u32,

    /// Printer configuration file
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// Overlay image (PNG with alpha) pasted onto detected faces
    #[arg(long, default_value = "mustache.png")]
    overlay: PathBuf,

    /// SeetaFace frontal detection model
    #[arg(long, default_value = "seeta_fd_frontal_v1.0.bin")]
    face_model: PathBuf,

    /// Directory for captured photos
    #[arg(long, default_value = ".")]
    capture_dir: PathBuf,

    /// Caption above the picture
    #[arg(long, default_value = "Moustache Cam")]
    top_caption: String,

    /// Caption below the picture
    #[arg(long, default_value = "BeagleBadge")]
    bottom_caption: String,

    /// Never send captures to the printer
    #[arg(long)]
    no_print: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan for Bluetooth devices and store the chosen printer address
    Scan {
        /// How long to listen for advertisements, in seconds
        #[arg(long, default_value_t = 5)]
        scan_secs: u64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match args.command {
        Some(Command::Scan { scan_secs }) => {
            let mut scanner = discovery::BleScanner::new(Duration::from_secs(scan_secs));
            let stdin = std::io::stdin();
            match discovery::run(
                &mut scanner,
                &args.config,
                &mut stdin.lock(),
                &mut std::io::stdout(),
            ) {
                Ok(_) => Ok(()),
                Err(e @ (error::KioskError::Discovery(_) | error::KioskError::NoDeviceSelected)) => {
                    tracing::warn!("{}", e);
                    Ok(())
                }
                Err(e) => Err(e).context("Bluetooth setup failed"),
            }
        }
        None => {
            tracing::info!("DitherCam starting");
            let options = Options {
                camera: args.camera,
                config: args.config,
                overlay: args.overlay,
                face_model: args.face_model,
                capture_dir: args.capture_dir,
                layout: BezelLayout {
                    top_caption: args.top_caption,
                    bottom_caption: args.bottom_caption,
                    ..BezelLayout::default()
                },
                scan_window: Duration::from_secs(5),
                print_disabled: args.no_print,
            };
            bootstrap::launch(options)
        }
    }
}
