//! Saving the displayed frame and sending it to the Bluetooth printer.

use crate::config::{Channel, PrinterConfig};
use anyhow::{bail, Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::process::Command;

/// External command that talks to the printer.
const PRINT_COMMAND: &str = "phomemo_printer";

/// Platform features resolved once at bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub can_print: bool,
}

impl Capabilities {
    pub fn detect(print_disabled: bool) -> Self {
        Self {
            can_print: cfg!(target_os = "linux") && !print_disabled,
        }
    }
}

/// Sends a saved image to a printer.
pub trait Printer {
    fn print(&mut self, image: &Path, address: &str, channel: &Channel) -> Result<()>;
}

/// Runs the `phomemo_printer` command line tool.
pub struct CommandPrinter {
    program: String,
}

impl CommandPrinter {
    pub fn new() -> Self {
        Self {
            program: PRINT_COMMAND.to_string(),
        }
    }
}

impl Default for CommandPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer for CommandPrinter {
    fn print(&mut self, image: &Path, address: &str, channel: &Channel) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("-a")
            .arg(address)
            .arg("-c")
            .arg(channel.to_string())
            .arg("-i")
            .arg(image)
            .status()
            .with_context(|| format!("Failed to run {}", self.program))?;

        if !status.success() {
            bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}

/// Writes captures to disk and forwards them to the printer when possible.
pub struct CaptureSink {
    directory: PathBuf,
    config: PrinterConfig,
    capabilities: Capabilities,
    printer: Box<dyn Printer>,
}

impl CaptureSink {
    pub fn new(
        directory: impl Into<PathBuf>,
        config: PrinterConfig,
        capabilities: Capabilities,
        printer: Box<dyn Printer>,
    ) -> Self {
        Self {
            directory: directory.into(),
            config,
            capabilities,
            printer,
        }
    }

    /// Save `frame` under a timestamped name, then try to print it.
    ///
    /// Only a failed write is an error; print problems are logged and
    /// swallowed.
    pub fn capture(&mut self, frame: &RgbImage) -> Result<PathBuf> {
        let path = self.directory.join(capture_file_name(chrono::Local::now()));
        frame
            .save(&path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        tracing::info!("Saved {}", path.display());

        if !self.capabilities.can_print {
            tracing::info!("Printing disabled or unsupported on this platform, skipping");
            return Ok(path);
        }

        match (self.config.address(), self.config.channel()) {
            (Some(address), Some(channel)) => {
                if let Err(e) = self.printer.print(&path, address, channel) {
                    tracing::warn!("Error printing: {:#}", e);
                }
            }
            _ => tracing::info!("Printer address or channel not configured, skipping print"),
        }

        Ok(path)
    }
}

/// `capture_YYYYMMDD_HHMMSS.jpg`
pub fn capture_file_name<Tz>(now: chrono::DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("capture_{}.jpg", now.format("%Y%m%d_%H%M%S"))
}
