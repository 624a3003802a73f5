//! Startup: printer settings, devices and assets, then the frame loop.

use crate::capture::{CaptureSource, WebcamCapture};
use crate::config::PrinterConfig;
use crate::discovery::{self, DeviceScanner};
use crate::effects::{BezelLayout, OverlayAsset};
use crate::error::KioskError;
use crate::face::SeetaFaceLocator;
use crate::output::WindowOutput;
use crate::pipeline::{FrameLoop, Termination};
use crate::session::{Session, SessionState, RESOLUTION_TIERS, THRESHOLD_LEVELS};
use crate::snapshot::{Capabilities, CaptureSink, CommandPrinter};
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const WINDOW_TITLE: &str = "DitherCam";
const POLL_INTERVAL: Duration = Duration::from_millis(10);
const CAMERA_WARMUP: Duration = Duration::from_secs(1);

/// Everything bootstrap needs, already parsed from the command line.
#[derive(Debug, Clone)]
pub struct Options {
    pub camera: u32,
    pub config: PathBuf,
    pub overlay: PathBuf,
    pub face_model: PathBuf,
    pub capture_dir: PathBuf,
    pub layout: BezelLayout,
    pub scan_window: Duration,
    pub print_disabled: bool,
}

/// Load the printer settings, offering a Bluetooth scan when the address is
/// missing on a platform that can print.
///
/// `Ok(None)` means the operator declined or nothing was selected and the
/// kiosk should exit without starting.
pub fn prepare_printer_config<S, R, W>(
    config_path: &Path,
    capabilities: Capabilities,
    scanner: &mut S,
    input: &mut R,
    output: &mut W,
) -> Result<Option<PrinterConfig>>
where
    S: DeviceScanner + ?Sized,
    R: BufRead,
    W: Write,
{
    let config = PrinterConfig::load(config_path)?;
    if config.address().is_some() || !capabilities.can_print {
        return Ok(Some(config));
    }

    writeln!(output, "Bluetooth MAC address not found in {}.", config_path.display())?;
    if !confirm(
        "Would you like to scan for Bluetooth devices now? (y/n): ",
        input,
        output,
    )? {
        writeln!(output, "Exiting.")?;
        return Ok(None);
    }

    match discovery::run(scanner, config_path, input, output) {
        Ok(_) => {}
        Err(e @ (KioskError::Discovery(_) | KioskError::NoDeviceSelected)) => {
            tracing::warn!("Printer setup aborted: {}", e);
        }
        Err(e) => return Err(e.into()),
    }

    let config = PrinterConfig::load(config_path)?;
    if config.address().is_none() {
        writeln!(output, "No device was selected. Exiting.")?;
        return Ok(None);
    }
    Ok(Some(config))
}

/// Print `question` and read a yes/no answer; only `y` counts as yes.
fn confirm<R: BufRead, W: Write>(question: &str, input: &mut R, output: &mut W) -> Result<bool> {
    write!(output, "{}", question)?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Bring up every collaborator and run the frame loop to completion.
pub fn launch(options: Options) -> Result<()> {
    let capabilities = Capabilities::detect(options.print_disabled);
    tracing::info!("Printing {}", if capabilities.can_print { "enabled" } else { "unavailable" });

    let stdin = std::io::stdin();
    let mut scanner = discovery::BleScanner::new(options.scan_window);
    let Some(printer_config) = prepare_printer_config(
        &options.config,
        capabilities,
        &mut scanner,
        &mut stdin.lock(),
        &mut std::io::stdout(),
    )?
    else {
        return Ok(());
    };

    let overlay = OverlayAsset::load(&options.overlay)?;
    let locator = SeetaFaceLocator::new(&options.face_model)?;

    let capture = WebcamCapture::new(options.camera)?;
    let (camera_width, camera_height) = capture.resolution();
    tracing::info!("Camera: {}x{}", camera_width, camera_height);
    std::thread::sleep(CAMERA_WARMUP);

    let (display_width, display_height) = options.layout.display_dimensions();
    tracing::info!("Display: {}x{}", display_width, display_height);
    let display = WindowOutput::new(WINDOW_TITLE, display_width, display_height, POLL_INTERVAL)?;

    let sink = CaptureSink::new(
        &options.capture_dir,
        printer_config,
        capabilities,
        Box::new(CommandPrinter::new()),
    );

    let session = Session::new(
        RESOLUTION_TIERS.to_vec(),
        THRESHOLD_LEVELS.to_vec(),
        SessionState {
            tier: 0,
            threshold: 1,
            overlay: false,
        },
    )?;

    let frame_loop = FrameLoop::new(
        capture,
        display,
        Box::new(locator),
        overlay,
        session,
        options.layout,
        sink,
    );

    match frame_loop.run().context("Frame loop failed")? {
        Termination::Quit => tracing::info!("Session ended by operator"),
        Termination::EndOfStream => tracing::info!("Camera stream ended"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveredDevice;
    use std::io::Cursor;

    struct FakeScanner {
        devices: Vec<DiscoveredDevice>,
        scans: usize,
    }

    impl FakeScanner {
        fn with(addresses: &[&str]) -> Self {
            Self {
                devices: addresses
                    .iter()
                    .map(|address| DiscoveredDevice {
                        name: Some("printer".to_string()),
                        address: address.to_string(),
                    })
                    .collect(),
                scans: 0,
            }
        }
    }

    impl DeviceScanner for FakeScanner {
        fn scan(&mut self) -> Result<Vec<DiscoveredDevice>, KioskError> {
            self.scans += 1;
            Ok(self.devices.clone())
        }
    }

    const PRINTER: Capabilities = Capabilities { can_print: true };
    const NO_PRINTER: Capabilities = Capabilities { can_print: false };

    #[test]
    fn configured_address_skips_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"bluetooth_mac_address": "AA:BB:CC:DD:EE:FF"}"#).unwrap();

        let mut scanner = FakeScanner::with(&[]);
        let mut output = Vec::new();
        let config = prepare_printer_config(
            &path,
            PRINTER,
            &mut scanner,
            &mut Cursor::new(""),
            &mut output,
        )
        .unwrap();

        assert_eq!(config.unwrap().address(), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(scanner.scans, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn platform_without_printing_never_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut scanner = FakeScanner::with(&["AA:BB:CC:DD:EE:FF"]);
        let config = prepare_printer_config(
            &path,
            NO_PRINTER,
            &mut scanner,
            &mut Cursor::new("y\n0\n"),
            &mut Vec::new(),
        )
        .unwrap();

        assert_eq!(config, Some(PrinterConfig::default()));
        assert_eq!(scanner.scans, 0);
    }

    #[test]
    fn declining_scan_exits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut scanner = FakeScanner::with(&["AA:BB:CC:DD:EE:FF"]);
        let mut output = Vec::new();
        let config = prepare_printer_config(
            &path,
            PRINTER,
            &mut scanner,
            &mut Cursor::new("n\n"),
            &mut output,
        )
        .unwrap();

        assert!(config.is_none());
        assert_eq!(scanner.scans, 0);
        assert!(String::from_utf8(output).unwrap().ends_with("Exiting.\n"));
    }

    #[test]
    fn accepted_scan_stores_and_returns_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"bluetooth_channel": 1}"#).unwrap();

        let mut scanner = FakeScanner::with(&["11:11:11:11:11:11", "22:22:22:22:22:22"]);
        let config = prepare_printer_config(
            &path,
            PRINTER,
            &mut scanner,
            &mut Cursor::new("y\n1\n"),
            &mut Vec::new(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(config.address(), Some("22:22:22:22:22:22"));
        assert!(config.channel().is_some());
    }

    #[test]
    fn empty_scan_exits_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut scanner = FakeScanner::with(&[]);
        let mut output = Vec::new();
        let config = prepare_printer_config(
            &path,
            PRINTER,
            &mut scanner,
            &mut Cursor::new("y\n"),
            &mut output,
        )
        .unwrap();

        assert!(config.is_none());
        assert!(!path.exists());
        assert!(String::from_utf8(output)
            .unwrap()
            .contains("No device was selected. Exiting."));
    }
}
