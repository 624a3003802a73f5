//! One-shot Bluetooth scan that stores the chosen printer address.

use crate::config;
use crate::error::KioskError;
use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::Manager;
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

/// A device seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub name: Option<String>,
    pub address: String,
}

/// Trait for Bluetooth scanners
pub trait DeviceScanner {
    fn scan(&mut self) -> Result<Vec<DiscoveredDevice>, KioskError>;
}

/// Scans with the first local adapter for a fixed window.
pub struct BleScanner {
    window: Duration,
}

impl BleScanner {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    async fn scan_async(&self) -> Result<Vec<DiscoveredDevice>, btleplug::Error> {
        let manager = Manager::new().await?;
        let central = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| btleplug::Error::Other("no Bluetooth adapter found".into()))?;

        central.start_scan(ScanFilter::default()).await?;
        tokio::time::sleep(self.window).await;
        let peripherals = central.peripherals().await?;
        central.stop_scan().await?;

        let mut devices = Vec::with_capacity(peripherals.len());
        for peripheral in peripherals {
            let name = peripheral
                .properties()
                .await?
                .and_then(|properties| properties.local_name);
            devices.push(DiscoveredDevice {
                name,
                address: peripheral.address().to_string(),
            });
        }
        Ok(devices)
    }
}

impl DeviceScanner for BleScanner {
    fn scan(&mut self) -> Result<Vec<DiscoveredDevice>, KioskError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| KioskError::Discovery(e.to_string()))?;

        runtime
            .block_on(self.scan_async())
            .map_err(|e| KioskError::Discovery(e.to_string()))
    }
}

/// Ask the operator to pick a device by index.
///
/// Re-prompts on bad input; returns `None` if input ends first.
pub fn select_device<R, W>(
    devices: &[DiscoveredDevice],
    input: &mut R,
    output: &mut W,
) -> std::io::Result<Option<usize>>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "Found devices:")?;
    for (i, device) in devices.iter().enumerate() {
        writeln!(
            output,
            "{}: {} ({})",
            i,
            device.name.as_deref().unwrap_or("Unknown"),
            device.address
        )?;
    }

    let mut line = String::new();
    loop {
        write!(output, "Select a device to save: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().parse::<usize>() {
            Ok(index) if index < devices.len() => return Ok(Some(index)),
            Ok(_) => writeln!(output, "Invalid selection.")?,
            Err(_) => writeln!(output, "Invalid input.")?,
        }
    }
}

/// Scan, let the operator choose, and write the address into `config_path`.
///
/// The configuration is only touched after a successful selection.
pub fn run<S, R, W>(
    scanner: &mut S,
    config_path: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<String, KioskError>
where
    S: DeviceScanner + ?Sized,
    R: BufRead,
    W: Write,
{
    let io_error = |e: std::io::Error| KioskError::Discovery(e.to_string());

    writeln!(output, "Scanning for Bluetooth devices...").map_err(io_error)?;
    let devices = match scanner.scan() {
        Ok(devices) => devices,
        Err(e) => {
            writeln!(output, "Error: {}", e).map_err(io_error)?;
            writeln!(
                output,
                "Please make sure your Bluetooth is turned on and try again."
            )
            .map_err(io_error)?;
            return Err(e);
        }
    };
    tracing::debug!("Scan found {} devices", devices.len());

    if devices.is_empty() {
        writeln!(output, "No Bluetooth devices found.").map_err(io_error)?;
        return Err(KioskError::NoDeviceSelected);
    }

    let index = select_device(&devices, input, output)
        .map_err(io_error)?
        .ok_or(KioskError::NoDeviceSelected)?;
    let address = devices[index].address.clone();

    config::store_address(config_path, &address)?;
    writeln!(output, "Saved {} to {}", address, config_path.display()).map_err(io_error)?;
    tracing::info!("Printer address set to {}", address);

    Ok(address)
}
