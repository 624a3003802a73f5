use super::CaptureSource;
use crate::error::KioskError;
use anyhow::{Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
    streaming: bool,
}

impl WebcamCapture {
    pub fn new(device_index: u32) -> Result<Self, KioskError> {
        tracing::info!("Initializing webcam {}", device_index);

        let unavailable = |e: nokhwa::NokhwaError| KioskError::CameraUnavailable {
            index: device_index,
            reason: e.to_string(),
        };

        let index = CameraIndex::Index(device_index);
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

        let mut camera = Camera::new(index, requested).map_err(unavailable)?;
        camera.open_stream().map_err(unavailable)?;

        let resolution = camera.resolution();
        tracing::info!(
            "Webcam streaming at {}x{}",
            resolution.width(),
            resolution.height()
        );

        Ok(Self {
            camera,
            width: resolution.width(),
            height: resolution.height(),
            streaming: true,
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<RgbImage> {
        let frame = self
            .camera
            .frame()
            .context("Failed to capture frame")?;

        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;

        Ok(decoded)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn release(&mut self) {
        if !self.streaming {
            return;
        }
        self.streaming = false;
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("Failed to stop camera stream: {}", e);
        }
        tracing::info!("Webcam released");
    }
}
