mod webcam;

pub use webcam::WebcamCapture;

use anyhow::Result;
use image::RgbImage;

/// Trait for camera capture sources
pub trait CaptureSource {
    /// Capture a single frame. An error means the device has no more frames.
    fn capture_frame(&mut self) -> Result<RgbImage>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);

    /// Stop the stream and give the device back to the system
    fn release(&mut self) {}
}
