mod window;

pub use window::WindowOutput;

use crate::session::InputEvent;
use anyhow::Result;
use image::RgbImage;

/// Trait for output surfaces that also deliver keyboard input
pub trait DisplaySurface {
    /// Show a frame
    fn present(&mut self, frame: &RgbImage) -> Result<()>;

    /// Next input event, waiting at most the surface's poll interval
    fn poll_input(&mut self) -> InputEvent;

    /// Close the surface
    fn release(&mut self) {}
}
