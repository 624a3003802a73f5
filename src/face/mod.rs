mod seeta;

pub use seeta::SeetaFaceLocator;

use image::GrayImage;

/// Axis-aligned face rectangle in the coordinates of the frame it was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Trait for face locators
/// Allows swapping the detector backend without touching the frame loop.
pub trait FaceLocator {
    /// Find faces in a grayscale frame.
    ///
    /// Returns an empty list when nothing is found; detection problems are
    /// never surfaced to the caller.
    fn locate(&mut self, gray: &GrayImage) -> Vec<FaceRegion>;
}
