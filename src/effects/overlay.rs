use crate::error::KioskError;
use crate::face::FaceRegion;
use image::{imageops, RgbImage, RgbaImage};
use std::path::Path;

/// Overlay width as a fraction of the face width.
const WIDTH_RATIO: f64 = 0.6;
/// Vertical placement as a fraction of the face height, from its top edge.
const DROP_RATIO: f64 = 0.55;

/// Immutable RGBA image pasted onto each detected face.
#[derive(Debug, Clone)]
pub struct OverlayAsset {
    image: RgbaImage,
}

impl OverlayAsset {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, KioskError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| KioskError::OverlayAsset {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();

        tracing::info!(
            "Loaded overlay {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::new(image))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Where the overlay lands for a face: top-left corner and scaled size.
pub(crate) fn placement(face: &FaceRegion, asset: &OverlayAsset) -> Option<(i64, i64, u32, u32)> {
    let (asset_width, asset_height) = asset.dimensions();
    let width = (f64::from(face.width) * WIDTH_RATIO) as u32;
    if width == 0 || asset_width == 0 {
        return None;
    }
    let height = (u64::from(width) * u64::from(asset_height) / u64::from(asset_width)) as u32;
    if height == 0 {
        return None;
    }
    let x = (f64::from(face.x) + f64::from(face.width) / 2.0 - f64::from(width) / 2.0) as i64;
    let y = (f64::from(face.y) + f64::from(face.height) * DROP_RATIO) as i64;
    Some((x, y, width, height))
}

/// Paste `asset` onto every face in detection order.
///
/// Only asset pixels with non-zero alpha are copied, without blending.
/// Anything falling outside the frame is dropped.
pub fn composite_overlay(frame: &mut RgbImage, faces: &[FaceRegion], asset: &OverlayAsset) {
    let (frame_width, frame_height) = frame.dimensions();

    for face in faces {
        let Some((left, top, width, height)) = placement(face, asset) else {
            continue;
        };
        let scaled = imageops::resize(&asset.image, width, height, imageops::FilterType::Triangle);

        for (sx, sy, pixel) in scaled.enumerate_pixels() {
            if pixel[3] == 0 {
                continue;
            }
            let dx = left + i64::from(sx);
            let dy = top + i64::from(sy);
            if dx < 0 || dy < 0 || dx >= i64::from(frame_width) || dy >= i64::from(frame_height) {
                continue;
            }
            frame.put_pixel(dx as u32, dy as u32, image::Rgb([pixel[0], pixel[1], pixel[2]]));
        }
    }
}
