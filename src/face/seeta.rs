use super::{FaceLocator, FaceRegion};
use crate::error::KioskError;
use image::GrayImage;
use rustface::{Detector, ImageData, Rectangle};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const MIN_FACE_SIZE: u32 = 20;
const SCORE_THRESHOLD: f64 = 2.0;
const PYRAMID_SCALE_FACTOR: f32 = 0.8;
const WINDOW_STEP: u32 = 4;

/// Face locator backed by the SeetaFace frontal cascade from `rustface`.
///
/// Sensitivity is fixed for the whole session.
pub struct SeetaFaceLocator {
    detector: Box<dyn Detector>,
}

impl SeetaFaceLocator {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self, KioskError> {
        let path = model_path.as_ref();
        tracing::info!("Loading face model from {}", path.display());

        let model = File::open(path)
            .map(BufReader::new)
            .and_then(rustface::read_model)
            .map_err(|source| KioskError::FaceModel {
                path: path.to_path_buf(),
                source,
            })?;

        let mut detector = rustface::create_detector_with_model(model);
        detector.set_min_face_size(MIN_FACE_SIZE);
        detector.set_score_thresh(SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE_FACTOR);
        detector.set_slide_window_step(WINDOW_STEP, WINDOW_STEP);

        Ok(Self { detector })
    }
}

impl FaceLocator for SeetaFaceLocator {
    fn locate(&mut self, gray: &GrayImage) -> Vec<FaceRegion> {
        let _span = tracing::debug_span!("locate_faces").entered();

        let (width, height) = gray.dimensions();
        let faces = self
            .detector
            .detect(&ImageData::new(gray.as_raw(), width, height));

        faces.iter().map(|face| region_from_bbox(face.bbox())).collect()
    }
}

fn region_from_bbox(bbox: &Rectangle) -> FaceRegion {
    FaceRegion::new(bbox.x(), bbox.y(), bbox.width(), bbox.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_maps_to_region() {
        let bbox = Rectangle::new(10, 20, 100, 120);
        assert_eq!(region_from_bbox(&bbox), FaceRegion::new(10, 20, 100, 120));
    }

    #[test]
    fn negative_origin_is_kept() {
        let bbox = Rectangle::new(-8, -3, 40, 40);
        assert_eq!(region_from_bbox(&bbox), FaceRegion::new(-8, -3, 40, 40));
    }
}
