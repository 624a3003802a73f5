use image::{imageops, GrayImage, Luma, RgbImage};

/// Block size of the low-resolution look, in working pixels.
pub const DOWNSAMPLE_FACTOR: u32 = 4;

/// Render `frame` as a blocky two-level monochrome image.
///
/// The frame is shrunk by [`DOWNSAMPLE_FACTOR`] with nearest-neighbour
/// sampling, converted to luma, cut at `threshold` (samples at or above it
/// become white, the rest black) and stretched back to the exact input size.
pub fn stylize(frame: &RgbImage, threshold: u8) -> RgbImage {
    let _span = tracing::debug_span!("stylize").entered();

    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return frame.clone();
    }

    // Truncate toward zero but keep at least one sample per axis.
    let small_width = (width / DOWNSAMPLE_FACTOR).max(1);
    let small_height = (height / DOWNSAMPLE_FACTOR).max(1);
    let small = imageops::resize(
        frame,
        small_width,
        small_height,
        imageops::FilterType::Nearest,
    );

    let mut luma = imageops::grayscale(&small);
    binarize(&mut luma, threshold);

    let full = imageops::resize(&luma, width, height, imageops::FilterType::Nearest);

    RgbImage::from_fn(width, height, |x, y| {
        let value = full.get_pixel(x, y)[0];
        image::Rgb([value, value, value])
    })
}

fn binarize(luma: &mut GrayImage, threshold: u8) {
    for pixel in luma.pixels_mut() {
        *pixel = if pixel[0] >= threshold {
            Luma([u8::MAX])
        } else {
            Luma([u8::MIN])
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    // Black left margin, white right margin, noise in between.
    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if x < width / 4 {
                return image::Rgb([0, 0, 0]);
            }
            if x >= width - width / 4 {
                return image::Rgb([255, 255, 255]);
            }
            let v = ((x * 7 + y * 13) % 256) as u8;
            image::Rgb([v, v.wrapping_mul(3), 255 - v])
        })
    }

    fn levels(frame: &RgbImage) -> BTreeSet<u8> {
        frame
            .pixels()
            .flat_map(|p| p.0)
            .collect()
    }

    #[test]
    fn output_is_two_level_and_same_size() {
        let frame = gradient(128, 112);
        for threshold in [96, 128, 160] {
            let styled = stylize(&frame, threshold);
            assert_eq!(styled.dimensions(), frame.dimensions());
            assert_eq!(levels(&styled), BTreeSet::from([0, 255]));
            assert!(styled.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
        }
    }

    #[test]
    fn stylize_is_deterministic() {
        let frame = gradient(160, 140);
        assert_eq!(stylize(&frame, 128).as_raw(), stylize(&frame, 128).as_raw());
    }

    #[test]
    fn indivisible_dimensions_are_preserved() {
        let frame = gradient(203, 97);
        let styled = stylize(&frame, 128);
        assert_eq!(styled.dimensions(), (203, 97));

        let tiny = gradient(3, 2);
        assert_eq!(stylize(&tiny, 128).dimensions(), (3, 2));
    }

    #[test]
    fn threshold_is_inclusive() {
        let frame = RgbImage::from_pixel(8, 8, image::Rgb([128, 128, 128]));
        assert!(stylize(&frame, 128).pixels().all(|p| p[0] == 255));
        assert!(stylize(&frame, 129).pixels().all(|p| p[0] == 0));
    }
}
