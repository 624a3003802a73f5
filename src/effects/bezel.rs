use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{imageops, Rgb, RgbImage};

const GLYPH_SIZE: u32 = 8;
const BEZEL_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Geometry and captions of the final display frame.
#[derive(Debug, Clone)]
pub struct BezelLayout {
    pub content_width: u32,
    pub content_height: u32,
    pub strip_height: u32,
    pub text_scale: u32,
    pub top_caption: String,
    pub bottom_caption: String,
}

impl Default for BezelLayout {
    fn default() -> Self {
        Self {
            content_width: 400,
            content_height: 200,
            strip_height: 50,
            text_scale: 2,
            top_caption: "Moustache Cam".to_string(),
            bottom_caption: "BeagleBadge".to_string(),
        }
    }
}

impl BezelLayout {
    /// Size of every frame produced by [`compose_display`].
    pub fn display_dimensions(&self) -> (u32, u32) {
        (
            self.content_width,
            self.content_height + 2 * self.strip_height,
        )
    }
}

/// Rescale `styled` to the content area and stack it between two caption strips.
///
/// The result always has [`BezelLayout::display_dimensions`], whatever the
/// size of `styled`.
pub fn compose_display(styled: &RgbImage, layout: &BezelLayout) -> RgbImage {
    let _span = tracing::debug_span!("compose_display").entered();

    let (width, height) = layout.display_dimensions();
    let mut display = RgbImage::from_pixel(width, height, BEZEL_COLOR);

    let content = if styled.dimensions() == (layout.content_width, layout.content_height) {
        styled.clone()
    } else {
        imageops::resize(
            styled,
            layout.content_width,
            layout.content_height,
            imageops::FilterType::Nearest,
        )
    };
    imageops::replace(&mut display, &content, 0, i64::from(layout.strip_height));

    draw_caption(&mut display, &layout.top_caption, 0, layout);
    draw_caption(
        &mut display,
        &layout.bottom_caption,
        layout.strip_height + layout.content_height,
        layout,
    );

    display
}

/// Draw `text` centered inside the strip starting at row `strip_top`.
fn draw_caption(display: &mut RgbImage, text: &str, strip_top: u32, layout: &BezelLayout) {
    let scale = layout.text_scale.max(1);
    let advance = GLYPH_SIZE * scale;
    let text_width = advance * text.chars().count() as u32;
    let left = i64::from(layout.content_width.saturating_sub(text_width) / 2);
    let top = i64::from(strip_top + layout.strip_height.saturating_sub(advance) / 2);
    let strip_bottom = i64::from(strip_top + layout.strip_height);

    for (index, ch) in text.chars().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            continue;
        };
        let glyph_left = left + index as i64 * i64::from(advance);

        for (row, bits) in glyph.into_iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1u8 << col) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let x = glyph_left + i64::from(col * scale + sx);
                        let y = top + row as i64 * i64::from(scale) + i64::from(sy);
                        if x >= 0 && x < i64::from(display.width()) && y < strip_bottom {
                            display.put_pixel(x as u32, y as u32, TEXT_COLOR);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_size_is_fixed_for_every_tier() {
        let layout = BezelLayout::default();
        for (w, h) in [(128, 112), (192, 168), (288, 252), (7, 3)] {
            let display = compose_display(&RgbImage::new(w, h), &layout);
            assert_eq!(display.dimensions(), (400, 300));
        }
    }

    #[test]
    fn content_sits_between_strips() {
        let layout = BezelLayout::default();
        let styled = RgbImage::from_pixel(128, 112, Rgb([255, 255, 255]));
        let display = compose_display(&styled, &layout);

        assert_eq!(*display.get_pixel(0, 49), BEZEL_COLOR);
        assert_eq!(*display.get_pixel(0, 50), Rgb([255, 255, 255]));
        assert_eq!(*display.get_pixel(399, 249), Rgb([255, 255, 255]));
        assert_eq!(*display.get_pixel(0, 250), BEZEL_COLOR);
    }

    #[test]
    fn captions_are_drawn_inside_their_strips() {
        let layout = BezelLayout::default();
        let display = compose_display(&RgbImage::new(128, 112), &layout);

        let lit_rows = |from: u32, to: u32| {
            (from..to).any(|y| (0..400).any(|x| *display.get_pixel(x, y) == TEXT_COLOR))
        };
        assert!(lit_rows(0, 50));
        assert!(!lit_rows(50, 250));
        assert!(lit_rows(250, 300));
    }

    #[test]
    fn blank_captions_leave_strips_dark() {
        let layout = BezelLayout {
            top_caption: String::new(),
            bottom_caption: " ".to_string(),
            ..BezelLayout::default()
        };
        let display = compose_display(&RgbImage::new(10, 10), &layout);
        assert!((0..50).all(|y| (0..400).all(|x| *display.get_pixel(x, y) == BEZEL_COLOR)));
        assert!((250..300).all(|y| (0..400).all(|x| *display.get_pixel(x, y) == BEZEL_COLOR)));
    }
}
