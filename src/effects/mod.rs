//! Per-frame image stages: the dithered look, the face overlay and the
//! captioned display frame.

mod bezel;
mod dither;
mod overlay;

pub use bezel::{compose_display, BezelLayout};
pub use dither::stylize;
pub use overlay::{composite_overlay, OverlayAsset};
