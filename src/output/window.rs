use super::DisplaySurface;
use crate::session::{InputEvent, Key};
use anyhow::{Context, Result};
use image::RgbImage;
use minifb::{KeyRepeat, Window, WindowOptions};
use std::collections::VecDeque;
use std::time::Duration;

/// Desktop window that shows the display frame and reports key presses.
///
/// The window's update rate limit is the input poll bound: each present
/// blocks for at most `poll_interval` while events are pumped.
pub struct WindowOutput {
    window: Option<Window>,
    buffer: Vec<u32>,
    pending: VecDeque<Key>,
    width: usize,
    height: usize,
}

impl WindowOutput {
    pub fn new(title: &str, width: u32, height: u32, poll_interval: Duration) -> Result<Self> {
        tracing::info!("Opening window '{}' ({}x{})", title, width, height);

        let (width, height) = (width as usize, height as usize);
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .context("Failed to open display window")?;
        window.limit_update_rate(Some(poll_interval));

        Ok(Self {
            window: Some(window),
            buffer: vec![0; width * height],
            pending: VecDeque::new(),
            width,
            height,
        })
    }

    /// Pack RGB pixels into minifb's 0RGB words
    fn rgb_to_0rgb(frame: &RgbImage, buffer: &mut Vec<u32>) {
        buffer.clear();
        buffer.extend(frame.pixels().map(|p| {
            (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2])
        }));
    }
}

impl DisplaySurface for WindowOutput {
    fn present(&mut self, frame: &RgbImage) -> Result<()> {
        let Some(window) = self.window.as_mut() else {
            return Ok(());
        };

        let frame = if frame.dimensions() != (self.width as u32, self.height as u32) {
            image::imageops::resize(
                frame,
                self.width as u32,
                self.height as u32,
                image::imageops::FilterType::Nearest,
            )
        } else {
            frame.clone()
        };

        Self::rgb_to_0rgb(&frame, &mut self.buffer);
        window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .context("Failed to update display window")?;

        self.pending
            .extend(window.get_keys_pressed(KeyRepeat::No).into_iter().map(map_key));
        Ok(())
    }

    fn poll_input(&mut self) -> InputEvent {
        if let Some(key) = self.pending.pop_front() {
            return InputEvent::Key(key);
        }
        match &self.window {
            Some(window) if window.is_open() => InputEvent::None,
            _ => InputEvent::Closed,
        }
    }

    fn release(&mut self) {
        if self.window.take().is_some() {
            tracing::info!("Display window closed");
        }
    }
}

fn map_key(key: minifb::Key) -> Key {
    use minifb::Key as K;
    match key {
        K::Escape => Key::Escape,
        K::Space => Key::Char(' '),
        K::Equal => Key::Char('='),
        K::NumPadPlus => Key::Char('+'),
        K::Minus | K::NumPadMinus => Key::Char('-'),
        other => {
            let name = format!("{:?}", other);
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => Key::Char(c.to_ascii_lowercase()),
                _ => Key::Other(name),
            }
        }
    }
}
