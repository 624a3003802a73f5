use crate::capture::CaptureSource;
use crate::effects::{self, BezelLayout, OverlayAsset};
use crate::face::FaceLocator;
use crate::output::DisplaySurface;
use crate::session::{Session, Transition};
use crate::snapshot::CaptureSink;
use anyhow::{Context, Result};
use image::{imageops, RgbImage};
use std::time::{Duration, Instant};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The operator asked to quit or closed the window.
    Quit,
    /// The camera stopped producing frames.
    EndOfStream,
}

#[derive(Default)]
struct Stats {
    frames: u64,
    capture: Duration,
    effect: Duration,
    present: Duration,
}

impl Stats {
    fn log_every(&self, interval: u64) {
        if self.frames == 0 || self.frames % interval != 0 {
            return;
        }
        let avg = |total: Duration| total.as_secs_f64() * 1000.0 / self.frames as f64;
        let (capture_ms, effect_ms, present_ms) =
            (avg(self.capture), avg(self.effect), avg(self.present));
        tracing::info!(
            "Frame {}: capture={:.1}ms, effect={:.1}ms, present={:.1}ms, total={:.1}ms",
            self.frames,
            capture_ms,
            effect_ms,
            present_ms,
            capture_ms + effect_ms + present_ms
        );
    }
}

/// Drives capture, effects, display and input for one session.
pub struct FrameLoop<C, D> {
    capture: C,
    display: D,
    locator: Box<dyn FaceLocator>,
    overlay: OverlayAsset,
    session: Session,
    layout: BezelLayout,
    sink: CaptureSink,
}

impl<C, D> FrameLoop<C, D>
where
    C: CaptureSource,
    D: DisplaySurface,
{
    pub fn new(
        capture: C,
        display: D,
        locator: Box<dyn FaceLocator>,
        overlay: OverlayAsset,
        session: Session,
        layout: BezelLayout,
        sink: CaptureSink,
    ) -> Self {
        Self {
            capture,
            display,
            locator,
            overlay,
            session,
            layout,
            sink,
        }
    }

    /// Run until quit or end of stream, then release the camera and the
    /// display exactly once, whatever the outcome.
    pub fn run(mut self) -> Result<Termination> {
        let result = self.run_until_terminated();

        self.capture.release();
        self.display.release();

        result
    }

    fn run_until_terminated(&mut self) -> Result<Termination> {
        let mut stats = Stats::default();

        tracing::info!("Starting main loop");
        tracing::info!(
            "Controls: [q] quit [m] overlay [+/-] resolution [t] threshold [space] capture"
        );

        loop {
            let capture_start = Instant::now();
            let raw = match self.capture.capture_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::info!("Can't receive frame (stream end?): {:#}", e);
                    return Ok(Termination::EndOfStream);
                }
            };
            stats.capture += capture_start.elapsed();

            let effect_start = Instant::now();
            let display = self.render(&raw);
            stats.effect += effect_start.elapsed();

            let present_start = Instant::now();
            self.display
                .present(&display)
                .context("Failed to present frame")?;
            stats.present += present_start.elapsed();

            stats.frames += 1;
            stats.log_every(30);

            let event = self.display.poll_input();
            match self.session.handle(&event) {
                Transition::Continue => {}
                Transition::Quit => return Ok(Termination::Quit),
                Transition::Capture => {
                    if let Err(e) = self.sink.capture(&display) {
                        tracing::warn!("Capture failed: {:#}", e);
                    }
                }
                Transition::Unrecognized(key) => {
                    tracing::info!("Unrecognized key {:?} ({:?})", key, self.session.state());
                }
            }
        }
    }

    /// Turn one raw camera frame into the final captioned display frame.
    fn render(&mut self, raw: &RgbImage) -> RgbImage {
        let (width, height) = self.session.working_size();
        let mut working = imageops::resize(raw, width, height, imageops::FilterType::Triangle);

        if self.session.overlay_enabled() {
            let gray = imageops::grayscale(&working);
            let faces = self.locator.locate(&gray);
            if !faces.is_empty() {
                tracing::debug!("Found {} faces", faces.len());
            }
            effects::composite_overlay(&mut working, &faces, &self.overlay);
        }

        let styled = effects::stylize(&working, self.session.threshold());
        effects::compose_display(&styled, &self.layout)
    }
}
