//! Live parameters of a kiosk session and the key-driven transitions over them.

use crate::error::KioskError;

/// Working resolutions, smallest first.
pub const RESOLUTION_TIERS: [(u32, u32); 6] = [
    (128, 112),
    (160, 140),
    (192, 168),
    (224, 196),
    (256, 224),
    (288, 252),
];

/// Luma cut values cycled by the threshold key.
pub const THRESHOLD_LEVELS: [u8; 3] = [96, 128, 160];

/// A key reported by the display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Other(String),
}

/// Result of one bounded input poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Nothing arrived within the wait bound.
    None,
    Key(Key),
    /// The operator closed the output surface.
    Closed,
}

/// What the frame loop must do after an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Continue,
    Quit,
    Capture,
    Unrecognized(Key),
}

/// The mutable part of a session: indices into the fixed tables plus the overlay flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub tier: usize,
    pub threshold: usize,
    pub overlay: bool,
}

/// Owns the session parameters and applies input events to them.
#[derive(Debug, Clone)]
pub struct Session {
    tiers: Vec<(u32, u32)>,
    thresholds: Vec<u8>,
    state: SessionState,
}

impl Session {
    pub fn new(
        tiers: Vec<(u32, u32)>,
        thresholds: Vec<u8>,
        initial: SessionState,
    ) -> Result<Self, KioskError> {
        let increasing = tiers
            .windows(2)
            .all(|pair| area(pair[0]) < area(pair[1]));
        if tiers.is_empty() || !increasing {
            return Err(KioskError::InvalidTiers);
        }
        if thresholds.is_empty() {
            return Err(KioskError::InvalidThresholds);
        }

        let state = SessionState {
            tier: initial.tier.min(tiers.len() - 1),
            threshold: initial.threshold % thresholds.len(),
            overlay: initial.overlay,
        };

        Ok(Self {
            tiers,
            thresholds,
            state,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Dimensions of the current working resolution.
    pub fn working_size(&self) -> (u32, u32) {
        self.tiers[self.state.tier]
    }

    /// Current luma cut value.
    pub fn threshold(&self) -> u8 {
        self.thresholds[self.state.threshold]
    }

    pub fn overlay_enabled(&self) -> bool {
        self.state.overlay
    }

    /// Apply one input event. Every event maps to some transition, so the
    /// state is always left valid.
    pub fn handle(&mut self, event: &InputEvent) -> Transition {
        let key = match event {
            InputEvent::None => return Transition::Continue,
            InputEvent::Closed => return Transition::Quit,
            InputEvent::Key(key) => key,
        };

        match key {
            Key::Char('q') | Key::Escape => Transition::Quit,
            Key::Char('m') => {
                self.state.overlay = !self.state.overlay;
                tracing::info!(
                    "Overlay {}",
                    if self.state.overlay { "on" } else { "off" }
                );
                Transition::Continue
            }
            Key::Char('+') | Key::Char('=') => {
                self.state.tier = (self.state.tier + 1).min(self.tiers.len() - 1);
                self.log_resolution();
                Transition::Continue
            }
            Key::Char('-') => {
                self.state.tier = self.state.tier.saturating_sub(1);
                self.log_resolution();
                Transition::Continue
            }
            Key::Char('t') => {
                self.state.threshold = (self.state.threshold + 1) % self.thresholds.len();
                tracing::info!("Threshold: {}", self.threshold());
                Transition::Continue
            }
            Key::Char(' ') => Transition::Capture,
            other => Transition::Unrecognized(other.clone()),
        }
    }

    fn log_resolution(&self) {
        let (width, height) = self.working_size();
        tracing::info!("Resolution: {}x{}", width, height);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            tiers: RESOLUTION_TIERS.to_vec(),
            thresholds: THRESHOLD_LEVELS.to_vec(),
            state: SessionState {
                tier: 0,
                threshold: 1,
                overlay: false,
            },
        }
    }
}

fn area((width, height): (u32, u32)) -> u64 {
    u64::from(width) * u64::from(height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(session: &mut Session, c: char) -> Transition {
        session.handle(&InputEvent::Key(Key::Char(c)))
    }

    #[test]
    fn increase_clamps_at_last_tier() {
        let mut session = Session::default();
        for _ in 0..5 {
            assert_eq!(press(&mut session, '+'), Transition::Continue);
        }
        assert_eq!(session.state().tier, 5);
        assert_eq!(session.working_size(), (288, 252));

        press(&mut session, '=');
        assert_eq!(session.state().tier, 5);
    }

    #[test]
    fn increase_on_shortened_table_stops_at_last_index() {
        let tiers = RESOLUTION_TIERS[..5].to_vec();
        let mut session = Session::new(
            tiers,
            THRESHOLD_LEVELS.to_vec(),
            SessionState {
                tier: 0,
                threshold: 0,
                overlay: false,
            },
        )
        .unwrap();
        for _ in 0..5 {
            press(&mut session, '+');
        }
        assert_eq!(session.state().tier, 4);
        assert_eq!(session.working_size(), (256, 224));
        press(&mut session, '+');
        assert_eq!(session.state().tier, 4);
    }

    #[test]
    fn decrease_clamps_at_zero() {
        let mut session = Session::default();
        press(&mut session, '-');
        assert_eq!(session.state().tier, 0);
        press(&mut session, '+');
        press(&mut session, '+');
        press(&mut session, '-');
        assert_eq!(session.state().tier, 1);
    }

    #[test]
    fn threshold_cycles_back_to_start() {
        let mut session = Session::default();
        let start = session.state().threshold;
        assert_eq!(session.threshold(), 128);
        press(&mut session, 't');
        assert_eq!(session.threshold(), 160);
        press(&mut session, 't');
        assert_eq!(session.threshold(), 96);
        press(&mut session, 't');
        assert_eq!(session.state().threshold, start);
    }

    #[test]
    fn overlay_toggle_twice_restores_flag() {
        let mut session = Session::default();
        assert!(!session.overlay_enabled());
        press(&mut session, 'm');
        assert!(session.overlay_enabled());
        press(&mut session, 'm');
        assert!(!session.overlay_enabled());
    }

    #[test]
    fn quit_and_capture_leave_state_alone() {
        let mut session = Session::default();
        let before = session.state();
        assert_eq!(press(&mut session, 'q'), Transition::Quit);
        assert_eq!(session.handle(&InputEvent::Key(Key::Escape)), Transition::Quit);
        assert_eq!(session.handle(&InputEvent::Closed), Transition::Quit);
        assert_eq!(press(&mut session, ' '), Transition::Capture);
        assert_eq!(session.state(), before);
    }

    #[test]
    fn unknown_keys_and_timeouts_change_nothing() {
        let mut session = Session::default();
        let before = session.state();
        assert_eq!(
            press(&mut session, 'x'),
            Transition::Unrecognized(Key::Char('x'))
        );
        let other = Key::Other("F5".to_string());
        assert_eq!(
            session.handle(&InputEvent::Key(other.clone())),
            Transition::Unrecognized(other)
        );
        assert_eq!(session.handle(&InputEvent::None), Transition::Continue);
        assert_eq!(session.state(), before);
    }

    #[test]
    fn invalid_tables_are_rejected() {
        let initial = SessionState {
            tier: 0,
            threshold: 0,
            overlay: false,
        };
        assert!(matches!(
            Session::new(vec![], vec![128], initial),
            Err(KioskError::InvalidTiers)
        ));
        assert!(matches!(
            Session::new(vec![(160, 140), (128, 112)], vec![128], initial),
            Err(KioskError::InvalidTiers)
        ));
        assert!(matches!(
            Session::new(vec![(128, 112)], vec![], initial),
            Err(KioskError::InvalidThresholds)
        ));
    }

    #[test]
    fn initial_indices_are_brought_into_range() {
        let session = Session::new(
            RESOLUTION_TIERS.to_vec(),
            THRESHOLD_LEVELS.to_vec(),
            SessionState {
                tier: 42,
                threshold: 4,
                overlay: true,
            },
        )
        .unwrap();
        assert_eq!(session.state().tier, 5);
        assert_eq!(session.state().threshold, 1);
    }
}
