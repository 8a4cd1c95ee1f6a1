//! Crossfade controller for deck handoffs
//!
//! Runs once per progress sample of the active deck and decides whether the
//! other deck should start, and at which volumes both decks sit for this tick.
//!
//! The ramp is a closed-loop proportional approach: each tick moves the
//! volumes by `(V / time_left) * RAMP_GAIN`, so the bounds are reached close
//! to the end of the track regardless of sampling jitter.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Per-tick ramp gain, calibrated against the 150ms sample interval
pub const RAMP_GAIN: f32 = 0.095;

/// Fades at or below this length skip the ramp and start the next deck at full volume
pub const GAPLESS_THRESHOLD_SECS: f64 = 1.5;

/// Crossfade curve type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FadeCurve {
    /// Equal power fade: maintains perceived loudness
    #[default]
    EqualPower,

    /// Linear fade: volumes move by the same step in opposite directions
    Linear,
}

impl FadeCurve {
    /// Calculate the fade gain at a given position
    ///
    /// # Arguments
    /// * `position` - Normalized position in the fade (0.0 to 1.0)
    /// * `fade_out` - If true, calculates fade-out gain; if false, fade-in gain
    #[inline]
    pub fn calculate_gain(&self, position: f32, fade_out: bool) -> f32 {
        let position = position.clamp(0.0, 1.0);
        let t = if fade_out { 1.0 - position } else { position };

        match self {
            FadeCurve::Linear => t,
            // sin²(x) + cos²(x) = 1 keeps the summed power constant
            FadeCurve::EqualPower => (t * PI * 0.5).sin(),
        }
    }

    /// Get a human-readable name for the curve
    pub fn display_name(&self) -> &'static str {
        match self {
            FadeCurve::EqualPower => "Equal Power",
            FadeCurve::Linear => "Linear",
        }
    }
}

/// Everything the controller looks at for one tick
#[derive(Debug, Clone, Copy)]
pub struct FadeInput {
    /// Elapsed seconds on the outgoing (active) deck
    pub elapsed: f64,

    /// Track duration in seconds; `None` while the deck is still buffering
    pub duration: Option<f64>,

    /// Master volume `V`
    pub master_volume: f32,

    /// Current volume of the outgoing deck
    pub outgoing_volume: f32,

    /// Current volume of the incoming deck
    pub incoming_volume: f32,

    /// Whether the incoming deck is already running
    pub incoming_playing: bool,

    /// Whether the queue has an entry to hand off to
    pub next_exists: bool,
}

/// What the supervisor should do with the decks this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeDecision {
    /// Leave both decks untouched
    Hold,

    /// Start the incoming deck straight at this volume
    Gapless { incoming: f32 },

    /// Apply both volumes and make sure the incoming deck runs
    Ramp { outgoing: f32, incoming: f32 },
}

/// Decides handoff timing and ramp volumes
#[derive(Debug, Clone)]
pub struct CrossfadeController {
    fade_duration: f64,
    curve: FadeCurve,
    // Normalized equal-power position of the running fade
    progress: f32,
}

impl CrossfadeController {
    /// Create a controller for a fade length (seconds) and curve
    pub fn new(fade_duration: f64, curve: FadeCurve) -> Self {
        Self {
            fade_duration: fade_duration.max(0.0),
            curve,
            progress: 0.0,
        }
    }

    /// Update settings; takes effect on the next tick
    pub fn configure(&mut self, fade_duration: f64, curve: FadeCurve) {
        self.fade_duration = fade_duration.max(0.0);
        self.curve = curve;
    }

    pub fn fade_duration(&self) -> f64 {
        self.fade_duration
    }

    pub fn curve(&self) -> FadeCurve {
        self.curve
    }

    /// Whether the configured length skips the ramp
    pub fn is_gapless(&self) -> bool {
        self.fade_duration <= GAPLESS_THRESHOLD_SECS
    }

    /// Position at which the handoff begins, `D - F`
    pub fn fade_at(&self, duration: f64) -> f64 {
        duration - self.fade_duration
    }

    /// Forget the running fade (called on every deck flip)
    pub fn reset(&mut self) {
        self.progress = 0.0;
    }

    /// Decide this tick's action
    pub fn tick(&mut self, input: &FadeInput) -> FadeDecision {
        if !input.next_exists {
            return FadeDecision::Hold;
        }

        // Not buffered yet: wait for the next sample
        let Some(duration) = input.duration.filter(|d| d.is_finite() && *d > 0.0) else {
            return FadeDecision::Hold;
        };

        if input.elapsed < self.fade_at(duration) {
            return FadeDecision::Hold;
        }

        let master = input.master_volume;

        // Handoff already complete for this track
        if input.incoming_playing && input.incoming_volume >= master && input.outgoing_volume <= 0.0
        {
            return FadeDecision::Hold;
        }

        if self.is_gapless() {
            return FadeDecision::Gapless { incoming: master };
        }

        let time_left = (duration - input.elapsed) as f32;
        if time_left <= 0.0 || master <= 0.0 {
            self.progress = 1.0;
            return FadeDecision::Ramp {
                outgoing: 0.0,
                incoming: master,
            };
        }

        let step = (master / time_left) * RAMP_GAIN;

        match self.curve {
            FadeCurve::Linear => FadeDecision::Ramp {
                outgoing: (input.outgoing_volume - step).clamp(0.0, master),
                incoming: (input.incoming_volume + step).clamp(0.0, master),
            },
            FadeCurve::EqualPower => {
                self.progress = (self.progress + step / master).min(1.0);
                let outgoing = master * self.curve.calculate_gain(self.progress, true);
                let incoming = master * self.curve.calculate_gain(self.progress, false);
                // Never undo what an earlier tick already applied
                FadeDecision::Ramp {
                    outgoing: outgoing.min(input.outgoing_volume).clamp(0.0, master),
                    incoming: incoming.max(input.incoming_volume).clamp(0.0, master),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(elapsed: f64, duration: f64) -> FadeInput {
        FadeInput {
            elapsed,
            duration: Some(duration),
            master_volume: 1.0,
            outgoing_volume: 1.0,
            incoming_volume: 0.0,
            incoming_playing: false,
            next_exists: true,
        }
    }

    #[test]
    fn test_fade_curve_linear() {
        let curve = FadeCurve::Linear;

        assert!((curve.calculate_gain(0.0, false) - 0.0).abs() < 0.001);
        assert!((curve.calculate_gain(0.5, false) - 0.5).abs() < 0.001);
        assert!((curve.calculate_gain(1.0, false) - 1.0).abs() < 0.001);

        assert!((curve.calculate_gain(0.0, true) - 1.0).abs() < 0.001);
        assert!((curve.calculate_gain(1.0, true) - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_fade_curve_equal_power() {
        let curve = FadeCurve::EqualPower;

        assert!((curve.calculate_gain(0.0, false) - 0.0).abs() < 0.001);
        assert!((curve.calculate_gain(1.0, false) - 1.0).abs() < 0.001);

        let mid_in = curve.calculate_gain(0.5, false);
        let mid_out = curve.calculate_gain(0.5, true);
        let sum_of_squares = mid_in * mid_in + mid_out * mid_out;
        assert!(
            (sum_of_squares - 1.0).abs() < 0.01,
            "Equal power: sum of squares = {}, expected ~1.0",
            sum_of_squares
        );
    }

    #[test]
    fn test_hold_before_fade_point() {
        let mut controller = CrossfadeController::new(5.0, FadeCurve::Linear);
        assert_eq!(controller.tick(&input(24.0, 30.0)), FadeDecision::Hold);
    }

    #[test]
    fn test_hold_without_next_track() {
        let mut controller = CrossfadeController::new(5.0, FadeCurve::Linear);
        let mut tick = input(28.0, 30.0);
        tick.next_exists = false;
        assert_eq!(controller.tick(&tick), FadeDecision::Hold);
    }

    #[test]
    fn test_hold_while_unbuffered() {
        let mut controller = CrossfadeController::new(5.0, FadeCurve::Linear);
        let mut tick = input(28.0, 30.0);
        tick.duration = None;
        assert_eq!(controller.tick(&tick), FadeDecision::Hold);

        tick.duration = Some(f64::NAN);
        assert_eq!(controller.tick(&tick), FadeDecision::Hold);
    }

    #[test]
    fn test_linear_first_step() {
        let mut controller = CrossfadeController::new(5.0, FadeCurve::Linear);
        let step = (1.0 / 4.0) * RAMP_GAIN;

        match controller.tick(&input(26.0, 30.0)) {
            FadeDecision::Ramp { outgoing, incoming } => {
                assert!((outgoing - (1.0 - step)).abs() < 1e-6);
                assert!((incoming - step).abs() < 1e-6);
            }
            other => panic!("Expected ramp, got {:?}", other),
        }
    }

    #[test]
    fn test_gapless_sets_full_volume() {
        let mut controller = CrossfadeController::new(1.5, FadeCurve::EqualPower);
        let mut tick = input(29.0, 30.0);
        tick.master_volume = 0.7;
        assert_eq!(
            controller.tick(&tick),
            FadeDecision::Gapless { incoming: 0.7 }
        );
    }

    #[test]
    fn test_disabled_fade_triggers_at_end() {
        let mut controller = CrossfadeController::new(0.0, FadeCurve::EqualPower);
        assert_eq!(controller.tick(&input(29.9, 30.0)), FadeDecision::Hold);
        assert_eq!(
            controller.tick(&input(30.0, 30.0)),
            FadeDecision::Gapless { incoming: 1.0 }
        );
    }

    #[test]
    fn test_completed_handoff_is_idempotent() {
        let mut controller = CrossfadeController::new(5.0, FadeCurve::Linear);
        let mut tick = input(29.0, 30.0);
        tick.outgoing_volume = 0.0;
        tick.incoming_volume = 1.0;
        tick.incoming_playing = true;
        assert_eq!(controller.tick(&tick), FadeDecision::Hold);
    }

    #[test]
    fn test_snap_when_no_time_left() {
        let mut controller = CrossfadeController::new(5.0, FadeCurve::EqualPower);
        assert_eq!(
            controller.tick(&input(30.0, 30.0)),
            FadeDecision::Ramp {
                outgoing: 0.0,
                incoming: 1.0
            }
        );
    }

    #[test]
    fn test_equal_power_reaches_bounds() {
        let mut controller = CrossfadeController::new(5.0, FadeCurve::EqualPower);
        let mut out = 1.0;
        let mut inc = 0.0;
        let mut elapsed = 25.0;

        while elapsed < 30.0 {
            let mut tick = input(elapsed, 30.0);
            tick.outgoing_volume = out;
            tick.incoming_volume = inc;
            tick.incoming_playing = inc > 0.0;
            if let FadeDecision::Ramp { outgoing, incoming } = controller.tick(&tick) {
                assert!(outgoing <= out && incoming >= inc);
                out = outgoing;
                inc = incoming;
            }
            elapsed += 0.15;
        }

        assert!(out < 1e-3, "outgoing should reach 0, got {}", out);
        assert!((inc - 1.0).abs() < 1e-3, "incoming should reach 1, got {}", inc);
    }

    #[test]
    fn test_reset_restarts_equal_power_ramp() {
        let mut controller = CrossfadeController::new(5.0, FadeCurve::EqualPower);
        controller.tick(&input(29.0, 30.0));
        controller.reset();

        let first = controller.tick(&input(26.0, 30.0));
        match first {
            FadeDecision::Ramp { incoming, .. } => assert!(incoming < 0.1),
            other => panic!("Expected ramp, got {:?}", other),
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(FadeCurve::Linear.display_name(), "Linear");
        assert_eq!(FadeCurve::EqualPower.display_name(), "Equal Power");
    }
}
