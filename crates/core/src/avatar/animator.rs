//! Free-running procedural animator.

use super::{AvatarSignal, Emotion};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::time::Duration;

/// Seconds between blinks, re-armed at random after each blink.
const BLINK_INTERVAL_MIN_S: f32 = 3.0;
const BLINK_INTERVAL_MAX_S: f32 = 5.0;
/// How long the eyes stay forced shut.
const BLINK_DURATION_S: f32 = 0.15;
const BLINK_EYE_SCALE: f32 = 0.1;
/// Perpetual gentle squint while the emotion is happy.
const HAPPY_EYE_SCALE: f32 = 0.8;

/// Cadence at which a new mouth-openness target is drawn while speaking.
const MOUTH_RESAMPLE_S: f32 = 0.1;
/// Smoothing time constants: chasing a target while speaking, decaying to
/// closed while silent.
const MOUTH_ATTACK_TAU_S: f32 = 0.06;
const MOUTH_RELEASE_TAU_S: f32 = 0.12;

/// Idle head sway: amplitude in degrees and period in seconds.
const TILT_AMPLITUDE_DEG: f32 = 2.0;
const TILT_PERIOD_S: f32 = TAU;
/// Extra faster wobble superimposed while speaking.
const SPEAKING_WOBBLE_DEG: f32 = 0.5;
const SPEAKING_WOBBLE_HZ: f32 = 2.0;

const TILT_MIN_DEG: f32 = -2.0;
const TILT_MAX_DEG: f32 = 2.0;

/// The continuous, numeric, per-tick output actually rendered.
///
/// Recreated every tick; every numeric field is clamped to its declared range
/// at the point of computation, never asserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationState {
    pub blinking: bool,
    /// `[0, 1]`
    pub mouth_openness: f32,
    /// `[-2, 2]` degrees
    pub head_tilt_deg: f32,
    /// `[0.1, 1]`
    pub eye_scale_y: f32,
    pub brow_angle: f32,
    pub mouth_curve: f32,
}

/// Turns coarse [`AvatarSignal`]s into lifelike continuous motion.
///
/// The animator keeps only the continuity it needs between ticks (blink
/// phase, smoothed mouth value, its own clock); it never blocks waiting for a
/// new signal and produces a full state every tick regardless of signal
/// staleness.
pub struct AvatarAnimator {
    rng: StdRng,
    clock_s: f32,
    blink_countdown_s: f32,
    blink_remaining_s: f32,
    mouth_target: f32,
    mouth_value: f32,
    resample_countdown_s: f32,
}

impl AvatarAnimator {
    pub fn new() -> Self {
        Self::seeded(rand::random())
    }

    /// Seeded constructor for deterministic tests.
    pub fn seeded(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let first_blink = rng.random_range(BLINK_INTERVAL_MIN_S..BLINK_INTERVAL_MAX_S);
        Self {
            rng,
            clock_s: 0.0,
            blink_countdown_s: first_blink,
            blink_remaining_s: 0.0,
            mouth_target: 0.0,
            mouth_value: 0.0,
            resample_countdown_s: 0.0,
        }
    }

    /// Advances the animation clock by `dt` and produces the next state.
    pub fn tick(&mut self, dt: Duration, signal: &AvatarSignal) -> AnimationState {
        let dt_s = dt.as_secs_f32();
        self.clock_s += dt_s;

        // Blink phase: countdown arms the blink, the blink window holds the
        // eyes shut, then the countdown is re-armed at random.
        if self.blink_remaining_s > 0.0 {
            self.blink_remaining_s = (self.blink_remaining_s - dt_s).max(0.0);
        } else {
            self.blink_countdown_s -= dt_s;
            if self.blink_countdown_s <= 0.0 {
                self.blink_remaining_s = BLINK_DURATION_S;
                self.blink_countdown_s = self
                    .rng
                    .random_range(BLINK_INTERVAL_MIN_S..BLINK_INTERVAL_MAX_S);
            }
        }
        let blinking = self.blink_remaining_s > 0.0;

        // Mouth: chase a periodically resampled random target while speaking,
        // decay to closed while silent. Smoothing is dt-aware so the motion
        // looks the same across tick rates.
        if signal.speaking {
            self.resample_countdown_s -= dt_s;
            if self.resample_countdown_s <= 0.0 {
                self.mouth_target = self.rng.random::<f32>();
                self.resample_countdown_s = MOUTH_RESAMPLE_S;
            }
            let alpha = 1.0 - (-dt_s / MOUTH_ATTACK_TAU_S).exp();
            self.mouth_value += (self.mouth_target - self.mouth_value) * alpha;
        } else {
            self.mouth_target = 0.0;
            self.resample_countdown_s = 0.0;
            let alpha = 1.0 - (-dt_s / MOUTH_RELEASE_TAU_S).exp();
            self.mouth_value -= self.mouth_value * alpha;
        }
        let mouth_openness = self.mouth_value.clamp(0.0, 1.0);

        // Idle "breathing" sway, slightly livelier while speaking.
        let mut tilt = TILT_AMPLITUDE_DEG * (TAU * self.clock_s / TILT_PERIOD_S).sin();
        if signal.speaking {
            tilt += SPEAKING_WOBBLE_DEG * (TAU * SPEAKING_WOBBLE_HZ * self.clock_s).sin();
        }
        let head_tilt_deg = tilt.clamp(TILT_MIN_DEG, TILT_MAX_DEG);

        let eye_scale_y = if blinking {
            BLINK_EYE_SCALE
        } else if signal.emotion == Emotion::Happy {
            HAPPY_EYE_SCALE
        } else {
            1.0
        }
        .clamp(0.1, 1.0);

        AnimationState {
            blinking,
            mouth_openness,
            head_tilt_deg,
            eye_scale_y,
            brow_angle: signal.emotion.brow_angle(),
            mouth_curve: signal.emotion.mouth_curve(),
        }
    }
}

impl Default for AvatarAnimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FRAME: Duration = Duration::from_millis(80);

    fn speaking(emotion: Emotion) -> AvatarSignal {
        AvatarSignal::speak(emotion, "Repite: \"Nice to meet you!\"")
    }

    #[test]
    fn every_field_stays_in_bounds_across_many_ticks() {
        let mut animator = AvatarAnimator::seeded(1);
        let signals = [
            AvatarSignal::quiet(),
            speaking(Emotion::Neutral),
            speaking(Emotion::Happy),
            AvatarSignal::speak(Emotion::Encouraging, "Good try!"),
        ];
        for i in 0..2000 {
            let state = animator.tick(FRAME, &signals[i % signals.len()]);
            assert!((0.0..=1.0).contains(&state.mouth_openness));
            assert!((-2.0..=2.0).contains(&state.head_tilt_deg));
            assert!((0.1..=1.0).contains(&state.eye_scale_y));
        }
    }

    #[test]
    fn blink_only_fires_after_the_armed_interval() {
        let mut animator = AvatarAnimator::seeded(7);
        let signal = AvatarSignal::quiet();
        let step = Duration::from_millis(50);
        let mut elapsed = 0.0_f32;
        // No blink can happen before the minimum interval.
        while elapsed + 0.05 < BLINK_INTERVAL_MIN_S {
            let state = animator.tick(step, &signal);
            elapsed += 0.05;
            assert!(!state.blinking, "blinked too early at {elapsed}s");
        }
        // One must happen before the maximum interval runs out.
        let mut fired = false;
        while elapsed < BLINK_INTERVAL_MAX_S + 0.1 {
            let state = animator.tick(step, &signal);
            elapsed += 0.05;
            if state.blinking {
                fired = true;
                assert_relative_eq!(state.eye_scale_y, 0.1);
                break;
            }
        }
        assert!(fired, "no blink within the armed window");
    }

    #[test]
    fn blink_restores_baseline_within_its_duration() {
        let mut animator = AvatarAnimator::seeded(3);
        let signal = AvatarSignal::quiet();
        let step = Duration::from_millis(50);
        // Run until the first blink fires.
        let mut ticks = 0;
        while !animator.tick(step, &signal).blinking {
            ticks += 1;
            assert!(ticks < 200, "blink never fired");
        }
        // 150ms of blink spans at most three 50ms ticks beyond the first.
        let mut open_again = false;
        for _ in 0..4 {
            let state = animator.tick(step, &signal);
            if !state.blinking {
                assert_relative_eq!(state.eye_scale_y, 1.0);
                open_again = true;
                break;
            }
        }
        assert!(open_again, "eyes stayed shut past the blink window");
    }

    #[test]
    fn happy_emotion_keeps_a_gentle_squint() {
        let mut animator = AvatarAnimator::seeded(5);
        let state = animator.tick(FRAME, &speaking(Emotion::Happy));
        if !state.blinking {
            assert_relative_eq!(state.eye_scale_y, 0.8);
        }
        assert_relative_eq!(state.brow_angle, 0.1);
        assert_relative_eq!(state.mouth_curve, 8.0);
    }

    #[test]
    fn mouth_opens_while_speaking_and_decays_when_silent() {
        let mut animator = AvatarAnimator::seeded(11);
        let mut peak = 0.0_f32;
        for _ in 0..50 {
            peak = peak.max(animator.tick(FRAME, &speaking(Emotion::Neutral)).mouth_openness);
        }
        assert!(peak > 0.2, "mouth barely moved while speaking ({peak})");

        let quiet = AvatarSignal::quiet();
        let mut last = f32::MAX;
        for _ in 0..40 {
            let state = animator.tick(FRAME, &quiet);
            assert!(state.mouth_openness <= last + 1e-6);
            last = state.mouth_openness;
        }
        assert!(last < 0.05, "mouth did not settle closed ({last})");
    }

    #[test]
    fn animator_never_waits_for_a_fresh_signal() {
        // The same stale signal keeps producing motion: the head sway phase
        // advances every tick.
        let mut animator = AvatarAnimator::seeded(2);
        let signal = AvatarSignal::quiet();
        let a = animator.tick(Duration::from_millis(500), &signal).head_tilt_deg;
        let b = animator.tick(Duration::from_millis(500), &signal).head_tilt_deg;
        assert!((a - b).abs() > 1e-4);
    }

    #[test]
    fn seeded_animators_agree_tick_for_tick() {
        let mut a = AvatarAnimator::seeded(99);
        let mut b = AvatarAnimator::seeded(99);
        let signal = speaking(Emotion::Neutral);
        for _ in 0..100 {
            assert_eq!(a.tick(FRAME, &signal), b.tick(FRAME, &signal));
        }
    }
}
