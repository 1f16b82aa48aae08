//! Procedural avatar animation.
//!
//! The session logic speaks to the avatar only through coarse
//! [`AvatarSignal`]s (what to portray); the [`AvatarAnimator`] turns those
//! into a continuous per-tick [`AnimationState`] (how it looks), and a
//! swappable [`AvatarRenderer`] backend maps that state to a drawable frame.

pub mod animator;
pub mod renderer;

pub use animator::{AnimationState, AvatarAnimator};
pub use renderer::{AvatarRenderer, RenderFrame, SceneFrame, SceneRenderer, VectorFrame, VectorRenderer};

use serde::{Deserialize, Serialize};

/// Discrete expression selected by the session logic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    #[default]
    Neutral,
    Happy,
    Thoughtful,
    Encouraging,
}

impl Emotion {
    /// Static brow baseline blended into every tick's output.
    pub(crate) fn brow_angle(self) -> f32 {
        match self {
            Emotion::Neutral => 0.0,
            Emotion::Happy => 0.1,
            Emotion::Thoughtful => -0.15,
            Emotion::Encouraging => 0.2,
        }
    }

    /// Static resting-mouth curvature baseline.
    pub(crate) fn mouth_curve(self) -> f32 {
        match self {
            Emotion::Neutral => 4.0,
            Emotion::Happy | Emotion::Encouraging => 8.0,
            Emotion::Thoughtful => -2.0,
        }
    }
}

/// The coarse, discrete instruction from the session logic to the animator.
///
/// Updated as a whole value only; the animator never observes a partially
/// written signal and keeps animating its current baseline when no new signal
/// arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvatarSignal {
    pub speaking: bool,
    pub emotion: Emotion,
    pub message: String,
}

impl AvatarSignal {
    /// A speaking signal with the given expression and caption.
    pub fn speak(emotion: Emotion, message: impl Into<String>) -> Self {
        Self {
            speaking: true,
            emotion,
            message: message.into(),
        }
    }

    /// A silent, neutral signal with no caption.
    pub fn quiet() -> Self {
        Self::default()
    }
}
