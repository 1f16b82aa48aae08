//! Swappable presentation backends.
//!
//! A renderer is a pure mapping from [`AnimationState`] to a drawable frame:
//! no timers, no session knowledge. The two reference backends (flat 2D
//! vector scene and 3D scene graph) must produce the same qualitative motion
//! from the same state values, so either can be swapped in without touching
//! the controller or the animator.

use super::animator::AnimationState;
use serde::{Deserialize, Serialize};

/// Mouth openness below this renders as the resting smile.
const MOUTH_OPEN_EPSILON: f32 = 0.05;
/// Openness past which the 2D backend also draws the mouth interior.
const MOUTH_INNER_THRESHOLD: f32 = 0.3;

pub trait AvatarRenderer: Send + Sync {
    fn render(&self, state: &AnimationState) -> RenderFrame;
}

/// A backend-tagged drawable frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum RenderFrame {
    Vector(VectorFrame),
    Scene(SceneFrame),
}

/// Flat SVG-style scene: rotations in degrees, geometry in viewbox units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorFrame {
    pub head_rotate_deg: f32,
    pub eye_scale_y: f32,
    /// True when the mouth is drawn as an open ellipse instead of a smile.
    pub mouth_open: bool,
    pub mouth_height: f32,
    pub mouth_inner_visible: bool,
    /// Resting smile path, curvature baked in.
    pub mouth_path: String,
    pub brow_left_path: String,
    pub brow_right_path: String,
}

/// 3D scene-graph node transforms: rotations in radians, unit scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFrame {
    pub head_rotation: [f32; 3],
    pub eye_scale: [f32; 3],
    pub mouth_scale: [f32; 3],
    pub brow_angle: f32,
    pub brow_lift: f32,
    pub mouth_curve: f32,
}

pub struct VectorRenderer;

impl AvatarRenderer for VectorRenderer {
    fn render(&self, state: &AnimationState) -> RenderFrame {
        let mouth_open = state.mouth_openness > MOUTH_OPEN_EPSILON;
        let (brow_left_path, brow_right_path) = brow_paths(state.brow_angle);
        RenderFrame::Vector(VectorFrame {
            head_rotate_deg: state.head_tilt_deg,
            eye_scale_y: state.eye_scale_y,
            mouth_open,
            mouth_height: 8.0 + state.mouth_openness * 15.0,
            mouth_inner_visible: mouth_open && state.mouth_openness > MOUTH_INNER_THRESHOLD,
            mouth_path: format!(
                "M82 143 Q100 {:.1} 118 143",
                143.0 + state.mouth_curve
            ),
            brow_left_path: brow_left_path.to_string(),
            brow_right_path: brow_right_path.to_string(),
        })
    }
}

/// Picks the brow stroke pair for the current expression baseline.
fn brow_paths(brow_angle: f32) -> (&'static str, &'static str) {
    if brow_angle >= 0.05 {
        // Raised, friendly brows.
        ("M55 85 Q65 80 82 82", "M118 82 Q135 80 145 85")
    } else if brow_angle <= -0.05 {
        // One brow dipped, pensive.
        ("M55 82 Q65 85 82 83", "M118 83 Q135 85 145 82")
    } else {
        ("M55 83 Q65 81 82 83", "M118 83 Q135 81 145 83")
    }
}

pub struct SceneRenderer;

impl AvatarRenderer for SceneRenderer {
    fn render(&self, state: &AnimationState) -> RenderFrame {
        let tilt_rad = state.head_tilt_deg.to_radians();
        RenderFrame::Scene(SceneFrame {
            // A touch of forward nod follows the sideways sway.
            head_rotation: [tilt_rad * 0.5, 0.0, tilt_rad],
            eye_scale: [1.0, state.eye_scale_y, 1.0],
            mouth_scale: [
                1.0 + state.mouth_openness * 0.2,
                0.3 + state.mouth_openness * 0.9,
                1.0,
            ],
            brow_angle: state.brow_angle,
            brow_lift: state.brow_angle * 0.2,
            mouth_curve: state.mouth_curve,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn state(mouth: f32, eye: f32, tilt: f32) -> AnimationState {
        AnimationState {
            blinking: eye <= 0.1,
            mouth_openness: mouth,
            head_tilt_deg: tilt,
            eye_scale_y: eye,
            brow_angle: 0.0,
            mouth_curve: 4.0,
        }
    }

    fn vector(frame: RenderFrame) -> VectorFrame {
        match frame {
            RenderFrame::Vector(f) => f,
            other => panic!("expected vector frame, got {other:?}"),
        }
    }

    fn scene(frame: RenderFrame) -> SceneFrame {
        match frame {
            RenderFrame::Scene(f) => f,
            other => panic!("expected scene frame, got {other:?}"),
        }
    }

    #[test]
    fn both_backends_map_a_blink_to_shut_eyes() {
        let blink = state(0.0, 0.1, 0.0);
        let v = vector(VectorRenderer.render(&blink));
        let s = scene(SceneRenderer.render(&blink));
        assert_relative_eq!(v.eye_scale_y, 0.1);
        assert_relative_eq!(s.eye_scale[1], 0.1);
    }

    #[test]
    fn mouth_grows_with_openness_on_both_backends() {
        let closed = state(0.0, 1.0, 0.0);
        let wide = state(0.9, 1.0, 0.0);

        let v_closed = vector(VectorRenderer.render(&closed));
        let v_wide = vector(VectorRenderer.render(&wide));
        assert!(!v_closed.mouth_open);
        assert!(v_wide.mouth_open);
        assert!(v_wide.mouth_height > v_closed.mouth_height);
        assert!(v_wide.mouth_inner_visible);

        let s_closed = scene(SceneRenderer.render(&closed));
        let s_wide = scene(SceneRenderer.render(&wide));
        assert!(s_wide.mouth_scale[1] > s_closed.mouth_scale[1]);
    }

    #[test]
    fn head_tilt_carries_through_with_matching_sign() {
        let tilted = state(0.0, 1.0, 1.5);
        let v = vector(VectorRenderer.render(&tilted));
        let s = scene(SceneRenderer.render(&tilted));
        assert_relative_eq!(v.head_rotate_deg, 1.5);
        assert_relative_eq!(s.head_rotation[2], 1.5_f32.to_radians());
        assert!(v.head_rotate_deg.signum() == s.head_rotation[2].signum());
    }

    #[test]
    fn brow_paths_follow_the_expression_baseline() {
        let mut raised = state(0.0, 1.0, 0.0);
        raised.brow_angle = 0.2;
        let mut pensive = state(0.0, 1.0, 0.0);
        pensive.brow_angle = -0.15;

        let v_raised = vector(VectorRenderer.render(&raised));
        let v_pensive = vector(VectorRenderer.render(&pensive));
        let v_neutral = vector(VectorRenderer.render(&state(0.0, 1.0, 0.0)));
        assert_ne!(v_raised.brow_left_path, v_pensive.brow_left_path);
        assert_ne!(v_raised.brow_left_path, v_neutral.brow_left_path);

        let s_raised = scene(SceneRenderer.render(&raised));
        assert!(s_raised.brow_lift > 0.0);
    }

    #[test]
    fn frames_serialize_with_a_backend_tag() {
        let frame = VectorRenderer.render(&state(0.5, 1.0, 0.0));
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"backend\":\"vector\""));
        let frame = SceneRenderer.render(&state(0.5, 1.0, 0.0));
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"backend\":\"scene\""));
    }
}
