//! Defines the WebSocket message protocol between the browser client and the API server.

use avi_core::avatar::{AnimationState, AvatarSignal, RenderFrame};
use avi_core::phrase::Level;
use avi_core::session::{ConversationTurn, SessionStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which presentation backend the client wants frames rendered for.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Flat SVG-style avatar.
    #[default]
    Vector,
    /// 3D scene-graph avatar.
    Scene,
}

/// Messages sent from the client (browser) to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Starts a practice session. This must be the first message.
    #[serde(rename = "start")]
    Start {
        /// The catalog topic to practice.
        topic: String,
        #[serde(default)]
        renderer: RendererKind,
    },
    /// The user's spoken or typed attempt at the current phrase.
    #[serde(rename = "response")]
    Response { text: String },
    /// Skips the current phrase without scoring.
    #[serde(rename = "skip")]
    Skip,
    #[serde(rename = "pause")]
    Pause,
    #[serde(rename = "resume")]
    Resume,
    #[serde(rename = "end")]
    End,
}

/// Messages sent from the server to the client (browser).
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the session started and identifies it.
    Started {
        session_id: Uuid,
        topic: String,
        level: Level,
    },
    /// The session moved to a new lifecycle state.
    Status { status: SessionStatus },
    /// A new coarse avatar instruction (speech, emotion, caption).
    Signal {
        #[serde(flatten)]
        signal: AvatarSignal,
    },
    /// The phrase the user should repeat next.
    Phrase { text: String, translation: String },
    /// A new entry in the conversation log.
    Turn {
        #[serde(flatten)]
        turn: ConversationTurn,
    },
    /// The rolling session score after a scored turn.
    Score { value: u8 },
    /// Elapsed practice time, once per second.
    Clock { elapsed_seconds: u64, formatted: String },
    /// One rendered animation frame, pushed at the configured frame rate.
    Frame {
        state: AnimationState,
        render: RenderFrame,
    },
    /// Reports a fatal error to the client.
    Error { message: String },
    /// The session is over; no further messages follow.
    Ended { final_score: Option<u8> },
}
