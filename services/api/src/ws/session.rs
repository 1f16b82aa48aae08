//! Manages the WebSocket connection lifecycle for a practice session.

use super::protocol::{ClientMessage, RendererKind, ServerMessage};
use crate::state::AppState;
use anyhow::Result;
use avi_core::avatar::{AvatarAnimator, AvatarRenderer, SceneRenderer, VectorRenderer};
use avi_core::session::{EngineEvent, SessionController};
use avi_core::timer::format_mmss;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use rand::{SeedableRng, rngs::StdRng};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual WebSocket connection.
///
/// Performs the initial handshake (the first message must be `start`), wires
/// up the session engine and the avatar pipeline, then runs the frame loop
/// until the session ends or the client disconnects.
#[instrument(name = "ws_session", skip_all, fields(session_id, topic))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("New WebSocket connection. Awaiting start message...");
    let (mut socket_tx, mut socket_rx) = socket.split();

    let first = match socket_rx.next().await {
        Some(Ok(Message::Text(text))) => text,
        Some(Ok(_)) => {
            let _ = send_msg(
                &mut socket_tx,
                ServerMessage::Error {
                    message: "First message must be a text `start` message.".to_string(),
                },
            )
            .await;
            return;
        }
        _ => {
            info!("Client disconnected before starting a session.");
            return;
        }
    };

    let (topic_name, renderer_kind) = match serde_json::from_str::<ClientMessage>(&first) {
        Ok(ClientMessage::Start { topic, renderer }) => (topic, renderer),
        _ => {
            let _ = send_msg(
                &mut socket_tx,
                ServerMessage::Error {
                    message: "First message must be `start`.".to_string(),
                },
            )
            .await;
            return;
        }
    };

    let Some(topic) = state.catalog.find(&topic_name) else {
        let _ = send_msg(
            &mut socket_tx,
            ServerMessage::Error {
                message: format!("Unknown topic '{}'", topic_name),
            },
        )
        .await;
        return;
    };

    let controller =
        match SessionController::new(topic, state.scorer.clone(), StdRng::from_os_rng()) {
            Ok(controller) => controller,
            Err(e) => {
                error!("Failed to create session: {:?}", e);
                let _ = send_msg(
                    &mut socket_tx,
                    ServerMessage::Error {
                        message: e.to_string(),
                    },
                )
                .await;
                return;
            }
        };

    tracing::Span::current().record("session_id", &controller.id().to_string());
    tracing::Span::current().record("topic", &topic_name);

    // History is best-effort; a store failure never blocks the session.
    if let Err(e) = state
        .store
        .create_session(controller.id(), controller.topic(), controller.level())
        .await
    {
        warn!("Failed to record session start: {:?}", e);
    }

    if send_msg(
        &mut socket_tx,
        ServerMessage::Started {
            session_id: controller.id(),
            topic: controller.topic().to_string(),
            level: controller.level(),
        },
    )
    .await
    .is_err()
    {
        error!("Failed to send Started message to client.");
        return;
    }

    let renderer: Box<dyn AvatarRenderer> = match renderer_kind {
        RendererKind::Vector => Box::new(VectorRenderer),
        RendererKind::Scene => Box::new(SceneRenderer),
    };

    if let Err(e) = run_practice_session(&state, socket_tx, socket_rx, controller, renderer).await
    {
        error!(error = ?e, "Practice session terminated with error.");
    }
    info!("Practice session finished.");
}

/// The main frame loop for an active practice session.
///
/// Each tick advances the session engine, forwards everything it reported to
/// the client, then animates and renders one avatar frame. Client commands
/// are handled between ticks. The session is always ended and finalized in
/// the store on exit, even when a mid-session send to the client fails.
async fn run_practice_session<S, R>(
    state: &Arc<AppState>,
    mut socket_tx: S,
    mut socket_rx: R,
    mut controller: SessionController,
    renderer: Box<dyn AvatarRenderer>,
) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let frame_period = state.config.frame_interval;
    let mut animator = AvatarAnimator::new();
    let mut ticker = tokio::time::interval(frame_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    controller.start();

    // The loop runs in its own block so a failed send still reaches the
    // teardown below instead of propagating straight out of the function.
    let result: Result<()> = async {
        flush_events(&mut controller, &mut socket_tx).await?;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    controller.advance(frame_period);
                    if flush_events(&mut controller, &mut socket_tx).await? {
                        break;
                    }
                    // The animator keeps running off the last signal even while
                    // the engine is paused or silent.
                    let signal = controller.signal().clone();
                    let frame_state = animator.tick(frame_period, &signal);
                    let render = renderer.render(&frame_state);
                    send_msg(&mut socket_tx, ServerMessage::Frame { state: frame_state, render }).await?;
                },
                msg_result = socket_rx.next() => {
                    match msg_result {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ClientMessage>(&text) {
                                Ok(ClientMessage::Response { text }) => controller.submit_response(&text),
                                Ok(ClientMessage::Skip) => controller.skip_phrase(),
                                Ok(ClientMessage::Pause) => controller.pause(),
                                Ok(ClientMessage::Resume) => controller.resume(),
                                Ok(ClientMessage::End) => controller.end(),
                                Ok(ClientMessage::Start { .. }) => {
                                    warn!("Ignoring start message mid-session.");
                                }
                                Err(_) => warn!("Ignoring malformed client message."),
                            }
                            if flush_events(&mut controller, &mut socket_tx).await? {
                                break;
                            }
                        },
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Client disconnected. Shutting down session.");
                            break;
                        },
                        Some(Ok(_)) => {},
                        Some(Err(e)) => {
                            error!("Error receiving from client WebSocket: {:?}", e);
                            break;
                        }
                    }
                },
            }
        }
        Ok(())
    }
    .await;

    // Tear down and persist the outcome whichever way the loop exited.
    controller.end();
    if let Err(e) = state
        .store
        .finalize_session(
            controller.id(),
            controller.elapsed_seconds(),
            controller.score(),
        )
        .await
    {
        warn!("Failed to record session end: {:?}", e);
    }
    result
}

/// Forwards every queued engine event to the client. Returns `true` once the
/// session reported its end.
async fn flush_events<S>(controller: &mut SessionController, socket_tx: &mut S) -> Result<bool>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let events: Vec<EngineEvent> = controller.drain_events().collect();
    let mut ended = false;
    for event in events {
        let msg = match event {
            EngineEvent::StatusChanged(status) => ServerMessage::Status { status },
            EngineEvent::Signal(signal) => ServerMessage::Signal { signal },
            EngineEvent::PhraseIssued(phrase) => ServerMessage::Phrase {
                text: phrase.text,
                translation: phrase.translation,
            },
            EngineEvent::TurnAppended(turn) => ServerMessage::Turn { turn },
            EngineEvent::ScoreUpdated(value) => ServerMessage::Score { value },
            EngineEvent::Clock { elapsed_seconds } => ServerMessage::Clock {
                elapsed_seconds,
                formatted: format_mmss(elapsed_seconds),
            },
            EngineEvent::Ended { final_score } => {
                ended = true;
                ServerMessage::Ended { final_score }
            }
        };
        send_msg(socket_tx, msg).await?;
    }
    Ok(ended)
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg<S>(socket_tx: &mut S, msg: ServerMessage) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}
