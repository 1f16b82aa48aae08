//! Practice-session state machine.
//!
//! The controller owns the session: its status, the conversation, the rolling
//! score, the phrase provider, the wall-clock timer and the scheduler that
//! carries every pending window. It is driven from a single runtime loop via
//! [`SessionController::advance`] plus the user-facing commands, and reports
//! everything that happened through an internal [`EngineEvent`] queue drained
//! after each call. All randomness is injected, so the whole machine is
//! deterministic under test.

use crate::{
    avatar::{AvatarSignal, Emotion},
    catalog::Topic,
    phrase::{Level, Phrase},
    prompt::PromptProvider,
    scheduler::Scheduler,
    scorer::ResponseScorer,
    timer::SessionTimer,
};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Delay between `start()` and the greeting signal.
pub const GREETING_SETTLE: Duration = Duration::from_secs(1);
/// How long the avatar speaks the greeting.
pub const GREETING_WINDOW: Duration = Duration::from_secs(3);
/// How long the avatar speaks a prompt before listening.
pub const PROMPT_WINDOW: Duration = Duration::from_secs(2);
/// Thinking pause between a submitted response and its score.
pub const SCORING_WINDOW: Duration = Duration::from_secs(1);
/// How long feedback is spoken before the next prompt.
pub const FEEDBACK_WINDOW: Duration = Duration::from_secs(3);

const CLOCK_PERIOD: Duration = Duration::from_secs(1);

const GREETING_MESSAGE: &str =
    "¡Hola! Soy AVI, tu asistente de inglés. ¿Listo para practicar?";
const FEEDBACK_EXCELLENT: &str = "¡Excelente pronunciación! 🌟 You did great!";
const FEEDBACK_GOOD: &str = "¡Muy bien! Good job, keep practicing!";
const FEEDBACK_TRY_AGAIN: &str = "Good try! Let's practice that again.";

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Greeting,
    Prompting,
    AwaitingResponse,
    Scoring,
    Feedback,
    Paused,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Agent => write!(f, "agent"),
        }
    }
}

/// One entry of the append-only conversation log.
///
/// `timestamp_ms` is virtual session time; appends bump it by 1ms when two
/// turns would otherwise collide, so timestamps are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub score: Option<u8>,
    pub timestamp_ms: u64,
}

/// Everything the controller reports back to its runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StatusChanged(SessionStatus),
    Signal(AvatarSignal),
    PhraseIssued(Phrase),
    TurnAppended(ConversationTurn),
    ScoreUpdated(u8),
    Clock { elapsed_seconds: u64 },
    Ended { final_score: Option<u8> },
}

/// Payloads carried by scheduler entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerFire {
    GreetingSettle,
    GreetingDone,
    PromptSpoken,
    ScoringDone,
    FeedbackDone,
    ClockTick,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("topic '{0}' has no phrases to practice")]
    EmptyPhrasePool(String),
}

/// The top-level state machine orchestrating one practice session.
pub struct SessionController {
    id: Uuid,
    topic: String,
    level: Level,
    status: SessionStatus,
    /// State to restore on resume; only meaningful while `status == Paused`.
    resume_to: SessionStatus,
    prompts: PromptProvider<StdRng>,
    scorer: Arc<dyn ResponseScorer>,
    timer: SessionTimer,
    scheduler: Scheduler<TimerFire>,
    signal: AvatarSignal,
    current_phrase: Option<Phrase>,
    pending_response: Option<String>,
    conversation: Vec<ConversationTurn>,
    score: Option<u8>,
    now_ms: u64,
    events: VecDeque<EngineEvent>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("level", &self.level)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Creates a controller for the given topic. Fails when the topic has no
    /// phrases, since a session could never issue a prompt.
    pub fn new(
        topic: &Topic,
        scorer: Arc<dyn ResponseScorer>,
        rng: StdRng,
    ) -> Result<Self, SessionError> {
        if topic.phrases.is_empty() {
            return Err(SessionError::EmptyPhrasePool(topic.name.clone()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            topic: topic.name.clone(),
            level: topic.level,
            status: SessionStatus::Idle,
            resume_to: SessionStatus::Idle,
            prompts: PromptProvider::new(topic.phrases.clone(), rng),
            scorer,
            timer: SessionTimer::new(),
            scheduler: Scheduler::new(),
            signal: AvatarSignal::quiet(),
            current_phrase: None,
            pending_response: None,
            conversation: Vec::new(),
            score: None,
            now_ms: 0,
            events: VecDeque::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Rolling session score; `None` before the first scored turn.
    pub fn score(&self) -> Option<u8> {
        self.score
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.elapsed_seconds()
    }

    pub fn formatted_time(&self) -> String {
        self.timer.formatted()
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    pub fn current_phrase(&self) -> Option<&Phrase> {
        self.current_phrase.as_ref()
    }

    /// The last signal emitted; the animator's current baseline.
    pub fn signal(&self) -> &AvatarSignal {
        &self.signal
    }

    /// Drains every event produced since the previous drain.
    pub fn drain_events(&mut self) -> impl Iterator<Item = EngineEvent> + '_ {
        self.events.drain(..)
    }

    /// Begins the session. Only valid from `Idle`; anything else is a no-op.
    pub fn start(&mut self) {
        if self.status != SessionStatus::Idle {
            warn!(status = ?self.status, "ignoring start(): session already running");
            return;
        }
        info!(session_id = %self.id, topic = %self.topic, "starting practice session");
        self.set_status(SessionStatus::Greeting);
        self.scheduler
            .schedule_once(GREETING_SETTLE, TimerFire::GreetingSettle);
        self.scheduler
            .schedule_repeating(CLOCK_PERIOD, TimerFire::ClockTick);
    }

    /// Submits the user's attempt at the current phrase. Valid only while
    /// awaiting a response; empty or whitespace text is silently ignored.
    pub fn submit_response(&mut self, text: &str) {
        if self.status != SessionStatus::AwaitingResponse {
            debug!(status = ?self.status, "ignoring response outside AwaitingResponse");
            return;
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        self.append_turn(Speaker::User, trimmed.to_string(), None);
        self.pending_response = Some(trimmed.to_string());
        self.set_status(SessionStatus::Scoring);
        self.scheduler
            .schedule_once(SCORING_WINDOW, TimerFire::ScoringDone);
    }

    /// Skips the current phrase and prompts a new one. Valid only while
    /// awaiting a response.
    pub fn skip_phrase(&mut self) {
        if self.status != SessionStatus::AwaitingResponse {
            return;
        }
        debug!("skipping current phrase");
        self.current_phrase = None;
        self.issue_prompt();
    }

    /// Suspends the session: the timer freezes and every pending window keeps
    /// its remaining duration. Idempotent; no-op from `Idle` or `Ended`.
    pub fn pause(&mut self) {
        match self.status {
            SessionStatus::Idle | SessionStatus::Paused | SessionStatus::Ended => return,
            _ => {}
        }
        self.resume_to = self.status;
        self.timer.pause();
        self.scheduler.pause();
        self.set_status(SessionStatus::Paused);
    }

    /// Resumes a paused session in the state it was paused from. Idempotent.
    pub fn resume(&mut self) {
        if self.status != SessionStatus::Paused {
            return;
        }
        self.scheduler.resume();
        self.timer.resume();
        self.set_status(self.resume_to);
    }

    /// Ends the session unconditionally: cancels every pending timer so no
    /// transition or signal can fire afterwards. Terminal.
    pub fn end(&mut self) {
        if self.status == SessionStatus::Ended {
            return;
        }
        info!(session_id = %self.id, final_score = ?self.score, "ending session");
        self.scheduler.cancel_all();
        self.scheduler.resume();
        self.timer.resume();
        self.current_phrase = None;
        self.pending_response = None;
        self.set_status(SessionStatus::Ended);
        self.events.push_back(EngineEvent::Ended {
            final_score: self.score,
        });
    }

    /// Moves virtual time forward. This is the only place timers fire; while
    /// paused or ended it does nothing.
    pub fn advance(&mut self, dt: Duration) {
        if matches!(self.status, SessionStatus::Ended | SessionStatus::Paused)
            || self.status == SessionStatus::Idle
        {
            return;
        }
        self.now_ms += dt.as_millis() as u64;
        for fire in self.scheduler.advance(dt) {
            self.handle_fire(fire);
            if self.status == SessionStatus::Ended {
                break;
            }
        }
    }

    fn handle_fire(&mut self, fire: TimerFire) {
        match fire {
            TimerFire::ClockTick => {
                self.timer.tick();
                self.events.push_back(EngineEvent::Clock {
                    elapsed_seconds: self.timer.elapsed_seconds(),
                });
            }
            TimerFire::GreetingSettle => {
                if self.status != SessionStatus::Greeting {
                    warn!(status = ?self.status, "stale greeting-settle timer");
                    return;
                }
                self.emit_signal(AvatarSignal::speak(Emotion::Happy, GREETING_MESSAGE));
                self.scheduler
                    .schedule_once(GREETING_WINDOW, TimerFire::GreetingDone);
            }
            TimerFire::GreetingDone => self.issue_prompt(),
            TimerFire::PromptSpoken => {
                if self.status != SessionStatus::Prompting {
                    warn!(status = ?self.status, "stale prompt-spoken timer");
                    return;
                }
                self.set_status(SessionStatus::AwaitingResponse);
                self.hush();
            }
            TimerFire::ScoringDone => self.finish_scoring(),
            TimerFire::FeedbackDone => self.issue_prompt(),
        }
    }

    /// Picks the next phrase and speaks the prompt.
    fn issue_prompt(&mut self) {
        let Some(phrase) = self.prompts.next() else {
            // Unreachable with a validated topic, but never a panic.
            warn!("phrase pool exhausted; ending session");
            self.end();
            return;
        };
        self.set_status(SessionStatus::Prompting);
        self.current_phrase = Some(phrase.clone());
        self.events.push_back(EngineEvent::PhraseIssued(phrase.clone()));
        self.emit_signal(AvatarSignal::speak(
            Emotion::Neutral,
            format!("Repite: \"{}\"", phrase.text),
        ));
        self.scheduler
            .schedule_once(PROMPT_WINDOW, TimerFire::PromptSpoken);
    }

    /// Scores the pending response and speaks the feedback. A scorer failure
    /// is mapped to a zero score and the encouraging path; never fatal.
    fn finish_scoring(&mut self) {
        if self.status != SessionStatus::Scoring {
            warn!(status = ?self.status, "stale scoring timer");
            return;
        }
        let turn_score = match (self.current_phrase.as_ref(), self.pending_response.take()) {
            (Some(phrase), Some(response)) => {
                match self.scorer.score(phrase, &response) {
                    Ok(score) => score.min(100),
                    Err(error) => {
                        warn!(%error, "scoring failed; treating as zero");
                        0
                    }
                }
            }
            _ => {
                warn!("scoring fired without a phrase and response");
                0
            }
        };

        // Two-term blend with the previous session score, half-up rounding.
        let session_score = match self.score {
            None => turn_score,
            Some(previous) => ((previous as u16 + turn_score as u16).div_ceil(2)) as u8,
        }
        .min(100);
        self.score = Some(session_score);
        self.events.push_back(EngineEvent::ScoreUpdated(session_score));

        let (emotion, feedback) = feedback_for(turn_score);
        self.append_turn(Speaker::Agent, feedback.to_string(), Some(turn_score));
        self.current_phrase = None;
        self.set_status(SessionStatus::Feedback);
        self.emit_signal(AvatarSignal::speak(emotion, feedback));
        self.scheduler
            .schedule_once(FEEDBACK_WINDOW, TimerFire::FeedbackDone);
    }

    fn append_turn(&mut self, speaker: Speaker, text: String, score: Option<u8>) {
        let mut timestamp_ms = self.now_ms;
        if let Some(last) = self.conversation.last() {
            if timestamp_ms <= last.timestamp_ms {
                timestamp_ms = last.timestamp_ms + 1;
            }
        }
        let turn = ConversationTurn {
            speaker,
            text,
            score,
            timestamp_ms,
        };
        self.conversation.push(turn.clone());
        self.events.push_back(EngineEvent::TurnAppended(turn));
    }

    fn set_status(&mut self, status: SessionStatus) {
        debug!(from = ?self.status, to = ?status, "session transition");
        self.status = status;
        self.events.push_back(EngineEvent::StatusChanged(status));
    }

    /// Replaces the current signal as a whole value.
    fn emit_signal(&mut self, signal: AvatarSignal) {
        self.signal = signal.clone();
        self.events.push_back(EngineEvent::Signal(signal));
    }

    /// Stops speaking while keeping the current expression and caption.
    fn hush(&mut self) {
        let mut signal = self.signal.clone();
        signal.speaking = false;
        self.emit_signal(signal);
    }
}

/// Emotion and message for a turn score, per the feedback thresholds.
fn feedback_for(turn_score: u8) -> (Emotion, &'static str) {
    if turn_score >= 90 {
        (Emotion::Happy, FEEDBACK_EXCELLENT)
    } else if turn_score >= 75 {
        (Emotion::Happy, FEEDBACK_GOOD)
    } else {
        (Emotion::Encouraging, FEEDBACK_TRY_AGAIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::MockResponseScorer;
    use anyhow::anyhow;
    use rand::SeedableRng;

    fn topic() -> Topic {
        Topic {
            name: "Saludos y Presentaciones".to_string(),
            level: Level::A1,
            description: "Aprende a saludar y presentarte en inglés".to_string(),
            phrases: (0..5)
                .map(|i| Phrase::new(format!("phrase {i}"), format!("frase {i}")))
                .collect(),
        }
    }

    fn controller_with(scorer: MockResponseScorer) -> SessionController {
        SessionController::new(&topic(), Arc::new(scorer), StdRng::seed_from_u64(42)).unwrap()
    }

    fn fixed_scorer(score: u8) -> MockResponseScorer {
        let mut scorer = MockResponseScorer::new();
        scorer.expect_score().returning(move |_, _| Ok(score));
        scorer
    }

    /// Advances in 100ms steps so cascading windows fire at realistic tick
    /// boundaries.
    fn run(controller: &mut SessionController, duration: Duration) {
        let step = Duration::from_millis(100);
        let mut left = duration;
        while left > Duration::ZERO {
            let dt = step.min(left);
            controller.advance(dt);
            left -= dt;
        }
    }

    fn drain(controller: &mut SessionController) -> Vec<EngineEvent> {
        controller.drain_events().collect()
    }

    fn signals(events: &[EngineEvent]) -> Vec<&AvatarSignal> {
        events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Signal(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// Drives a fresh session through greeting and prompting into
    /// AwaitingResponse, discarding the events along the way.
    fn start_to_awaiting(controller: &mut SessionController) {
        controller.start();
        run(controller, Duration::from_secs(6));
        assert_eq!(controller.status(), SessionStatus::AwaitingResponse);
        drain(controller);
    }

    #[test]
    fn empty_topic_is_rejected_at_construction() {
        let mut empty = topic();
        empty.phrases.clear();
        let err =
            SessionController::new(&empty, Arc::new(fixed_scorer(80)), StdRng::seed_from_u64(1))
                .unwrap_err();
        assert!(matches!(err, SessionError::EmptyPhrasePool(_)));
    }

    #[test]
    fn start_walks_greeting_then_prompting() {
        let mut controller = controller_with(fixed_scorer(80));
        controller.start();
        assert_eq!(controller.status(), SessionStatus::Greeting);

        // Settle delay, then the happy greeting is spoken.
        run(&mut controller, Duration::from_secs(1));
        let events = drain(&mut controller);
        let greeting = signals(&events);
        assert_eq!(greeting.len(), 1);
        assert!(greeting[0].speaking);
        assert_eq!(greeting[0].emotion, Emotion::Happy);
        assert!(greeting[0].message.contains("AVI"));

        // Greeting window ends: a phrase is issued and spoken.
        run(&mut controller, Duration::from_secs(3));
        assert_eq!(controller.status(), SessionStatus::Prompting);
        let events = drain(&mut controller);
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::PhraseIssued(_))));
        let prompt = signals(&events);
        assert!(prompt[0].speaking);
        assert_eq!(prompt[0].emotion, Emotion::Neutral);
        assert!(prompt[0].message.starts_with("Repite:"));

        // Speaking window ends: listening, signal goes quiet.
        run(&mut controller, Duration::from_secs(2));
        assert_eq!(controller.status(), SessionStatus::AwaitingResponse);
        let events = drain(&mut controller);
        assert!(!signals(&events)[0].speaking);
    }

    #[test]
    fn start_twice_is_a_no_op() {
        let mut controller = controller_with(fixed_scorer(80));
        controller.start();
        drain(&mut controller);
        controller.start();
        assert!(drain(&mut controller).is_empty());
    }

    #[test]
    fn scored_turn_flows_through_feedback_to_a_fresh_prompt() {
        let mut controller = controller_with(fixed_scorer(92));
        start_to_awaiting(&mut controller);
        let first_phrase = controller.current_phrase().unwrap().clone();

        controller.submit_response("Hello, how are you today?");
        assert_eq!(controller.status(), SessionStatus::Scoring);
        let events = drain(&mut controller);
        assert!(events.iter().any(|e| matches!(
            e,
            EngineEvent::TurnAppended(ConversationTurn {
                speaker: Speaker::User,
                ..
            })
        )));

        // Thinking window, then score, agent turn and happy feedback.
        run(&mut controller, Duration::from_secs(1));
        assert_eq!(controller.status(), SessionStatus::Feedback);
        assert_eq!(controller.score(), Some(92));
        let events = drain(&mut controller);
        let agent_turn = events
            .iter()
            .find_map(|e| match e {
                EngineEvent::TurnAppended(t) if t.speaker == Speaker::Agent => Some(t),
                _ => None,
            })
            .unwrap();
        assert_eq!(agent_turn.score, Some(92));
        assert!(agent_turn.text.contains("Excelente"));
        assert_eq!(signals(&events)[0].emotion, Emotion::Happy);

        // Feedback window ends: a different phrase is prompted.
        run(&mut controller, Duration::from_secs(3));
        assert_eq!(controller.status(), SessionStatus::Prompting);
        assert_ne!(controller.current_phrase().unwrap(), &first_phrase);
    }

    #[test]
    fn empty_and_whitespace_responses_change_nothing() {
        let mut controller = controller_with(fixed_scorer(80));
        start_to_awaiting(&mut controller);

        controller.submit_response("");
        controller.submit_response("   \t  ");
        assert_eq!(controller.status(), SessionStatus::AwaitingResponse);
        assert!(controller.conversation().is_empty());
        assert!(drain(&mut controller).is_empty());
    }

    #[test]
    fn responses_outside_awaiting_are_ignored() {
        let mut controller = controller_with(fixed_scorer(80));
        controller.start();
        controller.submit_response("too early");
        assert_eq!(controller.status(), SessionStatus::Greeting);
        assert!(controller.conversation().is_empty());

        // While the current response is unscored, another cannot sneak in.
        run(&mut controller, Duration::from_secs(6));
        assert_eq!(controller.status(), SessionStatus::AwaitingResponse);
        controller.submit_response("first attempt");
        assert_eq!(controller.status(), SessionStatus::Scoring);
        let turns = controller.conversation().len();
        controller.submit_response("second while scoring");
        assert_eq!(controller.status(), SessionStatus::Scoring);
        assert_eq!(controller.conversation().len(), turns);

        // Nor during the spoken feedback window.
        run(&mut controller, Duration::from_secs(1));
        assert_eq!(controller.status(), SessionStatus::Feedback);
        let turns = controller.conversation().len();
        controller.submit_response("during feedback");
        assert_eq!(controller.status(), SessionStatus::Feedback);
        assert_eq!(controller.conversation().len(), turns);
    }

    #[test]
    fn rolling_score_blends_with_the_previous_value() {
        let mut scorer = MockResponseScorer::new();
        let mut scores = vec![91, 80].into_iter();
        scorer
            .expect_score()
            .returning(move |_, _| Ok(scores.next().unwrap()));
        let mut controller = controller_with(scorer);
        assert_eq!(controller.score(), None);
        start_to_awaiting(&mut controller);

        controller.submit_response("first attempt");
        run(&mut controller, Duration::from_secs(1));
        assert_eq!(controller.score(), Some(80));

        run(&mut controller, Duration::from_secs(5));
        assert_eq!(controller.status(), SessionStatus::AwaitingResponse);
        controller.submit_response("second attempt");
        run(&mut controller, Duration::from_secs(1));
        // round((80 + 91) / 2) = 86
        assert_eq!(controller.score(), Some(86));
    }

    #[test]
    fn scorer_failure_becomes_an_encouraging_zero() {
        let mut scorer = MockResponseScorer::new();
        scorer
            .expect_score()
            .returning(|_, _| Err(anyhow!("evaluator unavailable")));
        let mut controller = controller_with(scorer);
        start_to_awaiting(&mut controller);

        controller.submit_response("anything");
        run(&mut controller, Duration::from_secs(1));
        assert_eq!(controller.status(), SessionStatus::Feedback);
        assert_eq!(controller.score(), Some(0));
        let events = drain(&mut controller);
        assert_eq!(signals(&events)[0].emotion, Emotion::Encouraging);
    }

    #[test]
    fn skip_phrase_prompts_a_different_one() {
        let mut controller = controller_with(fixed_scorer(80));
        start_to_awaiting(&mut controller);
        let before = controller.current_phrase().unwrap().clone();
        controller.skip_phrase();
        assert_eq!(controller.status(), SessionStatus::Prompting);
        assert_ne!(controller.current_phrase().unwrap(), &before);

        // Only valid while awaiting.
        controller.skip_phrase();
        assert_eq!(controller.status(), SessionStatus::Prompting);
    }

    #[test]
    fn pause_freezes_the_clock_and_every_window() {
        let mut controller = controller_with(fixed_scorer(80));
        controller.start();
        // Into Prompting (1s settle + 3s greeting), plus 1s of the 2s window.
        run(&mut controller, Duration::from_secs(5));
        assert_eq!(controller.status(), SessionStatus::Prompting);
        let elapsed_before = controller.elapsed_seconds();
        drain(&mut controller);

        controller.pause();
        assert_eq!(controller.status(), SessionStatus::Paused);
        run(&mut controller, Duration::from_secs(300));
        assert_eq!(controller.elapsed_seconds(), elapsed_before);
        // Nothing fires while paused beyond the pause transition itself.
        let events = drain(&mut controller);
        assert_eq!(events, vec![EngineEvent::StatusChanged(SessionStatus::Paused)]);

        controller.resume();
        assert_eq!(controller.status(), SessionStatus::Prompting);
        // The prompt window kept its remaining ~1s.
        run(&mut controller, Duration::from_secs(1));
        assert_eq!(controller.status(), SessionStatus::AwaitingResponse);
        assert_eq!(controller.elapsed_seconds(), elapsed_before + 1);
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let mut controller = controller_with(fixed_scorer(80));
        controller.resume(); // not paused: no-op
        assert_eq!(controller.status(), SessionStatus::Idle);
        controller.pause(); // idle: no-op
        assert_eq!(controller.status(), SessionStatus::Idle);

        controller.start();
        controller.pause();
        controller.pause();
        assert_eq!(controller.status(), SessionStatus::Paused);
        controller.resume();
        controller.resume();
        assert_eq!(controller.status(), SessionStatus::Greeting);
    }

    #[test]
    fn end_cancels_everything_and_is_terminal() {
        let mut controller = controller_with(fixed_scorer(95));
        start_to_awaiting(&mut controller);
        controller.submit_response("Hello!");
        run(&mut controller, Duration::from_secs(1));
        let score = controller.score();
        drain(&mut controller);

        controller.end();
        assert_eq!(controller.status(), SessionStatus::Ended);
        let events = drain(&mut controller);
        assert!(events.contains(&EngineEvent::Ended { final_score: score }));
        assert!(signals(&events).is_empty(), "no signal may follow end()");

        // Nothing ever fires again: no signals, no turns, no transitions.
        let turns_before = controller.conversation().len();
        run(&mut controller, Duration::from_secs(60));
        controller.submit_response("too late");
        controller.end();
        assert!(drain(&mut controller).is_empty());
        assert_eq!(controller.conversation().len(), turns_before);
    }

    #[test]
    fn end_while_paused_still_tears_down() {
        let mut controller = controller_with(fixed_scorer(80));
        controller.start();
        run(&mut controller, Duration::from_secs(2));
        controller.pause();
        controller.end();
        assert_eq!(controller.status(), SessionStatus::Ended);
        run(&mut controller, Duration::from_secs(10));
        let events = drain(&mut controller);
        assert!(!events.iter().any(|e| matches!(e, EngineEvent::Clock { .. })));
    }

    #[test]
    fn clock_events_track_elapsed_seconds() {
        let mut controller = controller_with(fixed_scorer(80));
        controller.start();
        run(&mut controller, Duration::from_secs(5));
        assert_eq!(controller.elapsed_seconds(), 5);
        assert_eq!(controller.formatted_time(), "00:05");
        let clock_events = drain(&mut controller)
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::Clock { .. }))
            .count();
        assert_eq!(clock_events, 5);
    }

    #[test]
    fn turn_timestamps_strictly_increase() {
        let mut controller = controller_with(fixed_scorer(80));
        start_to_awaiting(&mut controller);
        for attempt in 0..3 {
            controller.submit_response(&format!("attempt {attempt}"));
            run(&mut controller, Duration::from_secs(6));
            assert_eq!(controller.status(), SessionStatus::AwaitingResponse);
        }
        let turns = controller.conversation();
        assert_eq!(turns.len(), 6);
        for pair in turns.windows(2) {
            assert!(pair[0].timestamp_ms < pair[1].timestamp_ms);
        }
    }
}
