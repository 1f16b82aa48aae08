pub mod avatar;
pub mod catalog;
pub mod phrase;
pub mod prompt;
pub mod scheduler;
pub mod scorer;
pub mod session;
pub mod timer;

pub use avatar::{AnimationState, AvatarAnimator, AvatarSignal, Emotion};
pub use phrase::{Level, Phrase};
pub use session::{ConversationTurn, EngineEvent, SessionController, SessionStatus, Speaker};
