pub mod state;
pub mod status;
pub mod store;

pub use state::{AnswerSlot, AnswerValue, AttemptSession, CodeDraft, CountdownStep, TimerState};
pub use status::AttemptStatus;
pub use store::SessionStore;
