use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::watch;

use crate::schemas::{Language, Question, TestDetails, TimeStatus};
use crate::session::state::{AttemptSession, CountdownStep, StagedDraft};
use crate::session::status::AttemptStatus;

/// Owner of the one shared `AttemptSession` record. The controller is the
/// only writer; everything else subscribes and observes fully-replaced
/// snapshots, so no further locking is needed.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<AttemptSession>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AttemptSession::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> AttemptSession {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AttemptSession> {
        self.tx.subscribe()
    }

    pub fn status(&self) -> AttemptStatus {
        self.tx.borrow().status
    }

    fn update(&self, mutate: impl FnOnce(&mut AttemptSession)) {
        self.tx.send_modify(mutate);
    }

    /// Apply a status transition if the state machine allows it. Illegal
    /// transitions are refused and logged, never applied.
    pub(crate) fn transition(&self, next: AttemptStatus) -> bool {
        let mut applied = false;
        self.update(|session| {
            if session.status.may_transition(next) {
                tracing::debug!(
                    session_id = %session.session_id,
                    from = %session.status,
                    to = %next,
                    "attempt status transition"
                );
                session.status = next;
                applied = true;
            } else {
                tracing::warn!(
                    session_id = %session.session_id,
                    from = %session.status,
                    to = %next,
                    "refusing illegal attempt status transition"
                );
            }
        });
        applied
    }

    /// Unrecoverable failure: record the message and fall to `INVALID`.
    pub(crate) fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|session| {
            tracing::error!(
                session_id = %session.session_id,
                from = %session.status,
                message = %message,
                "attempt became invalid"
            );
            session.error_message = Some(message.clone());
            session.status = AttemptStatus::Invalid;
        });
    }

    pub(crate) fn set_access_code(&self, access_code: &str) {
        self.update(|session| session.access_code = Some(access_code.to_string()));
    }

    pub(crate) fn set_test(&self, test: TestDetails) {
        self.update(|session| session.test = Some(test));
    }

    pub(crate) fn set_candidate(&self, email: &str, token: String, attempt_id: String) {
        self.update(|session| {
            session.candidate_email = Some(email.to_string());
            session.token = Some(token);
            session.attempt_id = Some(attempt_id);
        });
    }

    pub(crate) fn install_questions(&self, questions: Vec<Question>) {
        self.update(|session| session.install_questions(questions));
    }

    pub(crate) fn start_timer(&self, total_minutes: u64) {
        self.update(|session| session.start_timer(total_minutes, OffsetDateTime::now_utc()));
    }

    pub(crate) fn decrement_time(&self) -> CountdownStep {
        let mut step = CountdownStep::Idle;
        self.update(|session| step = session.timer.decrement());
        step
    }

    pub(crate) fn apply_server_time(&self, status: TimeStatus) {
        self.update(|session| session.timer.apply_server_time(status, OffsetDateTime::now_utc()));
    }

    pub fn update_mcq_answer(&self, question_id: &str, option_index: u32) {
        self.update(|session| session.update_mcq_answer(question_id, option_index));
    }

    pub fn update_code_answer(&self, question_id: &str, language: Language, code: String) {
        self.update(|session| session.update_code_answer(question_id, language, code));
    }

    /// Remember the live editor buffer without committing it. The next
    /// navigation or finalize flushes it into the ledger.
    pub fn stage_code_draft(&self, question_id: &str, language: Language, code: String) {
        self.update(|session| {
            session.staged_draft =
                Some(StagedDraft { question_id: question_id.to_string(), language, code });
        });
    }

    pub fn flush_staged_draft(&self) {
        self.update(AttemptSession::flush_staged_draft);
    }

    pub fn is_question_answered(&self, question_id: &str) -> bool {
        self.tx.borrow().is_question_answered(question_id)
    }

    /// Navigation commits the staged draft first; out-of-range indexes are
    /// ignored.
    pub fn go_to_question(&self, index: usize) {
        self.update(|session| {
            session.flush_staged_draft();
            if index < session.questions.len() {
                session.current_question_index = index;
            }
        });
    }

    pub fn go_to_next_question(&self) {
        self.update(|session| {
            session.flush_staged_draft();
            if session.current_question_index + 1 < session.questions.len() {
                session.current_question_index += 1;
            }
        });
    }

    pub fn go_to_previous_question(&self) {
        self.update(|session| {
            session.flush_staged_draft();
            session.current_question_index = session.current_question_index.saturating_sub(1);
        });
    }

    /// Reinitialize every field, including the correlation id.
    pub(crate) fn reset(&self) {
        self.update(|session| *session = AttemptSession::default());
    }
}
