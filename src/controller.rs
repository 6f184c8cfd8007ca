use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use validator::ValidateEmail;

use crate::errors::AttemptError;
use crate::schemas::{AnswerUpsert, SubmitRequest};
use crate::services::backend::{BackendError, ProctoringBackend};
use crate::session::{AttemptStatus, SessionStore};
use crate::tasks::{self, TaskIntervals};


const LINK_FALLBACK: &str = "Invalid or expired test link";
const EMPTY_EMAIL: &str = "Please enter your email";
const MALFORMED_EMAIL: &str = "Please enter a valid email address";
const MISSING_ACCESS_CODE: &str = "Invalid test access code";
const VERIFY_FALLBACK: &str =
    "Email verification failed. Please check if you're registered for this test.";
const START_MISSING_SESSION: &str = "Session expired. Please refresh and try again.";
const START_FALLBACK: &str = "Failed to start test. Please try again.";
const SUBMIT_MISSING_INFO: &str = "Missing required information";
const SUBMIT_FALLBACK: &str = "Failed to submit test. Please try again.";

/// Drives one attempt from link validation to final submission. Owns the
/// session record's single writer role and the three background tasks that
/// run while the attempt is `IN_PROGRESS`.
pub struct AttemptController {
    store: SessionStore,
    backend: Arc<dyn ProctoringBackend>,
    intervals: TaskIntervals,
    /// Re-entry gate for `finalize`; an overlapping call becomes a no-op.
    finalize_gate: Mutex<()>,
    background: StdMutex<Vec<JoinHandle<()>>>,
}

impl AttemptController {
    pub fn new(backend: Arc<dyn ProctoringBackend>, intervals: TaskIntervals) -> Arc<Self> {
        Arc::new(Self {
            store: SessionStore::new(),
            backend,
            intervals,
            finalize_gate: Mutex::new(()),
            background: StdMutex::new(Vec::new()),
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub(crate) fn backend(&self) -> &Arc<dyn ProctoringBackend> {
        &self.backend
    }

    pub(crate) fn intervals(&self) -> &TaskIntervals {
        &self.intervals
    }

    /// Resolve the access code into test metadata. Fires once from
    /// `LOADING`; resolution failure is terminal.
    pub async fn resolve(&self, access_code: &str) -> Result<(), AttemptError> {
        if self.store.status() != AttemptStatus::Loading {
            tracing::warn!(status = %self.store.status(), "resolve called outside LOADING; ignoring");
            return Ok(());
        }
        self.store.set_access_code(access_code);

        match self.backend.test_details(access_code).await {
            Ok(details) => {
                tracing::info!(access_code, test_id = %details.id, "test link resolved");
                self.store.set_test(details);
                self.store.transition(AttemptStatus::Verification);
                Ok(())
            }
            Err(err) => {
                let message = match err {
                    BackendError::Rejected { message: Some(message), .. } => message,
                    _ => LINK_FALLBACK.to_string(),
                };
                self.store.fail(message.clone());
                Err(AttemptError::Link(message))
            }
        }
    }

    /// Exchange the candidate email for a bearer token and attempt id.
    /// Local preconditions are checked before any request; failure keeps the
    /// session in `VERIFICATION` so the call can be safely repeated.
    pub async fn verify(&self, email: &str) -> Result<(), AttemptError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AttemptError::Validation(EMPTY_EMAIL.to_string()));
        }
        if !email.validate_email() {
            return Err(AttemptError::Validation(MALFORMED_EMAIL.to_string()));
        }
        let Some(access_code) = self.store.snapshot().access_code else {
            return Err(AttemptError::Validation(MISSING_ACCESS_CODE.to_string()));
        };

        let candidate = self
            .backend
            .verify_candidate(&access_code, email)
            .await
            .map_err(|err| AttemptError::from_backend(err, VERIFY_FALLBACK))?;

        tracing::info!(access_code, attempt_id = %candidate.attempt_id, "candidate verified");
        self.store.set_candidate(email, candidate.token, candidate.attempt_id);
        self.store.transition(AttemptStatus::Instructions);
        Ok(())
    }

    /// Activate the attempt: fetch the ordered question set, initialize the
    /// answer ledger, start the countdown and spawn the background tasks.
    pub async fn start(self: &Arc<Self>) -> Result<(), AttemptError> {
        let session = self.store.snapshot();
        if session.status != AttemptStatus::Instructions {
            return Err(AttemptError::Validation(START_MISSING_SESSION.to_string()));
        }
        let (Some(access_code), Some(token)) = (session.access_code, session.token) else {
            return Err(AttemptError::Validation(START_MISSING_SESSION.to_string()));
        };

        let mut questions = match self.backend.start_attempt(&access_code, &token).await {
            Ok(questions) => questions,
            Err(err) => {
                let mapped = match err {
                    BackendError::Rejected { message: Some(message), .. }
                        if message == "Test already submitted" =>
                    {
                        AttemptError::Rejected("You have already submitted this test.".to_string())
                    }
                    BackendError::Rejected { message: Some(message), .. }
                        if message == "Invalid or expired token" =>
                    {
                        AttemptError::Auth(
                            "Session expired. Please refresh and verify again.".to_string(),
                        )
                    }
                    other => AttemptError::from_backend(other, START_FALLBACK),
                };
                return Err(mapped);
            }
        };

        questions.sort_by_key(|question| question.order_index);
        let total_minutes =
            session.test.as_ref().map(|test| test.total_time_minutes).unwrap_or_default();

        tracing::info!(access_code, questions = questions.len(), total_minutes, "attempt started");
        self.store.install_questions(questions);
        self.store.start_timer(total_minutes);
        self.store.transition(AttemptStatus::InProgress);
        self.spawn_background_tasks();
        Ok(())
    }

    /// Flush the ledger and finalize the attempt: one concurrent upsert per
    /// answer (failures logged, non-fatal), then the submit call. Shared by
    /// the explicit finish action, local timer expiry and server-reported
    /// expiry, so all three paths submit at most once.
    pub async fn finalize(self: &Arc<Self>) -> Result<(), AttemptError> {
        let Ok(_gate) = self.finalize_gate.try_lock() else {
            tracing::debug!("finalize already in flight; ignoring re-entry");
            return Ok(());
        };

        match self.store.status() {
            AttemptStatus::InProgress | AttemptStatus::Submitting => {}
            AttemptStatus::Submitted => return Ok(()),
            other => {
                return Err(AttemptError::Validation(format!(
                    "Cannot submit while the attempt is {other}"
                )))
            }
        }

        self.store.flush_staged_draft();
        let session = self.store.snapshot();
        let (Some(access_code), Some(token), Some(email), Some(attempt_id)) = (
            session.access_code,
            session.token,
            session.candidate_email,
            session.attempt_id,
        ) else {
            return Err(AttemptError::Validation(SUBMIT_MISSING_INFO.to_string()));
        };

        self.store.transition(AttemptStatus::Submitting);

        // Per-question grading is commutative; no ordering between upserts.
        let mut handles = Vec::with_capacity(session.answers.len());
        for slot in &session.answers {
            let backend = Arc::clone(&self.backend);
            let upsert = AnswerUpsert {
                email: email.clone(),
                attempt_id: attempt_id.clone(),
                question_id: slot.question_id.clone(),
                answer: slot.to_wire(),
            };
            let access_code = access_code.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                if let Err(err) = backend.upsert_answer(&access_code, &token, &upsert).await {
                    metrics::counter!("attempt_answer_upsert_failures_total").increment(1);
                    tracing::warn!(
                        question_id = %upsert.question_id,
                        error = %err,
                        "Failed to upsert answer; it will be re-sent on the next finalize"
                    );
                }
            }));
        }
        for handle in handles {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "Answer upsert task join failed");
            }
        }

        let submit = SubmitRequest { email, attempt_id };
        match self.backend.submit_attempt(&access_code, &token, &submit).await {
            Ok(()) => {
                tracing::info!(access_code, attempt_id = %submit.attempt_id, "attempt submitted");
                self.store.transition(AttemptStatus::Submitted);
                Ok(())
            }
            Err(err) => {
                // Recoverable: ledger and timer survive, tasks resume.
                self.store.transition(AttemptStatus::InProgress);
                self.spawn_background_tasks();
                Err(AttemptError::from_backend(err, SUBMIT_FALLBACK))
            }
        }
    }

    /// Tear everything down and reinitialize every session field.
    pub fn reset(&self) {
        self.abort_background_tasks();
        self.store.reset();
    }

    /// (Re)register the countdown, time-sync and heartbeat tasks. Any
    /// previous generation is aborted first so two countdowns can never run
    /// against the same session.
    fn spawn_background_tasks(self: &Arc<Self>) {
        let mut background = self.background.lock().expect("background task list poisoned");
        for handle in background.drain(..) {
            handle.abort();
        }
        *background = tasks::spawn_attempt_tasks(Arc::clone(self));
    }

    fn abort_background_tasks(&self) {
        let mut background = self.background.lock().expect("background task list poisoned");
        for handle in background.drain(..) {
            handle.abort();
        }
    }
}
