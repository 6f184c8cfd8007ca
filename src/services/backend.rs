use async_trait::async_trait;
use thiserror::Error;

use crate::schemas::{
    AnswerUpsert, HeartbeatPayload, Question, SubmitRequest, TestDetails, TimeStatus,
    VerifiedCandidate,
};

#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-success status or envelope.
    #[error("backend rejected the request (status {status}): {message:?}")]
    Rejected { status: u16, message: Option<String> },
    /// The request never produced a usable response.
    #[error(transparent)]
    Transport(anyhow::Error),
}

impl BackendError {
    pub(crate) fn transport(err: impl Into<anyhow::Error>) -> Self {
        BackendError::Transport(err.into())
    }
}

/// The proctoring-backend contract the attempt engine depends on. One
/// implementation speaks HTTP; tests substitute a scripted one.
#[async_trait]
pub trait ProctoringBackend: Send + Sync {
    async fn test_details(&self, access_code: &str) -> Result<TestDetails, BackendError>;

    async fn verify_candidate(
        &self,
        access_code: &str,
        email: &str,
    ) -> Result<VerifiedCandidate, BackendError>;

    async fn start_attempt(
        &self,
        access_code: &str,
        token: &str,
    ) -> Result<Vec<Question>, BackendError>;

    async fn remaining_time(&self, access_code: &str, token: &str)
        -> Result<TimeStatus, BackendError>;

    async fn heartbeat(
        &self,
        access_code: &str,
        token: &str,
        beat: &HeartbeatPayload,
    ) -> Result<(), BackendError>;

    async fn upsert_answer(
        &self,
        access_code: &str,
        token: &str,
        upsert: &AnswerUpsert,
    ) -> Result<(), BackendError>;

    async fn submit_attempt(
        &self,
        access_code: &str,
        token: &str,
        submit: &SubmitRequest,
    ) -> Result<(), BackendError>;
}
