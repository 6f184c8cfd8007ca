use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::schemas::{
    AnswerUpsert, CodeTemplate, CodingContent, Difficulty, ExecutionConstraints, ExecutionSpec,
    HeartbeatPayload, IoMode, Language, McqContent, Question, QuestionBody, SubmitRequest,
    TestCase, TestDetails, TimeStatus, VerifiedCandidate,
};
use crate::services::backend::{BackendError, ProctoringBackend};

pub(crate) fn test_details(total_minutes: u64, total_questions: u32) -> TestDetails {
    TestDetails {
        id: "t-1".into(),
        title: "Backend basics".into(),
        description: None,
        total_time_minutes: total_minutes,
        total_questions,
        instructions: Some(vec!["Do not switch tabs".into()]),
    }
}

pub(crate) fn mcq_question(id: &str, order: u32) -> Question {
    Question {
        id: id.into(),
        order_index: order,
        marks: 2,
        title: format!("Question {}", order + 1),
        body: QuestionBody::Mcq {
            content: McqContent {
                question: "Pick the right option".into(),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            },
        },
        difficulty: Some(Difficulty::Easy),
        tags: Vec::new(),
    }
}

pub(crate) fn coding_question(id: &str, order: u32) -> Question {
    Question {
        id: id.into(),
        order_index: order,
        marks: 10,
        title: format!("Question {}", order + 1),
        body: QuestionBody::Coding {
            content: CodingContent {
                question: "Sum two integers from stdin".into(),
                code_templates: vec![CodeTemplate {
                    language: Language::Python,
                    template: "print()".into(),
                }],
                io_mode: Some(IoMode::Stdin),
            },
            execution: Some(ExecutionSpec {
                constraints: ExecutionConstraints { time_limit_ms: 2000, memory_limit_mb: 256 },
                test_cases: vec![TestCase {
                    input: "1 2".into(),
                    expected_output: "3".into(),
                    is_hidden: false,
                }],
            }),
        },
        difficulty: Some(Difficulty::Medium),
        tags: vec!["io".into()],
    }
}

#[derive(Debug, Clone)]
pub(crate) enum ScriptedFailure {
    Reject(u16, Option<&'static str>),
    Network,
}

impl ScriptedFailure {
    fn into_err(self) -> BackendError {
        match self {
            ScriptedFailure::Reject(status, message) => BackendError::Rejected {
                status,
                message: message.map(str::to_string),
            },
            ScriptedFailure::Network => {
                BackendError::Transport(anyhow::anyhow!("connection refused"))
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CallLog {
    pub(crate) details: AtomicUsize,
    pub(crate) verify: AtomicUsize,
    pub(crate) start: AtomicUsize,
    pub(crate) time: AtomicUsize,
    pub(crate) heartbeat: AtomicUsize,
    pub(crate) submit: AtomicUsize,
    pub(crate) answers: Mutex<Vec<AnswerUpsert>>,
    /// Coarse call order, for before/after assertions.
    pub(crate) events: Mutex<Vec<String>>,
}

impl CallLog {
    fn record(&self, counter: &AtomicUsize, event: impl Into<String>) {
        counter.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(event.into());
    }
}

/// In-memory stand-in for the proctoring backend. Every endpoint succeeds
/// unless a failure has been scripted for it; scripted failures are consumed
/// in order.
pub(crate) struct ScriptedBackend {
    details: TestDetails,
    questions: Vec<Question>,
    details_failure: Mutex<Option<ScriptedFailure>>,
    verify_failures: Mutex<VecDeque<ScriptedFailure>>,
    start_failures: Mutex<VecDeque<ScriptedFailure>>,
    time_script: Mutex<VecDeque<Result<TimeStatus, ScriptedFailure>>>,
    heartbeat_failures_left: AtomicUsize,
    submit_failures: Mutex<VecDeque<ScriptedFailure>>,
    pub(crate) calls: CallLog,
}

impl ScriptedBackend {
    pub(crate) fn new(details: TestDetails, questions: Vec<Question>) -> Self {
        Self {
            details,
            questions,
            details_failure: Mutex::new(None),
            verify_failures: Mutex::new(VecDeque::new()),
            start_failures: Mutex::new(VecDeque::new()),
            time_script: Mutex::new(VecDeque::new()),
            heartbeat_failures_left: AtomicUsize::new(0),
            submit_failures: Mutex::new(VecDeque::new()),
            calls: CallLog::default(),
        }
    }

    pub(crate) fn two_question_test() -> Self {
        Self::new(test_details(30, 2), vec![mcq_question("q-1", 0), coding_question("q-2", 1)])
    }

    pub(crate) fn fail_details(self, failure: ScriptedFailure) -> Self {
        *self.details_failure.lock().unwrap() = Some(failure);
        self
    }

    pub(crate) fn queue_verify_failure(self, failure: ScriptedFailure) -> Self {
        self.verify_failures.lock().unwrap().push_back(failure);
        self
    }

    pub(crate) fn queue_start_failure(self, failure: ScriptedFailure) -> Self {
        self.start_failures.lock().unwrap().push_back(failure);
        self
    }

    pub(crate) fn queue_time(self, response: Result<TimeStatus, ScriptedFailure>) -> Self {
        self.time_script.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn fail_heartbeats(self, count: usize) -> Self {
        self.heartbeat_failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub(crate) fn queue_submit_failure(self, failure: ScriptedFailure) -> Self {
        self.submit_failures.lock().unwrap().push_back(failure);
        self
    }

    pub(crate) fn recorded_answers(&self) -> Vec<AnswerUpsert> {
        self.calls.answers.lock().unwrap().clone()
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.calls.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProctoringBackend for ScriptedBackend {
    async fn test_details(&self, _access_code: &str) -> Result<TestDetails, BackendError> {
        self.calls.record(&self.calls.details, "details");
        if let Some(failure) = self.details_failure.lock().unwrap().take() {
            return Err(failure.into_err());
        }
        Ok(self.details.clone())
    }

    async fn verify_candidate(
        &self,
        _access_code: &str,
        _email: &str,
    ) -> Result<VerifiedCandidate, BackendError> {
        self.calls.record(&self.calls.verify, "verify");
        if let Some(failure) = self.verify_failures.lock().unwrap().pop_front() {
            return Err(failure.into_err());
        }
        Ok(VerifiedCandidate { token: "T".into(), attempt_id: "A1".into() })
    }

    async fn start_attempt(
        &self,
        _access_code: &str,
        _token: &str,
    ) -> Result<Vec<Question>, BackendError> {
        self.calls.record(&self.calls.start, "start");
        if let Some(failure) = self.start_failures.lock().unwrap().pop_front() {
            return Err(failure.into_err());
        }
        Ok(self.questions.clone())
    }

    async fn remaining_time(
        &self,
        _access_code: &str,
        _token: &str,
    ) -> Result<TimeStatus, BackendError> {
        self.calls.record(&self.calls.time, "time");
        match self.time_script.lock().unwrap().pop_front() {
            Some(Ok(status)) => Ok(status),
            Some(Err(failure)) => Err(failure.into_err()),
            None => Ok(TimeStatus {
                remaining_seconds: self.details.total_time_minutes * 60,
                expired: false,
            }),
        }
    }

    async fn heartbeat(
        &self,
        _access_code: &str,
        _token: &str,
        _beat: &HeartbeatPayload,
    ) -> Result<(), BackendError> {
        self.calls.record(&self.calls.heartbeat, "heartbeat");
        let left = self.heartbeat_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.heartbeat_failures_left.store(left - 1, Ordering::SeqCst);
            return Err(ScriptedFailure::Network.into_err());
        }
        Ok(())
    }

    async fn upsert_answer(
        &self,
        _access_code: &str,
        _token: &str,
        upsert: &AnswerUpsert,
    ) -> Result<(), BackendError> {
        self.calls.answers.lock().unwrap().push(upsert.clone());
        self.calls.events.lock().unwrap().push(format!("answer:{}", upsert.question_id));
        Ok(())
    }

    async fn submit_attempt(
        &self,
        _access_code: &str,
        _token: &str,
        _submit: &SubmitRequest,
    ) -> Result<(), BackendError> {
        self.calls.record(&self.calls.submit, "submit");
        if let Some(failure) = self.submit_failures.lock().unwrap().pop_front() {
            return Err(failure.into_err());
        }
        Ok(())
    }
}
