use time::OffsetDateTime;
use uuid::Uuid;

use crate::schemas::{Language, Question, QuestionBody, TestDetails, TimeStatus, WireAnswer};
use crate::session::status::AttemptStatus;

/// One buffered answer, typed to its question. Exactly one slot exists per
/// question id for the lifetime of the attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSlot {
    pub question_id: String,
    pub value: AnswerValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerValue {
    Mcq { selected: Option<u32> },
    Coding { draft: Option<CodeDraft> },
}

/// Atomic `{language, code}` pair. Switching language replaces the whole
/// pair; no per-language history is retained.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeDraft {
    pub language: Language,
    pub code: String,
}

impl AnswerSlot {
    fn stub_for(question: &Question) -> Self {
        let value = match question.body {
            QuestionBody::Mcq { .. } => AnswerValue::Mcq { selected: None },
            QuestionBody::Coding { .. } => AnswerValue::Coding { draft: None },
        };
        Self { question_id: question.id.clone(), value }
    }

    pub fn is_answered(&self) -> bool {
        match &self.value {
            AnswerValue::Mcq { selected } => selected.is_some(),
            AnswerValue::Coding { draft } => {
                draft.as_ref().is_some_and(|draft| !draft.code.trim().is_empty())
            }
        }
    }

    pub fn to_wire(&self) -> WireAnswer {
        match &self.value {
            AnswerValue::Mcq { selected } => WireAnswer::Mcq { selected_option: *selected },
            AnswerValue::Coding { draft } => WireAnswer::Coding {
                language: draft.as_ref().map(|draft| draft.language),
                code: draft.as_ref().map(|draft| draft.code.clone()).unwrap_or_default(),
            },
        }
    }
}

/// Live editor buffer for a coding question, not yet committed to the
/// ledger. Navigation and finalize flush it.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedDraft {
    pub question_id: String,
    pub language: Language,
    pub code: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerState {
    pub remaining_seconds: u64,
    pub last_synced_at: Option<OffsetDateTime>,
    expiry_fired: bool,
}

/// Outcome of one local countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    Ticked,
    /// The countdown just hit zero; the caller must run the finalize
    /// sequence. Reported at most once until server authority restores time.
    Expired,
    Idle,
}

impl TimerState {
    pub fn decrement(&mut self) -> CountdownStep {
        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }
        if self.remaining_seconds == 0 && !self.expiry_fired {
            self.expiry_fired = true;
            return CountdownStep::Expired;
        }
        if self.remaining_seconds == 0 {
            CountdownStep::Idle
        } else {
            CountdownStep::Ticked
        }
    }

    /// Unconditionally adopt the server value; the server wins every
    /// discrepancy, including values above the last local tick.
    pub fn apply_server_time(&mut self, status: TimeStatus, now: OffsetDateTime) {
        self.remaining_seconds = status.remaining_seconds;
        self.last_synced_at = Some(now);
        if status.remaining_seconds > 0 {
            self.expiry_fired = false;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptSession {
    pub status: AttemptStatus,
    pub error_message: Option<String>,
    pub access_code: Option<String>,
    pub test: Option<TestDetails>,
    pub candidate_email: Option<String>,
    pub attempt_id: Option<String>,
    pub token: Option<String>,
    pub questions: Vec<Question>,
    pub answers: Vec<AnswerSlot>,
    pub current_question_index: usize,
    pub timer: TimerState,
    pub started_at: Option<OffsetDateTime>,
    pub staged_draft: Option<StagedDraft>,
    /// Local correlation id for logs, regenerated on reset.
    pub session_id: Uuid,
}

impl Default for AttemptSession {
    fn default() -> Self {
        Self {
            status: AttemptStatus::Loading,
            error_message: None,
            access_code: None,
            test: None,
            candidate_email: None,
            attempt_id: None,
            token: None,
            questions: Vec::new(),
            answers: Vec::new(),
            current_question_index: 0,
            timer: TimerState::default(),
            started_at: None,
            staged_draft: None,
            session_id: Uuid::new_v4(),
        }
    }
}

impl AttemptSession {
    pub fn answer(&self, question_id: &str) -> Option<&AnswerSlot> {
        self.answers.iter().find(|slot| slot.question_id == question_id)
    }

    pub fn is_question_answered(&self, question_id: &str) -> bool {
        self.answer(question_id).is_some_and(AnswerSlot::is_answered)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub(crate) fn install_questions(&mut self, questions: Vec<Question>) {
        self.answers = questions.iter().map(AnswerSlot::stub_for).collect();
        self.questions = questions;
        self.current_question_index = 0;
        self.staged_draft = None;
    }

    pub(crate) fn start_timer(&mut self, total_minutes: u64, now: OffsetDateTime) {
        self.timer = TimerState { remaining_seconds: total_minutes * 60, ..TimerState::default() };
        self.started_at = Some(now);
    }

    /// Total replace of the selected option. Unknown ids are ignored.
    pub(crate) fn update_mcq_answer(&mut self, question_id: &str, option_index: u32) {
        if let Some(slot) = self.answer_mut(question_id) {
            if let AnswerValue::Mcq { selected } = &mut slot.value {
                *selected = Some(option_index);
            }
        }
    }

    /// Atomic replace of the `{language, code}` pair.
    pub(crate) fn update_code_answer(&mut self, question_id: &str, language: Language, code: String) {
        if let Some(slot) = self.answer_mut(question_id) {
            if let AnswerValue::Coding { draft } = &mut slot.value {
                *draft = Some(CodeDraft { language, code });
            }
        }
    }

    /// Commit the staged editor buffer, if any, into the ledger.
    pub(crate) fn flush_staged_draft(&mut self) {
        if let Some(staged) = self.staged_draft.take() {
            self.update_code_answer(&staged.question_id, staged.language, staged.code);
        }
    }

    fn answer_mut(&mut self, question_id: &str) -> Option<&mut AnswerSlot> {
        self.answers.iter_mut().find(|slot| slot.question_id == question_id)
    }
}
