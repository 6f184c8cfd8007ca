use serde::{Deserialize, Serialize};

pub mod question;
pub mod wire;

pub use question::{
    CodeTemplate, CodingContent, Difficulty, ExecutionConstraints, ExecutionSpec, IoMode, Language,
    McqContent, Question, QuestionBody, TestCase,
};
pub use wire::{
    AnswerUpsert, HeartbeatPayload, StartData, SubmitRequest, TestDetails, TimeStatus,
    VerifiedCandidate, WireAnswer,
};

/// Every proctoring-backend response wraps its payload in this envelope.
/// Error responses may omit `data` and carry only `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), message: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { success: false, data: None, message: Some(message.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // VerifiedCandidate implements no Default; the envelope must decode for
    // any payload type regardless.
    #[test]
    fn envelope_decodes_payloads_that_have_no_default() {
        let envelope: ApiEnvelope<VerifiedCandidate> = serde_json::from_value(json!({
            "success": true,
            "data": {"token": "T", "attempt_id": "A1"}
        }))
        .expect("decode success envelope");
        assert!(envelope.success);
        assert_eq!(envelope.data.expect("payload").token, "T");
        assert!(envelope.message.is_none());
    }

    #[test]
    fn error_envelope_decodes_with_data_and_message_absent() {
        let envelope: ApiEnvelope<VerifiedCandidate> =
            serde_json::from_value(json!({"success": false, "message": "Candidate not registered"}))
                .expect("decode error envelope");
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message.as_deref(), Some("Candidate not registered"));

        let bare: ApiEnvelope<VerifiedCandidate> =
            serde_json::from_value(json!({"success": false})).expect("decode bare envelope");
        assert!(bare.data.is_none());
        assert!(bare.message.is_none());
    }
}
