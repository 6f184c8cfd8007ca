use serde::{Deserialize, Serialize};

use crate::schemas::question::{Language, Question};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDetails {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub total_time_minutes: u64,
    pub total_questions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedCandidate {
    pub token: String,
    pub attempt_id: String,
}

/// Payload of the start endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartData {
    pub questions: Vec<Question>,
}

/// Authoritative remaining time as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeStatus {
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: u64,
    pub expired: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    pub email: String,
    #[serde(rename = "attemptId")]
    pub attempt_id: String,
    #[serde(rename = "timeRemaining")]
    pub time_remaining: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerUpsert {
    pub email: String,
    #[serde(rename = "attemptId")]
    pub attempt_id: String,
    #[serde(rename = "questionId")]
    pub question_id: String,
    pub answer: WireAnswer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireAnswer {
    #[serde(rename = "MCQ")]
    Mcq {
        #[serde(
            rename = "selectedOption",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        selected_option: Option<u32>,
    },
    #[serde(rename = "CODING")]
    Coding {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<Language>,
        #[serde(default)]
        code: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub email: String,
    #[serde(rename = "attemptId")]
    pub attempt_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn answer_upsert_serializes_wire_field_names() {
        let upsert = AnswerUpsert {
            email: "a@x.com".into(),
            attempt_id: "A1".into(),
            question_id: "q-1".into(),
            answer: WireAnswer::Mcq { selected_option: Some(1) },
        };

        assert_eq!(
            serde_json::to_value(&upsert).unwrap(),
            json!({
                "email": "a@x.com",
                "attemptId": "A1",
                "questionId": "q-1",
                "answer": {"type": "MCQ", "selectedOption": 1}
            })
        );
    }

    #[test]
    fn untouched_coding_answer_serializes_empty_code_without_language() {
        let answer = WireAnswer::Coding { language: None, code: String::new() };
        assert_eq!(serde_json::to_value(&answer).unwrap(), json!({"type": "CODING", "code": ""}));
    }

    #[test]
    fn time_status_decodes_camel_case() {
        let status: TimeStatus =
            serde_json::from_value(json!({"remainingSeconds": 42, "expired": false})).unwrap();
        assert_eq!(status.remaining_seconds, 42);
        assert!(!status.expired);
    }

    #[test]
    fn heartbeat_uses_camel_case_wire_names() {
        let beat = HeartbeatPayload {
            email: "a@x.com".into(),
            attempt_id: "A1".into(),
            time_remaining: 90,
            timestamp: "2025-01-02T10:20:30Z".into(),
        };
        let value = serde_json::to_value(&beat).unwrap();
        assert_eq!(value["attemptId"], "A1");
        assert_eq!(value["timeRemaining"], 90);
    }
}
