use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::core::config::Settings;
use crate::schemas::{
    AnswerUpsert, ApiEnvelope, HeartbeatPayload, Question, StartData, SubmitRequest, TestDetails,
    TimeStatus, VerifiedCandidate,
};
use crate::services::backend::{BackendError, ProctoringBackend};

/// HTTP implementation of the proctoring-backend contract. There is no
/// per-call timeout: a hung request delays its own cycle only, never the
/// next scheduled one.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().build().context("Failed to build proctoring HTTP client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.backend().base_url.as_str())
    }

    fn test_url(&self, access_code: &str, path: &str) -> String {
        format!("{}/test/{}/{}", self.base_url, access_code, path)
    }

    /// Unwrap the `{success, data, message}` envelope, translating error
    /// statuses and `success=false` into `Rejected` with the server message.
    async fn request_data<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = builder.send().await.map_err(BackendError::transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(BackendError::transport)?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(&bytes)
                .ok()
                .and_then(|envelope| envelope.message);
            return Err(BackendError::Rejected { status: status.as_u16(), message });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_slice(&bytes)
            .map_err(|err| BackendError::transport(anyhow!("invalid response body: {err}")))?;
        if !envelope.success {
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message: envelope.message,
            });
        }
        envelope
            .data
            .ok_or_else(|| BackendError::transport(anyhow!("response is missing its data payload")))
    }

    /// Like `request_data`, for ack-only endpoints whose payload we ignore.
    async fn request_ack(&self, builder: RequestBuilder) -> Result<(), BackendError> {
        let response = builder.send().await.map_err(BackendError::transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(BackendError::transport)?;

        let envelope = serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(&bytes).ok();
        let message = envelope.as_ref().and_then(|envelope| envelope.message.clone());
        if !status.is_success() || envelope.is_some_and(|envelope| !envelope.success) {
            return Err(BackendError::Rejected { status: status.as_u16(), message });
        }
        Ok(())
    }
}

#[async_trait]
impl ProctoringBackend for HttpBackend {
    async fn test_details(&self, access_code: &str) -> Result<TestDetails, BackendError> {
        self.request_data(self.client.get(self.test_url(access_code, "details"))).await
    }

    async fn verify_candidate(
        &self,
        access_code: &str,
        email: &str,
    ) -> Result<VerifiedCandidate, BackendError> {
        let url = self.test_url(access_code, "candidate/verify");
        self.request_data(self.client.post(url).json(&json!({ "email": email }))).await
    }

    async fn start_attempt(
        &self,
        access_code: &str,
        token: &str,
    ) -> Result<Vec<Question>, BackendError> {
        let url = self.test_url(access_code, "start");
        let data: StartData =
            self.request_data(self.client.post(url).bearer_auth(token).json(&json!({}))).await?;
        Ok(data.questions)
    }

    async fn remaining_time(
        &self,
        access_code: &str,
        token: &str,
    ) -> Result<TimeStatus, BackendError> {
        self.request_data(self.client.get(self.test_url(access_code, "time")).bearer_auth(token))
            .await
    }

    async fn heartbeat(
        &self,
        access_code: &str,
        token: &str,
        beat: &HeartbeatPayload,
    ) -> Result<(), BackendError> {
        let url = self.test_url(access_code, "heartbeat");
        self.request_ack(self.client.post(url).bearer_auth(token).json(beat)).await
    }

    async fn upsert_answer(
        &self,
        access_code: &str,
        token: &str,
        upsert: &AnswerUpsert,
    ) -> Result<(), BackendError> {
        let url = self.test_url(access_code, "answer");
        self.request_ack(self.client.post(url).bearer_auth(token).json(upsert)).await
    }

    async fn submit_attempt(
        &self,
        access_code: &str,
        token: &str,
        submit: &SubmitRequest,
    ) -> Result<(), BackendError> {
        let url = self.test_url(access_code, "submit");
        self.request_ack(self.client.post(url).bearer_auth(token).json(submit)).await
    }
}
