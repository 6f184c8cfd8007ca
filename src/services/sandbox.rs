use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::Settings;
use crate::schemas::Language;

/// Client for the code-execution sandbox used by non-grading "run" actions.
/// The sandbox is a black box; nothing here affects grading or session
/// state.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Stdout(String),
    CompileError(String),
    RuntimeError(String),
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<FilePayload<'a>>,
    stdin: &'a str,
}

#[derive(Debug, Serialize)]
struct FilePayload<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    message: Option<String>,
    compile: Option<StageResult>,
    run: Option<StageResult>,
}

#[derive(Debug, Default, Deserialize)]
struct StageResult {
    code: Option<i64>,
    stderr: Option<String>,
    output: Option<String>,
}

impl SandboxClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().build().context("Failed to build sandbox HTTP client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.sandbox().base_url.as_str())
    }

    pub async fn run(&self, language: Language, source: &str, stdin: &str) -> Result<RunOutcome> {
        if source.trim().is_empty() {
            bail!("Please enter some code");
        }

        let (runtime, version) = language.sandbox_runtime();
        let request = ExecuteRequest {
            language: runtime,
            version,
            files: vec![FilePayload { content: source }],
            stdin,
        };

        let response = self
            .client
            .post(format!("{}/execute", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Failed to call the execution sandbox")?;
        let parsed: ExecuteResponse =
            response.json().await.context("Sandbox returned a non-JSON body")?;

        outcome_from_response(parsed)
    }
}

fn outcome_from_response(response: ExecuteResponse) -> Result<RunOutcome> {
    if let Some(message) = response.message {
        return Err(anyhow!(message));
    }

    if let Some(compile) = &response.compile {
        if compile.code.unwrap_or(0) != 0 {
            return Ok(RunOutcome::CompileError(stage_error(compile)));
        }
    }

    let run = response.run.ok_or_else(|| anyhow!("Sandbox response is missing the run stage"))?;
    if run.code.unwrap_or(0) != 0 {
        return Ok(RunOutcome::RuntimeError(stage_error(&run)));
    }

    let output = run.output.unwrap_or_default();
    Ok(RunOutcome::Stdout(output.trim().to_string()))
}

fn stage_error(stage: &StageResult) -> String {
    stage
        .stderr
        .clone()
        .filter(|stderr| !stderr.is_empty())
        .or_else(|| stage.output.clone())
        .unwrap_or_default()
}
