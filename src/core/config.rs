use std::env;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Settings {
    backend: BackendSettings,
    sandbox: SandboxSettings,
    attempt: AttemptSettings,
    timers: TimerSettings,
    telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct SandboxSettings {
    pub base_url: String,
}

/// Attempt identity for the headless driver binary; irrelevant when the
/// crate is embedded and driven programmatically.
#[derive(Debug, Clone)]
pub struct AttemptSettings {
    pub access_code: Option<String>,
    pub candidate_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TimerSettings {
    pub countdown_seconds: u64,
    pub time_sync_seconds: u64,
    pub heartbeat_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    pub log_level: String,
    pub json: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("{field} must be positive")]
    ZeroInterval { field: &'static str },
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let backend_base_url =
            env_or_default("TESTEVY_BACKEND_URL", "http://localhost:8000/api");
        let sandbox_base_url =
            env_or_default("TESTEVY_SANDBOX_URL", "https://emkc.org/api/v2/piston");

        let access_code = env_optional("TESTEVY_ACCESS_CODE");
        let candidate_email = env_optional("TESTEVY_CANDIDATE_EMAIL");

        let countdown_seconds =
            parse_u64("COUNTDOWN_INTERVAL_SECONDS", env_or_default("COUNTDOWN_INTERVAL_SECONDS", "1"))?;
        let time_sync_seconds =
            parse_u64("TIME_SYNC_INTERVAL_SECONDS", env_or_default("TIME_SYNC_INTERVAL_SECONDS", "60"))?;
        let heartbeat_seconds =
            parse_u64("HEARTBEAT_INTERVAL_SECONDS", env_or_default("HEARTBEAT_INTERVAL_SECONDS", "30"))?;

        let log_level = env_or_default("TESTEVY_LOG_LEVEL", "info");
        let json = env_optional("TESTEVY_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            backend: BackendSettings { base_url: backend_base_url },
            sandbox: SandboxSettings { base_url: sandbox_base_url },
            attempt: AttemptSettings { access_code, candidate_email },
            timers: TimerSettings { countdown_seconds, time_sync_seconds, heartbeat_seconds },
            telemetry: TelemetrySettings { log_level, json },
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("COUNTDOWN_INTERVAL_SECONDS", self.timers.countdown_seconds),
            ("TIME_SYNC_INTERVAL_SECONDS", self.timers.time_sync_seconds),
            ("HEARTBEAT_INTERVAL_SECONDS", self.timers.heartbeat_seconds),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(ConfigError::ZeroInterval { field });
            }
        }
        Ok(())
    }

    pub fn backend(&self) -> &BackendSettings {
        &self.backend
    }

    pub fn sandbox(&self) -> &SandboxSettings {
        &self.sandbox
    }

    pub fn attempt(&self) -> &AttemptSettings {
        &self.attempt
    }

    pub fn timers(&self) -> &TimerSettings {
        &self.timers
    }

    pub fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_u64(field: &'static str, value: String) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue { field, value })
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}
