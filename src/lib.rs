pub mod controller;
pub mod core;
pub mod errors;
pub mod schemas;
pub mod services;
pub mod session;
pub mod tasks;

#[cfg(test)]
mod test_support;

pub use controller::AttemptController;
pub use errors::AttemptError;

use std::sync::Arc;

use anyhow::Context;

use crate::core::{config::Settings, shutdown, telemetry};
use crate::services::HttpBackend;
use crate::tasks::TaskIntervals;

/// Headless attempt driver: resolves the configured access code, verifies
/// the candidate, starts the attempt and lets the background tasks run until
/// the session reaches a terminal state or the process is asked to stop, in
/// which case the attempt is finalized first.
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    let access_code = settings
        .attempt()
        .access_code
        .clone()
        .context("TESTEVY_ACCESS_CODE is not set")?;
    let email = settings
        .attempt()
        .candidate_email
        .clone()
        .context("TESTEVY_CANDIDATE_EMAIL is not set")?;

    let backend = Arc::new(HttpBackend::from_settings(&settings)?);
    let controller =
        AttemptController::new(backend, TaskIntervals::from_settings(settings.timers()));

    controller.resolve(&access_code).await?;
    controller.verify(&email).await?;
    controller.start().await?;

    let mut rx = controller.store().subscribe();
    let shutdown = shutdown::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("finalizing attempt before shutdown");
                if let Err(err) = controller.finalize().await {
                    tracing::error!(error = %err, "finalize on shutdown failed");
                }
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = rx.borrow().status;
                if status.is_terminal() {
                    tracing::info!(%status, "attempt reached a terminal state");
                    break;
                }
            }
        }
    }

    Ok(())
}
