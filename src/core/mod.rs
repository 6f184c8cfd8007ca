pub mod config;
pub(crate) mod shutdown;
pub(crate) mod telemetry;
pub(crate) mod time;
