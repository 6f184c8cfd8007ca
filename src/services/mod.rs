pub mod backend;
pub mod http;
pub mod sandbox;

pub use backend::{BackendError, ProctoringBackend};
pub use http::HttpBackend;
pub use sandbox::{RunOutcome, SandboxClient};
