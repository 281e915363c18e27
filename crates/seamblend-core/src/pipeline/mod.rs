pub mod config;
mod orchestrator;
mod types;

pub use config::{BlendConfig, InputSpec, SeamStrategy};
pub use orchestrator::{run_blend, run_deghost};
pub use types::{BlendStage, BlendSummary, NoOpReporter, ProgressReporter};
