pub mod orchestrator;
pub mod timer;


pub use orchestrator::{Confirmation, PullOutcome, SyncOrchestrator};
pub use timer::Timer;
