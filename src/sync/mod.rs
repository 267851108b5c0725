//! Local/remote document synchronization.
//!
//! `engine` decides, `runtime` executes, `remote` talks to the remote copy.

pub mod engine;
pub mod fingerprint;
pub mod remote;
pub mod runtime;

pub use engine::{PullPurpose, SyncConfig, SyncEngine, SyncNotice, SyncStatus};
pub use fingerprint::Fingerprint;
pub use remote::RemoteStore;
pub use runtime::{Confirmation, PullOutcome, SyncOrchestrator};
