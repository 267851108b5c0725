use std::time::Duration;

use crate::sync::engine::types::SyncStatus;
use crate::sync::fingerprint::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Init,
    Active,
    Disposed,
}

#[derive(Debug)]
pub struct EngineState {
    pub lifecycle: Lifecycle,
    pub status: SyncStatus,
    pub remote_configured: bool,

    /// Content of the last successful push (or of the last pulled document).
    pub last_pushed: Option<Fingerprint>,

    /// Content waiting for the quiet period to elapse.
    pub pending_push: Option<Fingerprint>,

    /// Bumped on every arm so a stale timer fire is recognisable.
    pub quiet_generation: u64,
    pub status_generation: u64,

    pub quiet_period: Duration,
    pub status_window: Duration,
}
