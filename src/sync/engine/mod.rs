//! Sync decision engine.
//!
//! The functional core of local/remote synchronization. It is a pure state
//! machine:
//! - **Input**: `SyncEvent` (mutations, timer fires, remote results).
//! - **Output**: `Vec<SyncCommand>` (side effects executed by the orchestrator).
//!
//! It never touches the network, the disk or a clock. Timers are requested
//! with a generation number and a fire carrying an older generation is ignored,
//! which makes arming a cancel-and-replace operation.

pub mod state;
mod logic;
pub mod types;

#[cfg(test)]
mod tests;

pub use crate::sync::engine::types::{
    PullPurpose, RemoteSnapshot, SyncCommand, SyncEvent, SyncNotice, SyncStatus,
};

use std::time::Duration;

use state::{EngineState, Lifecycle};

/// Quiet period after the last mutation before a push is attempted.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// How long `success`/`error` stay visible before reverting to `idle`.
pub const DEFAULT_STATUS_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    pub quiet_period: Duration,
    pub status_window: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            status_window: DEFAULT_STATUS_WINDOW,
        }
    }
}

#[derive(Debug)]
pub struct SyncEngine {
    state: EngineState,
}

impl SyncEngine {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            state: EngineState {
                lifecycle: Lifecycle::Init,
                status: SyncStatus::Idle,
                remote_configured: false,
                last_pushed: None,
                pending_push: None,
                quiet_generation: 0,
                status_generation: 0,
                quiet_period: config.quiet_period,
                status_window: config.status_window,
            },
        }
    }

    /// Consumes an event and returns the commands the orchestrator must run,
    /// in order.
    pub fn handle_event(&mut self, event: SyncEvent) -> Vec<SyncCommand> {
        if self.state.lifecycle == Lifecycle::Disposed {
            log::trace!("[ENGINE] disposed, dropping {}", event.kind());
            return vec![];
        }

        match event {
            SyncEvent::Started { remote_configured } => {
                logic::on_started(&mut self.state, remote_configured)
            }
            SyncEvent::RemoteAttached => logic::on_remote_attached(&mut self.state),
            SyncEvent::RemoteDetached => logic::on_remote_detached(&mut self.state),
            SyncEvent::Mutated { fingerprint } => logic::on_mutated(&mut self.state, fingerprint),
            SyncEvent::QuietPeriodElapsed { generation } => {
                logic::on_quiet_period_elapsed(&mut self.state, generation)
            }
            SyncEvent::PushFinished {
                fingerprint,
                result,
            } => logic::on_push_finished(&mut self.state, fingerprint, result),
            SyncEvent::PullFinished { purpose, result } => {
                logic::on_pull_finished(&mut self.state, purpose, result)
            }
            SyncEvent::ForcePush { fingerprint } => {
                logic::on_force_push(&mut self.state, fingerprint)
            }
            SyncEvent::ForcePull { confirmed } => logic::on_force_pull(&mut self.state, confirmed),
            SyncEvent::StatusWindowElapsed { generation } => {
                logic::on_status_window_elapsed(&mut self.state, generation)
            }
            SyncEvent::LocalWiped => logic::on_local_wiped(&mut self.state),
            SyncEvent::Disposed => logic::on_disposed(&mut self.state),
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.state.status
    }

    pub fn is_started(&self) -> bool {
        self.state.lifecycle != Lifecycle::Init
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lifecycle == Lifecycle::Disposed
    }

    pub fn remote_configured(&self) -> bool {
        self.state.remote_configured
    }

    /// Whether a debounced push is waiting for its quiet period.
    pub fn has_pending_push(&self) -> bool {
        self.state.pending_push.is_some()
    }
}
