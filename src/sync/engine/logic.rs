use crate::sync::engine::state::{EngineState, Lifecycle};
use crate::sync::engine::types::{
    PullPurpose, RemoteSnapshot, SyncCommand, SyncNotice, SyncStatus,
};
use crate::sync::fingerprint::Fingerprint;

pub fn on_started(state: &mut EngineState, remote_configured: bool) -> Vec<SyncCommand> {
    if state.lifecycle != Lifecycle::Init {
        log::debug!("[ENGINE] already started, ignoring");
        return vec![];
    }
    state.lifecycle = Lifecycle::Active;
    state.remote_configured = remote_configured;

    if !remote_configured {
        log::info!("[ENGINE] no remote configured, staying local");
        return vec![];
    }

    log::info!("[ENGINE] remote configured, pulling");
    begin_pull(state, PullPurpose::Load)
}

pub fn on_remote_attached(state: &mut EngineState) -> Vec<SyncCommand> {
    if state.remote_configured {
        // Load already ran for this adapter.
        return vec![];
    }
    state.remote_configured = true;
    state.last_pushed = None;

    if state.lifecycle != Lifecycle::Active {
        // `Started` will issue the pull.
        return vec![];
    }

    log::info!("[ENGINE] remote attached after startup, re-running load");
    begin_pull(state, PullPurpose::Load)
}

pub fn on_remote_detached(state: &mut EngineState) -> Vec<SyncCommand> {
    state.remote_configured = false;
    state.last_pushed = None;

    let mut cmds = cancel_pending(state);
    if state.status == SyncStatus::Syncing {
        cmds.extend(set_status(state, SyncStatus::Idle));
    }
    cmds
}

pub fn on_mutated(state: &mut EngineState, fingerprint: Fingerprint) -> Vec<SyncCommand> {
    if !state.remote_configured {
        return vec![];
    }

    if state.last_pushed == Some(fingerprint) {
        log::debug!("[ENGINE] {:?} already pushed, skipping", fingerprint);
        return cancel_pending(state);
    }

    state.pending_push = Some(fingerprint);
    state.quiet_generation += 1;
    log::trace!(
        "[ENGINE] debounce armed (gen {}) for {:?}",
        state.quiet_generation,
        fingerprint
    );

    vec![SyncCommand::ArmQuietTimer {
        generation: state.quiet_generation,
        after: state.quiet_period,
    }]
}

pub fn on_quiet_period_elapsed(state: &mut EngineState, generation: u64) -> Vec<SyncCommand> {
    if generation != state.quiet_generation {
        log::trace!("[ENGINE] stale debounce fire (gen {}), ignoring", generation);
        return vec![];
    }
    let Some(fingerprint) = state.pending_push.take() else {
        return vec![];
    };
    if !state.remote_configured {
        return vec![];
    }

    let mut cmds = set_status(state, SyncStatus::Syncing);
    cmds.push(SyncCommand::PushRemote {
        fingerprint,
        forced: false,
    });
    cmds
}

pub fn on_push_finished(
    state: &mut EngineState,
    fingerprint: Fingerprint,
    result: Result<(), String>,
) -> Vec<SyncCommand> {
    match result {
        Ok(()) => {
            log::info!("[ENGINE] push ok {:?}", fingerprint);
            state.last_pushed = Some(fingerprint);
            let mut cmds = flash_status(state, SyncStatus::Success);
            cmds.push(SyncCommand::Report(SyncNotice::Pushed));
            cmds
        }
        Err(e) => {
            // No retry here: the next mutation or a manual push is the retry.
            log::warn!("[ENGINE] push failed: {}", e);
            let mut cmds = flash_status(state, SyncStatus::Error);
            cmds.push(SyncCommand::Report(SyncNotice::PushFailed(e)));
            cmds
        }
    }
}

pub fn on_pull_finished(
    state: &mut EngineState,
    purpose: PullPurpose,
    result: Result<Option<RemoteSnapshot>, String>,
) -> Vec<SyncCommand> {
    match (purpose, result) {
        (_, Err(e)) => {
            log::warn!("[ENGINE] pull ({:?}) failed, keeping local state: {}", purpose, e);
            let mut cmds = flash_status(state, SyncStatus::Error);
            cmds.push(SyncCommand::Report(SyncNotice::PullFailed(e)));
            cmds
        }

        (PullPurpose::Load, Ok(None)) => {
            log::info!("[ENGINE] no remote document, keeping local state");
            let mut cmds = set_status(state, SyncStatus::Idle);
            cmds.push(SyncCommand::Report(SyncNotice::Loaded { replaced: false }));
            cmds
        }

        // Remote wins on load, whatever local holds.
        (PullPurpose::Load, Ok(Some(snapshot))) => {
            log::info!(
                "[ENGINE] remote document replaces local ({} clients, {} tours)",
                snapshot.document.clients.len(),
                snapshot.document.tours.len()
            );
            let mut cmds = adopt(state, snapshot);
            cmds.extend(flash_status(state, SyncStatus::Success));
            cmds.push(SyncCommand::Report(SyncNotice::Loaded { replaced: true }));
            cmds
        }

        (PullPurpose::Restore, Ok(None)) => nothing_to_restore(state),
        (PullPurpose::Restore, Ok(Some(snapshot))) if snapshot.document.is_empty() => {
            nothing_to_restore(state)
        }

        (PullPurpose::Restore, Ok(Some(snapshot))) => {
            let clients = snapshot.document.clients.len();
            let tours = snapshot.document.tours.len();
            log::info!("[ENGINE] restored {} clients, {} tours", clients, tours);
            let mut cmds = adopt(state, snapshot);
            cmds.extend(flash_status(state, SyncStatus::Success));
            cmds.push(SyncCommand::Report(SyncNotice::Restored { clients, tours }));
            cmds
        }
    }
}

pub fn on_force_push(state: &mut EngineState, fingerprint: Fingerprint) -> Vec<SyncCommand> {
    if !state.remote_configured {
        return vec![SyncCommand::Report(SyncNotice::RemoteNotConfigured)];
    }

    let mut cmds = cancel_pending(state);
    cmds.extend(set_status(state, SyncStatus::Syncing));
    cmds.push(SyncCommand::PushRemote {
        fingerprint,
        forced: true,
    });
    cmds
}

pub fn on_force_pull(state: &mut EngineState, confirmed: bool) -> Vec<SyncCommand> {
    if !confirmed {
        return vec![SyncCommand::Report(SyncNotice::Declined)];
    }
    if !state.remote_configured {
        return vec![SyncCommand::Report(SyncNotice::RemoteNotConfigured)];
    }
    begin_pull(state, PullPurpose::Restore)
}

pub fn on_status_window_elapsed(state: &mut EngineState, generation: u64) -> Vec<SyncCommand> {
    if generation != state.status_generation {
        return vec![];
    }
    match state.status {
        SyncStatus::Success | SyncStatus::Error => set_status(state, SyncStatus::Idle),
        _ => vec![],
    }
}

pub fn on_local_wiped(state: &mut EngineState) -> Vec<SyncCommand> {
    log::info!("[ENGINE] local data wiped, dropping pending push");
    cancel_pending(state)
}

pub fn on_disposed(state: &mut EngineState) -> Vec<SyncCommand> {
    state.lifecycle = Lifecycle::Disposed;
    state.pending_push = None;
    vec![SyncCommand::CancelQuietTimer, SyncCommand::CancelStatusTimer]
}

// ================================
// Helpers
// ================================

fn begin_pull(state: &mut EngineState, purpose: PullPurpose) -> Vec<SyncCommand> {
    let mut cmds = set_status(state, SyncStatus::Syncing);
    cmds.push(SyncCommand::PullRemote(purpose));
    cmds
}

/// Takes the pulled document as the new local state. A pending push of the
/// old state would overwrite what was just pulled, so it is dropped.
fn adopt(state: &mut EngineState, snapshot: RemoteSnapshot) -> Vec<SyncCommand> {
    let mut cmds = cancel_pending(state);
    state.last_pushed = Some(snapshot.fingerprint);
    cmds.push(SyncCommand::ReplaceDocument(snapshot.document));
    cmds
}

fn nothing_to_restore(state: &mut EngineState) -> Vec<SyncCommand> {
    log::info!("[ENGINE] remote is empty, nothing to restore");
    let mut cmds = set_status(state, SyncStatus::Idle);
    cmds.push(SyncCommand::Report(SyncNotice::NothingToRestore));
    cmds
}

fn cancel_pending(state: &mut EngineState) -> Vec<SyncCommand> {
    if state.pending_push.take().is_some() {
        state.quiet_generation += 1;
        vec![SyncCommand::CancelQuietTimer]
    } else {
        vec![]
    }
}

fn set_status(state: &mut EngineState, status: SyncStatus) -> Vec<SyncCommand> {
    state.status = status;
    // Any pending revert belongs to the previous status.
    state.status_generation += 1;
    vec![SyncCommand::CancelStatusTimer, SyncCommand::SetStatus(status)]
}

/// Sets a transient status that reverts to idle after the display window.
fn flash_status(state: &mut EngineState, status: SyncStatus) -> Vec<SyncCommand> {
    let mut cmds = set_status(state, status);
    cmds.push(SyncCommand::ArmStatusTimer {
        generation: state.status_generation,
        after: state.status_window,
    });
    cmds
}
