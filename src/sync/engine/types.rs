use std::time::Duration;

use crate::model::Document;
use crate::sync::fingerprint::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Success,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullPurpose {
    /// Startup (or late remote configuration): remote wins unconditionally.
    Load,
    /// User-confirmed restore from the remote copy.
    Restore,
}

/// A pulled remote document together with its fingerprint.
#[derive(Debug, Clone)]
pub struct RemoteSnapshot {
    pub document: Document,
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Local state has been read; pull if a remote is configured.
    Started { remote_configured: bool },
    RemoteAttached,
    RemoteDetached,
    /// The document changed and was already written to the local store.
    Mutated { fingerprint: Fingerprint },
    QuietPeriodElapsed { generation: u64 },
    PushFinished {
        fingerprint: Fingerprint,
        result: Result<(), String>,
    },
    PullFinished {
        purpose: PullPurpose,
        result: Result<Option<RemoteSnapshot>, String>,
    },
    ForcePush { fingerprint: Fingerprint },
    ForcePull { confirmed: bool },
    StatusWindowElapsed { generation: u64 },
    /// Local data was erased by the user; nothing local may be pushed.
    LocalWiped,
    Disposed,
}

impl SyncEvent {
    /// Variant name, for logs that must not dump whole documents.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncEvent::Started { .. } => "Started",
            SyncEvent::RemoteAttached => "RemoteAttached",
            SyncEvent::RemoteDetached => "RemoteDetached",
            SyncEvent::Mutated { .. } => "Mutated",
            SyncEvent::QuietPeriodElapsed { .. } => "QuietPeriodElapsed",
            SyncEvent::PushFinished { .. } => "PushFinished",
            SyncEvent::PullFinished { .. } => "PullFinished",
            SyncEvent::ForcePush { .. } => "ForcePush",
            SyncEvent::ForcePull { .. } => "ForcePull",
            SyncEvent::StatusWindowElapsed { .. } => "StatusWindowElapsed",
            SyncEvent::LocalWiped => "LocalWiped",
            SyncEvent::Disposed => "Disposed",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SyncCommand {
    PullRemote(PullPurpose),
    /// Push the current document; `fingerprint` identifies its content.
    PushRemote { fingerprint: Fingerprint, forced: bool },
    /// Cancel-and-replace the pending push timer.
    ArmQuietTimer { generation: u64, after: Duration },
    CancelQuietTimer,
    ArmStatusTimer { generation: u64, after: Duration },
    CancelStatusTimer,
    /// Replace the in-memory document wholesale and persist it locally.
    ReplaceDocument(Document),
    SetStatus(SyncStatus),
    Report(SyncNotice),
}

/// Outcomes surfaced to the caller that triggered them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    Pushed,
    PushFailed(String),
    /// Startup pull finished; `replaced` tells whether remote overwrote local.
    Loaded { replaced: bool },
    Restored { clients: usize, tours: usize },
    NothingToRestore,
    PullFailed(String),
    RemoteNotConfigured,
    Declined,
}
