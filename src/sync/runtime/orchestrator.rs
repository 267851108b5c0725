use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Result};
use tokio::sync::{mpsc, watch};

use crate::error::ValidationError;
use crate::model::Document;
use crate::persistence::{self, LocalStore};
use crate::sync::engine::{
    PullPurpose, RemoteSnapshot, SyncCommand, SyncConfig, SyncEngine, SyncEvent, SyncNotice,
    SyncStatus,
};
use crate::sync::fingerprint::Fingerprint;
use crate::sync::remote::RemoteStore;
use crate::sync::runtime::timer::Timer;

/// Explicit answer to a destructive-action prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(yes: bool) -> Self {
        if yes {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    Restored { clients: usize, tours: usize },
    /// Remote is absent or empty; local state was not touched.
    NothingToRestore,
    Declined,
}

/// **SyncOrchestrator**
///
/// The imperative shell around [`SyncEngine`]. It owns the authoritative
/// document and is the only writer of it:
/// 1. **Apply** foreground mutations, writing the local store synchronously.
/// 2. **Drive** the engine with mutation, timer and remote-result events.
/// 3. **Execute** the engine's commands: remote IO, timers, status updates.
///
/// Everything runs on the caller's task. Remote IO is awaited inline, so the
/// document never changes while a push or pull is in flight.
pub struct SyncOrchestrator<S> {
    engine: SyncEngine,
    store: S,
    remote: Option<Arc<dyn RemoteStore>>,
    document: Document,

    quiet_timer: Timer,
    status_timer: Timer,

    /// Timer fires come back through this channel.
    timer_tx: mpsc::UnboundedSender<SyncEvent>,
    timer_rx: mpsc::UnboundedReceiver<SyncEvent>,

    status_tx: watch::Sender<SyncStatus>,
    /// Latest document, for readers on their own timers.
    snapshot_tx: watch::Sender<Arc<Document>>,

    t0: Instant,
}

impl<S: LocalStore> SyncOrchestrator<S> {
    pub fn new(store: S, config: SyncConfig) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        let (snapshot_tx, _) = watch::channel(Arc::new(Document::default()));

        Self {
            engine: SyncEngine::new(config),
            store,
            remote: None,
            document: Document::default(),
            quiet_timer: Timer::new(),
            status_timer: Timer::new(),
            timer_tx,
            timer_rx,
            status_tx,
            snapshot_tx,
            t0: Instant::now(),
        }
    }

    /// Configure the remote before [`load`](Self::load).
    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    // ================================
    // Lifecycle
    // ================================

    /// Reads the local store, then pulls once if a remote is configured. A
    /// remote document replaces the local one unconditionally.
    pub async fn load(&mut self) -> Result<()> {
        if self.engine.is_started() {
            self.debug("load called twice, ignoring");
            return Ok(());
        }

        self.document = persistence::load_document(&self.store)?;
        self.info(&format!(
            "local state: {} clients, {} tours",
            self.document.clients.len(),
            self.document.tours.len()
        ));
        self.publish();

        let remote_configured = self.remote.is_some();
        self.process(SyncEvent::Started { remote_configured }).await;
        Ok(())
    }

    /// Makes a remote available after startup. Load runs once per distinct
    /// remote. Attaching the adapter already in use, or one with the same
    /// target, changes nothing and keeps any pending push.
    pub async fn attach_remote(&mut self, remote: Arc<dyn RemoteStore>) {
        if let Some(current) = &self.remote {
            let same_target = matches!(
                (current.target(), remote.target()),
                (Some(a), Some(b)) if a == b
            );
            if Arc::ptr_eq(current, &remote) || same_target {
                self.debug(&format!("remote {} already attached", remote.name()));
                return;
            }
            self.process(SyncEvent::RemoteDetached).await;
        }
        self.info(&format!("remote attached: {}", remote.name()));
        self.remote = Some(remote);
        self.process(SyncEvent::RemoteAttached).await;
    }

    pub async fn detach_remote(&mut self) {
        if self.remote.take().is_some() {
            self.info("remote detached");
            self.process(SyncEvent::RemoteDetached).await;
        }
    }

    /// Tears down timers. A pending debounced push is dropped, not flushed.
    pub async fn dispose(&mut self) {
        if self.engine.is_disposed() {
            return;
        }
        self.info("disposing");
        self.process(SyncEvent::Disposed).await;
    }

    // ================================
    // Foreground operations
    // ================================

    /// Runs a roster/tour command against the document. On success the local
    /// store is written before this returns and a remote push is debounced.
    /// A validation error leaves everything untouched.
    pub async fn apply<R>(
        &mut self,
        command: impl FnOnce(&mut Document) -> Result<R, ValidationError>,
    ) -> Result<R> {
        self.ensure_active()?;

        let out = command(&mut self.document)?;
        persistence::save_document(&mut self.store, &self.document)?;
        self.publish();

        if self.engine.remote_configured() {
            match Fingerprint::of(&self.document) {
                Ok(fingerprint) => {
                    self.process(SyncEvent::Mutated { fingerprint }).await;
                }
                Err(e) => log::error!("[SYNC] cannot fingerprint document: {:#}", e),
            }
        }
        Ok(out)
    }

    /// Pushes now, ignoring the debounce and the unchanged-content guard.
    pub async fn force_push(&mut self) -> Result<()> {
        self.ensure_active()?;
        let fingerprint = Fingerprint::of(&self.document)?;
        let notices = self.process(SyncEvent::ForcePush { fingerprint }).await;

        for notice in notices {
            match notice {
                SyncNotice::Pushed => return Ok(()),
                SyncNotice::PushFailed(e) => bail!("[SYNC] push failed: {}", e),
                SyncNotice::RemoteNotConfigured => bail!("[SYNC] no remote store configured"),
                _ => {}
            }
        }
        Err(anyhow!("[SYNC] push finished without an outcome"))
    }

    /// Replaces local state with the remote copy. Destructive, so it requires
    /// an explicit confirmation.
    pub async fn force_pull(&mut self, confirmation: Confirmation) -> Result<PullOutcome> {
        self.ensure_active()?;
        let confirmed = confirmation == Confirmation::Confirmed;
        let notices = self.process(SyncEvent::ForcePull { confirmed }).await;

        for notice in notices {
            match notice {
                SyncNotice::Restored { clients, tours } => {
                    return Ok(PullOutcome::Restored { clients, tours })
                }
                SyncNotice::NothingToRestore => return Ok(PullOutcome::NothingToRestore),
                SyncNotice::Declined => return Ok(PullOutcome::Declined),
                SyncNotice::PullFailed(e) => bail!("[SYNC] pull failed: {}", e),
                SyncNotice::RemoteNotConfigured => bail!("[SYNC] no remote store configured"),
                _ => {}
            }
        }
        Err(anyhow!("[SYNC] pull finished without an outcome"))
    }

    /// Erases all local data. Nothing is pushed as a consequence.
    pub async fn wipe_local(&mut self, confirmation: Confirmation) -> Result<bool> {
        self.ensure_active()?;
        if confirmation != Confirmation::Confirmed {
            return Ok(false);
        }
        persistence::wipe(&mut self.store)?;
        self.document = Document::default();
        self.publish();
        self.process(SyncEvent::LocalWiped).await;
        Ok(true)
    }

    // Until load the in-memory document is not the stored one.
    fn ensure_active(&self) -> Result<()> {
        if self.engine.is_disposed() {
            bail!("[SYNC] session is disposed");
        }
        if !self.engine.is_started() {
            bail!("[SYNC] load() must run first");
        }
        Ok(())
    }

    // ================================
    // Event loop
    // ================================

    /// Waits for the next timer fire and processes it. Returns `false` once
    /// the orchestrator is disposed.
    pub async fn tick(&mut self) -> bool {
        if self.engine.is_disposed() {
            return false;
        }
        match self.timer_rx.recv().await {
            Some(event) => {
                self.process(event).await;
                true
            }
            None => false,
        }
    }

    /// Processes timer fires that are already queued, without waiting.
    pub async fn run_pending(&mut self) -> usize {
        let mut n = 0;
        while let Ok(event) = self.timer_rx.try_recv() {
            self.process(event).await;
            n += 1;
        }
        n
    }

    /// Runs the loop until no debounced push is outstanding.
    pub async fn settle(&mut self) {
        while self.engine.has_pending_push() {
            if !self.tick().await {
                break;
            }
        }
    }

    /// Feeds an event into the engine and executes all resulting commands,
    /// including the follow-up events they produce.
    async fn process(&mut self, event: SyncEvent) -> Vec<SyncNotice> {
        let mut queue = VecDeque::from([event]);
        let mut notices = Vec::new();

        while let Some(ev) = queue.pop_front() {
            self.trace(&format!("engine.handle_event({})", ev.kind()));

            let cmds = self.engine.handle_event(ev);

            for cmd in cmds {
                self.execute_command(cmd, &mut queue, &mut notices).await;
            }
        }

        notices
    }

    async fn execute_command(
        &mut self,
        cmd: SyncCommand,
        queue: &mut VecDeque<SyncEvent>,
        notices: &mut Vec<SyncNotice>,
    ) {
        match cmd {
            SyncCommand::PullRemote(purpose) => {
                let result = self.pull(purpose).await;
                queue.push_back(SyncEvent::PullFinished { purpose, result });
            }

            SyncCommand::PushRemote {
                fingerprint,
                forced,
            } => {
                let result = self.push(fingerprint, forced).await;
                queue.push_back(SyncEvent::PushFinished {
                    fingerprint,
                    result,
                });
            }

            SyncCommand::ArmQuietTimer { generation, after } => {
                self.trace(&format!("debounce {:?} (gen {})", after, generation));
                self.quiet_timer.arm(
                    after,
                    self.timer_tx.clone(),
                    SyncEvent::QuietPeriodElapsed { generation },
                );
            }

            SyncCommand::CancelQuietTimer => self.quiet_timer.cancel(),

            SyncCommand::ArmStatusTimer { generation, after } => {
                self.status_timer.arm(
                    after,
                    self.timer_tx.clone(),
                    SyncEvent::StatusWindowElapsed { generation },
                );
            }

            SyncCommand::CancelStatusTimer => self.status_timer.cancel(),

            SyncCommand::ReplaceDocument(document) => {
                self.document = document;
                if let Err(e) = persistence::save_document(&mut self.store, &self.document) {
                    log::error!("[SYNC] pulled document not saved locally: {:#}", e);
                }
                self.publish();
            }

            SyncCommand::SetStatus(status) => {
                self.debug(&format!("status -> {}", status.as_str()));
                self.status_tx.send_replace(status);
            }

            SyncCommand::Report(notice) => {
                self.debug(&format!("notice: {:?}", notice));
                notices.push(notice);
            }
        }
    }

    /// Any adapter error becomes a plain failure message.
    async fn pull(&self, purpose: PullPurpose) -> Result<Option<RemoteSnapshot>, String> {
        let Some(remote) = self.remote.clone() else {
            return Err("no remote store configured".to_string());
        };
        self.info(&format!("pull from {} ({:?})", remote.name(), purpose));

        match remote.pull().await {
            Ok(Some(document)) => {
                let fingerprint = Fingerprint::of(&document).map_err(|e| format!("{:#}", e))?;
                Ok(Some(RemoteSnapshot {
                    document,
                    fingerprint,
                }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(format!("{:#}", e)),
        }
    }

    async fn push(&self, fingerprint: Fingerprint, forced: bool) -> Result<(), String> {
        let Some(remote) = self.remote.clone() else {
            return Err("no remote store configured".to_string());
        };
        self.info(&format!(
            "push to {} {:?}{}",
            remote.name(),
            fingerprint,
            if forced { " (forced)" } else { "" }
        ));

        remote
            .push(&self.document)
            .await
            .map_err(|e| format!("{:#}", e))
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(Arc::new(self.document.clone()));
    }

    // ================================
    // Accessors
    // ================================

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn status(&self) -> SyncStatus {
        *self.status_tx.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Receiver that always holds the latest committed document.
    pub fn subscribe_document(&self) -> watch::Receiver<Arc<Document>> {
        self.snapshot_tx.subscribe()
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn has_pending_push(&self) -> bool {
        self.engine.has_pending_push()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn t(&self) -> u128 {
        self.t0.elapsed().as_millis()
    }

    fn info(&self, msg: &str) {
        log::info!("[SYNC] {:>8}ms: {}", self.t(), msg);
    }

    fn debug(&self, msg: &str) {
        log::debug!("[SYNC] {:>8}ms: {}", self.t(), msg);
    }

    fn trace(&self, msg: &str) {
        log::trace!("[SYNC] {:>8}ms: {}", self.t(), msg);
    }
}
