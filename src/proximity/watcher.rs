use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

use crate::geo::distance_km;
use crate::model::{Client, Coordinate, Document};
use crate::proximity::position::PositionFix;

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);
pub const DEFAULT_RADIUS_KM: f64 = 0.5;
pub const DEFAULT_DISPLAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct ProximityConfig {
    pub period: Duration,
    /// Inclusive.
    pub radius_km: f64,
    /// How long a notification stays up.
    pub display: Duration,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            radius_km: DEFAULT_RADIUS_KM,
            display: DEFAULT_DISPLAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub client_id: String,
    pub company_name: String,
    pub distance_km: f64,
}

impl Notification {
    pub fn text(&self) -> String {
        format!("Nearby client: {}", self.company_name)
    }
}

/// First client in roster order within `radius_km` of `position`.
pub fn nearby_client(
    clients: &[Client],
    position: Coordinate,
    radius_km: f64,
) -> Option<(&Client, f64)> {
    clients
        .iter()
        .map(|c| (c, distance_km(position, c.coords)))
        .find(|(_, d)| *d <= radius_km)
}

/// One evaluation of the roster against a position.
pub fn check(doc: &Document, position: Coordinate, radius_km: f64) -> Option<Notification> {
    nearby_client(&doc.clients, position, radius_km).map(|(c, d)| Notification {
        client_id: c.id.clone(),
        company_name: c.company_name.clone(),
        distance_km: d,
    })
}

/// Background task that checks the latest position against the latest roster
/// once per period.
///
/// Each tick raises at most one notification. The same client re-fires on every
/// tick it stays in range. The current notification is published on
/// [`banner`](Self::banner) and cleared after the display window; a newer one
/// replaces it and restarts the window.
pub struct ProximityWatcher {
    banner: watch::Receiver<Option<Notification>>,
    handle: Option<JoinHandle<()>>,
}

impl ProximityWatcher {
    /// Returns the watcher and a stream of every raised notification.
    pub fn spawn(
        config: ProximityConfig,
        position: watch::Receiver<Option<PositionFix>>,
        roster: watch::Receiver<Arc<Document>>,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (banner_tx, banner) = watch::channel(None);
        let (raised_tx, raised) = mpsc::unbounded_channel();

        let handle = tokio::spawn(run(config, position, roster, banner_tx, raised_tx));

        (
            Self {
                banner,
                handle: Some(handle),
            },
            raised,
        )
    }

    pub fn banner(&self) -> watch::Receiver<Option<Notification>> {
        self.banner.clone()
    }

    pub fn current(&self) -> Option<Notification> {
        self.banner.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the interval and any pending clear.
    pub fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::debug!("[RADAR] stopped");
            handle.abort();
        }
    }
}

impl Drop for ProximityWatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn run(
    config: ProximityConfig,
    position: watch::Receiver<Option<PositionFix>>,
    roster: watch::Receiver<Arc<Document>>,
    banner: watch::Sender<Option<Notification>>,
    raised: mpsc::UnboundedSender<Notification>,
) {
    // First check one full period after start.
    let mut ticker = interval_at(Instant::now() + config.period, config.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut clear_at: Option<Instant> = None;

    log::debug!(
        "[RADAR] started: every {:?}, radius {} km",
        config.period,
        config.radius_km
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Read at fire time, never a copy taken earlier.
                let fix = *position.borrow();
                let Some(fix) = fix else {
                    log::trace!("[RADAR] tick without live position");
                    continue;
                };
                let doc = Arc::clone(&roster.borrow());

                if let Some(hit) = check(&doc, fix.coords, config.radius_km) {
                    log::info!("[RADAR] {} ({:.0} m)", hit.text(), hit.distance_km * 1000.0);
                    banner.send_replace(Some(hit.clone()));
                    if raised.send(hit).is_err() {
                        log::trace!("[RADAR] no notification listener");
                    }
                    clear_at = Some(Instant::now() + config.display);
                }
            }

            _ = sleep_until(clear_at.unwrap_or_else(Instant::now)), if clear_at.is_some() => {
                banner.send_replace(None);
                clear_at = None;
            }
        }
    }
}
