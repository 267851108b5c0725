use anyhow::{bail, Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::model::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub coords: Coordinate,
    /// Reported accuracy radius in meters, when the source gives one.
    pub accuracy: Option<f64>,
}

/// What a position source reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionEvent {
    Fix(PositionFix),
    /// Source lost its fix or was denied. Not fatal: the last position is
    /// discarded and planning from the live position becomes unavailable.
    Unavailable,
}

/// Parses one `lat,lng[,accuracy]` line. `-` or `unavailable` reports a lost fix.
pub fn parse_position_line(line: &str) -> Result<PositionEvent> {
    let line = line.trim();
    if line == "-" || line.eq_ignore_ascii_case("unavailable") {
        return Ok(PositionEvent::Unavailable);
    }

    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 2 || parts.len() > 3 {
        bail!("[GPS] expected `lat,lng[,accuracy]`, got {:?}", line);
    }

    let lat: f64 = parts[0].parse().with_context(|| format!("[GPS] bad latitude {:?}", parts[0]))?;
    let lng: f64 = parts[1].parse().with_context(|| format!("[GPS] bad longitude {:?}", parts[1]))?;
    let accuracy = match parts.get(2) {
        Some(raw) => Some(
            raw.parse::<f64>()
                .with_context(|| format!("[GPS] bad accuracy {:?}", raw))?,
        ),
        None => None,
    };

    Ok(PositionEvent::Fix(PositionFix {
        coords: Coordinate::new(lat, lng),
        accuracy,
    }))
}

/// Subscription to a position source. Keeps the latest fix in a `watch`
/// channel so readers always see the most recent value.
pub struct PositionFeed {
    latest: watch::Receiver<Option<PositionFix>>,
    handle: Option<JoinHandle<()>>,
}

impl PositionFeed {
    /// Spawns the task that drains `source`. The feed ends when the source
    /// closes or on [`stop`](Self::stop).
    pub fn spawn(mut source: mpsc::Receiver<PositionEvent>) -> Self {
        let (tx, latest) = watch::channel(None);

        let handle = tokio::spawn(async move {
            while let Some(event) = source.recv().await {
                match event {
                    PositionEvent::Fix(fix) => {
                        log::trace!(
                            "[GPS] fix {:.6},{:.6} (±{:?} m)",
                            fix.coords.lat,
                            fix.coords.lng,
                            fix.accuracy
                        );
                        tx.send_replace(Some(fix));
                    }
                    PositionEvent::Unavailable => {
                        log::warn!("[GPS] position unavailable");
                        tx.send_replace(None);
                    }
                }
            }
            log::debug!("[GPS] position source closed");
        });

        Self {
            latest,
            handle: Some(handle),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PositionFix>> {
        self.latest.clone()
    }

    pub fn current(&self) -> Option<PositionFix> {
        *self.latest.borrow()
    }

    /// Unsubscribes from the source. The last published value stays readable.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for PositionFeed {
    fn drop(&mut self) {
        self.stop();
    }
}
