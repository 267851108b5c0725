//! Tour planning.
//!
//! Orders a selection of clients into a visiting sequence with a greedy
//! nearest-neighbor walk: from the current position, always go to the closest
//! remaining client. No backtracking and no improvement pass; daily routes are
//! tens of stops, not hundreds.

pub mod handoff;


pub use handoff::RouteHandoff;

use crate::error::ValidationError;
use crate::geo::distance_km;
use crate::model::roster::new_id;
use crate::model::{Client, Coordinate, Document, RouteStop, Tour, TourStatus};

/// Scheduled time given to every generated stop until the user edits it.
pub const PLACEHOLDER_TIME: &str = "09:00";

/// Where the route begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPoint {
    /// The device's current position.
    LivePosition,
    /// A client's stored coordinates.
    Client(String),
}

/// Greedy nearest-neighbor order over `candidates`, starting at `start`.
///
/// The closest remaining candidate is taken at each step. On equal distances
/// the one appearing first in the input wins. Runs exactly one step per
/// candidate, O(n²) overall.
pub fn build_itinerary<'a>(
    candidates: impl IntoIterator<Item = &'a Client>,
    start: Coordinate,
) -> Vec<RouteStop> {
    let mut remaining: Vec<&Client> = candidates.into_iter().collect();
    let mut route = Vec::with_capacity(remaining.len());
    let mut current = start;

    while !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_dist = f64::INFINITY;

        for (i, client) in remaining.iter().enumerate() {
            let d = distance_km(current, client.coords);
            if d < best_dist {
                best_dist = d;
                best_idx = i;
            }
        }

        // `remove`, not `swap_remove`: the tie-break depends on input order.
        let next = remaining.remove(best_idx);
        log::trace!(
            "[PLANNER] stop {} -> {} ({:.3} km)",
            route.len() + 1,
            next.company_name,
            best_dist
        );
        route.push(RouteStop {
            client_id: next.id.clone(),
            time: PLACEHOLDER_TIME.to_string(),
        });
        current = next.coords;
    }

    route
}

/// Coordinate the route starts from.
pub fn resolve_start(
    start: &StartPoint,
    live: Option<Coordinate>,
    doc: &Document,
) -> Result<Coordinate, ValidationError> {
    match start {
        StartPoint::LivePosition => live.ok_or(ValidationError::NoLivePosition),
        StartPoint::Client(id) => doc
            .find_client(id)
            .map(|c| c.coords)
            .ok_or_else(|| ValidationError::UnknownStartClient(id.clone())),
    }
}

/// Builds a `planned` tour for `date` over the selected client ids.
///
/// Duplicate ids are visited once. Ids no longer in the roster are skipped.
/// The returned tour is not stored; pass it to `Document::save_tour`.
pub fn plan_tour(
    doc: &Document,
    selection: &[String],
    start: &StartPoint,
    live: Option<Coordinate>,
    date: &str,
) -> Result<Tour, ValidationError> {
    if selection.is_empty() {
        return Err(ValidationError::EmptySelection);
    }
    let origin = resolve_start(start, live, doc)?;

    let mut seen = Vec::with_capacity(selection.len());
    let mut candidates = Vec::with_capacity(selection.len());
    for id in selection {
        if seen.contains(&id) {
            continue;
        }
        seen.push(id);
        match doc.find_client(id) {
            Some(client) => candidates.push(client),
            None => log::warn!("[PLANNER] selected client {} no longer exists, skipping", id),
        }
    }
    if candidates.is_empty() {
        return Err(ValidationError::EmptySelection);
    }

    let stops = build_itinerary(candidates, origin);
    log::info!("[PLANNER] planned {} stops for {}", stops.len(), date);

    Ok(Tour {
        id: new_id(),
        name: format!("Tour {}", date),
        date: date.to_string(),
        stops,
        status: TourStatus::Planned,
    })
}

/// Total driving-distance estimate along the stops, as the crow flies.
/// Dangling stops are skipped.
pub fn route_length_km(doc: &Document, start: Option<Coordinate>, stops: &[RouteStop]) -> f64 {
    let mut points = start.into_iter().chain(
        stops
            .iter()
            .filter_map(|s| doc.find_client(&s.client_id))
            .map(|c| c.coords),
    );

    let Some(mut prev) = points.next() else {
        return 0.0;
    };
    let mut total = 0.0;
    for p in points {
        total += distance_km(prev, p);
        prev = p;
    }
    total
}
