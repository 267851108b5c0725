//! Hand-off of a planned tour to an external navigation app: one destination
//! plus the ordered waypoints before it.

use anyhow::Result;
use reqwest::Url;

use crate::model::{Client, Coordinate, Document, Tour};

const DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/";

#[derive(Debug, Clone, PartialEq)]
pub struct RouteHandoff {
    /// `None` lets the navigation app use the device's own position.
    pub origin: Option<String>,
    pub destination: String,
    pub waypoints: Vec<String>,
}

impl RouteHandoff {
    /// Resolves the tour's stops to address strings. Stops whose client is
    /// gone are left out. `None` when no stop resolves.
    pub fn for_tour(doc: &Document, tour: &Tour, origin: Option<Coordinate>) -> Option<Self> {
        let mut places: Vec<String> = tour
            .stops
            .iter()
            .filter_map(|s| doc.find_client(&s.client_id))
            .map(place_of)
            .collect();

        let destination = places.pop()?;
        Some(Self {
            origin: origin.map(coordinate_text),
            destination,
            waypoints: places,
        })
    }

    pub fn directions_url(&self) -> Result<Url> {
        let mut params = vec![("api", "1".to_string())];
        if let Some(origin) = &self.origin {
            params.push(("origin", origin.clone()));
        }
        params.push(("destination", self.destination.clone()));
        if !self.waypoints.is_empty() {
            params.push(("waypoints", self.waypoints.join("|")));
        }
        params.push(("travelmode", "driving".to_string()));

        Ok(Url::parse_with_params(DIRECTIONS_URL, &params)?)
    }
}

/// Postal address when known, otherwise the raw coordinates.
fn place_of(client: &Client) -> String {
    let address = client.address.one_line();
    if address.is_empty() {
        coordinate_text(client.coords)
    } else {
        address
    }
}

fn coordinate_text(c: Coordinate) -> String {
    format!("{:.6},{:.6}", c.lat, c.lng)
}
