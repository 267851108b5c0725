//! Local-first client roster with debounced remote sync, tour planning and
//! proximity alerts.

pub mod agenda;
pub mod config;
pub mod error;
pub mod geo;
pub mod model;
pub mod persistence;
pub mod planner;
pub mod proximity;
pub mod sync;

pub use error::ValidationError;
pub use model::{Client, Coordinate, Document, RouteStop, Tour, TourStatus};
pub use sync::{Confirmation, SyncOrchestrator, SyncStatus};
