//! Client roster and tour records.

pub mod roster;
pub mod types;

#[cfg(test)]
mod tests;

pub use roster::{ClientDraft, OpeningBalance, UNKNOWN_CLIENT};
pub use types::{
    Address, Client, ClientEvent, ClientEventKind, Coordinate, Document, RouteStop, Tour,
    TourStatus, Transaction, TransactionKind,
};
