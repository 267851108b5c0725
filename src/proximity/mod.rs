//! Live position tracking and nearby-client notifications.

pub mod position;
pub mod watcher;


pub use position::{parse_position_line, PositionEvent, PositionFeed, PositionFix};
pub use watcher::{nearby_client, Notification, ProximityConfig, ProximityWatcher};
