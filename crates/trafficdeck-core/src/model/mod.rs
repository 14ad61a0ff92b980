// ── Domain model ──
//
// Canonical types the stores publish. Built from backend rows by
// `convert`, or taken from the bundled fallback dataset.

pub mod alert;
pub mod intersection;
pub mod stats;

pub use alert::{Alert, AlertCategory, AlertFilter, AlertStatus};
pub use intersection::{CongestionLevel, Intersection, IntersectionStatus};
pub use stats::{OnlineStatus, TrafficStats};

use serde::{Deserialize, Serialize};
use strum::Display;

/// A category of record synchronized independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Intersection,
    Alert,
    TrafficStats,
}
