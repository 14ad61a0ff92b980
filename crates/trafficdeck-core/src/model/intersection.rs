// ── Intersection domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Operational status reported by the intersection controller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IntersectionStatus {
    Online,
    Offline,
    Warning,
}

impl IntersectionStatus {
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

/// Congestion level at the intersection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CongestionLevel {
    Low,
    Moderate,
    Heavy,
    Severe,
}

impl CongestionLevel {
    /// Heavy and severe congestion both flag an intersection as abnormal.
    pub fn is_congested(self) -> bool {
        matches!(self, Self::Heavy | Self::Severe)
    }
}

/// One signalized intersection, as last fetched.
///
/// Immutable snapshot: a refresh replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    /// Stable external identifier (e.g. `INT-001`).
    pub id: String,
    pub name: String,
    pub status: IntersectionStatus,
    /// Vehicles per hour.
    pub traffic_flow: u32,
    /// Average speed in km/h.
    pub avg_speed: f64,
    pub congestion: CongestionLevel,
    /// Label of the active signal phase.
    pub signal_phase: String,
    /// Seconds until the next phase.
    pub countdown_secs: u32,
}

impl Intersection {
    /// Warning status or heavy/severe congestion.
    pub fn is_abnormal(&self) -> bool {
        self.status == IntersectionStatus::Warning || self.congestion.is_congested()
    }
}
