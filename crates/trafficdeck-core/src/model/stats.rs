// ── Aggregate statistics ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Share of online intersections relative to the 90% threshold.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OnlineStatus {
    Normal,
    Warning,
}

/// Derived dashboard counters. Never persisted; recomputed on refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficStats {
    /// Percentage of intersections online, 0–100.
    pub online_rate: f64,
    pub online_status: OnlineStatus,
    /// Placeholder until the backend can aggregate congestion.
    pub congestion_index: u32,
    pub congestion_label: String,
    pub pending_alerts: u64,
    /// Emergency-category alerts still pending.
    pub emergency_requests: u64,
    pub total_intersections: u64,
}
