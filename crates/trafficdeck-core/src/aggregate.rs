// ── Derived statistics ──
//
// Pure functions over counts or snapshots. Nothing here touches the
// backend.

use serde::Serialize;

use crate::fallback::PLACEHOLDER_CONGESTION_LABEL;
use crate::model::{Alert, AlertCategory, AlertStatus, Intersection, OnlineStatus, TrafficStats};

/// Congestion index reported for live stats.
///
/// The backend cannot aggregate congestion yet, so this is a fixed
/// design-time value rather than a computed one. Replace it only once an
/// upstream aggregation exists.
pub const PLACEHOLDER_CONGESTION_INDEX: u32 = 65;

/// Online share strictly above which the network counts as healthy.
pub const HEALTHY_ONLINE_SHARE: f64 = 0.9;

/// The four counts the stats snapshot is composed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsCounts {
    pub total_intersections: u64,
    pub online_intersections: u64,
    pub pending_alerts: u64,
    /// Emergency-category alerts with `pending` status.
    pub pending_emergencies: u64,
}

pub struct StatsAggregator;

impl StatsAggregator {
    /// `round(online / total * 100)`, or 0 when there are no intersections.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn online_rate(online: u64, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (online as f64 / total as f64 * 100.0).round()
    }

    /// `Normal` iff online / max(total, 1) > 0.9.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn online_status(online: u64, total: u64) -> OnlineStatus {
        let share = online as f64 / total.max(1) as f64;
        if share > HEALTHY_ONLINE_SHARE {
            OnlineStatus::Normal
        } else {
            OnlineStatus::Warning
        }
    }

    pub fn aggregate(counts: StatsCounts) -> TrafficStats {
        let StatsCounts {
            total_intersections,
            online_intersections,
            pending_alerts,
            pending_emergencies,
        } = counts;

        TrafficStats {
            online_rate: Self::online_rate(online_intersections, total_intersections),
            online_status: Self::online_status(online_intersections, total_intersections),
            congestion_index: PLACEHOLDER_CONGESTION_INDEX,
            congestion_label: PLACEHOLDER_CONGESTION_LABEL.into(),
            pending_alerts,
            emergency_requests: pending_emergencies,
            total_intersections,
        }
    }

    /// Same counters derived from in-memory snapshots.
    pub fn from_snapshots(intersections: &[Intersection], alerts: &[Alert]) -> TrafficStats {
        let pending = alerts.iter().filter(|a| a.status == AlertStatus::Pending);
        Self::aggregate(StatsCounts {
            total_intersections: count(intersections.iter()),
            online_intersections: count(intersections.iter().filter(|i| i.status.is_online())),
            pending_alerts: count(pending.clone()),
            pending_emergencies: count(pending.filter(|a| a.category == AlertCategory::Emergency)),
        })
    }
}

fn count<I: Iterator>(iter: I) -> u64 {
    u64::try_from(iter.count()).unwrap_or(u64::MAX)
}

// ── Alert tally ─────────────────────────────────────────────────────

/// Header counters of the alerts list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertTally {
    /// Pending or processing.
    pub open: usize,
    pub resolved: usize,
}

impl AlertTally {
    pub fn from_snapshot(alerts: &[Alert]) -> Self {
        let open = alerts.iter().filter(|a| a.status.is_open()).count();
        Self {
            open,
            resolved: alerts.len() - open,
        }
    }
}

// ── Monitor summary ─────────────────────────────────────────────────

/// Figures shown above the monitor list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorSummary {
    pub total: usize,
    pub online: usize,
    /// Mean speed in km/h, rounded; 0 for an empty snapshot.
    pub average_speed: u32,
    /// Intersections in warning status or with heavy/severe congestion.
    pub abnormal: Vec<Intersection>,
}

impl MonitorSummary {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::as_conversions
    )]
    pub fn from_snapshot(intersections: &[Intersection]) -> Self {
        let average_speed = if intersections.is_empty() {
            0
        } else {
            let sum: f64 = intersections.iter().map(|i| i.avg_speed).sum();
            (sum / intersections.len() as f64).round().max(0.0) as u32
        };
        Self {
            total: intersections.len(),
            online: intersections.iter().filter(|i| i.status.is_online()).count(),
            average_speed,
            abnormal: intersections
                .iter()
                .filter(|i| i.is_abnormal())
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fallback::demo_alerts;
    use crate::model::{CongestionLevel, IntersectionStatus};
    use crate::testing::intersection;

    #[test]
    fn zero_total_never_divides() {
        assert!(StatsAggregator::online_rate(0, 0).abs() < f64::EPSILON);
        assert_eq!(StatsAggregator::online_status(0, 0), OnlineStatus::Warning);
        // online > 0 with total 0 cannot come from the backend, but must not panic.
        assert_eq!(StatsAggregator::online_status(1, 0), OnlineStatus::Normal);
    }

    #[test]
    fn online_rate_rounds_to_whole_percent() {
        assert!((StatsAggregator::online_rate(2, 3) - 67.0).abs() < f64::EPSILON);
        assert!((StatsAggregator::online_rate(127, 128) - 99.0).abs() < f64::EPSILON);
    }

    #[test]
    fn status_threshold_is_strictly_above_ninety_percent() {
        assert_eq!(StatsAggregator::online_status(9, 10), OnlineStatus::Warning);
        assert_eq!(StatsAggregator::online_status(91, 100), OnlineStatus::Normal);
        assert_eq!(StatsAggregator::online_status(10, 10), OnlineStatus::Normal);
        // 90.4% rounds to 90 for display but is still above the threshold.
        assert_eq!(StatsAggregator::online_status(904, 1000), OnlineStatus::Normal);
    }

    #[test]
    fn aggregate_carries_placeholder_congestion() {
        let stats = StatsAggregator::aggregate(StatsCounts {
            total_intersections: 128,
            online_intersections: 126,
            pending_alerts: 3,
            pending_emergencies: 1,
        });
        assert_eq!(stats.congestion_index, PLACEHOLDER_CONGESTION_INDEX);
        assert_eq!(stats.congestion_label, PLACEHOLDER_CONGESTION_LABEL);
        assert_eq!(stats.online_status, OnlineStatus::Normal);
        assert!((stats.online_rate - 98.0).abs() < f64::EPSILON);
    }

    #[test]
    fn snapshots_give_same_counts_as_backend() {
        let intersections = vec![
            intersection("A", IntersectionStatus::Online, 30.0),
            intersection("B", IntersectionStatus::Offline, 0.0),
        ];
        let stats = StatsAggregator::from_snapshots(&intersections, &demo_alerts());
        assert_eq!(stats.total_intersections, 2);
        assert!((stats.online_rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(stats.pending_alerts, 2);
        assert_eq!(stats.emergency_requests, 0);
    }

    #[test]
    fn tally_splits_open_and_resolved() {
        let tally = AlertTally::from_snapshot(&demo_alerts());
        assert_eq!(tally, AlertTally { open: 3, resolved: 3 });
        assert_eq!(AlertTally::from_snapshot(&[]), AlertTally::default());
    }

    #[test]
    fn monitor_summary_flags_abnormal_intersections() {
        let mut jammed = intersection("C", IntersectionStatus::Online, 9.0);
        jammed.congestion = CongestionLevel::Severe;
        let snapshot = vec![
            intersection("A", IntersectionStatus::Online, 30.0),
            intersection("B", IntersectionStatus::Warning, 25.0),
            jammed,
        ];

        let summary = MonitorSummary::from_snapshot(&snapshot);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.online, 2);
        assert_eq!(summary.average_speed, 21);
        let abnormal: Vec<_> = summary.abnormal.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(abnormal, ["B", "C"]);
    }

    #[test]
    fn empty_monitor_summary() {
        let summary = MonitorSummary::from_snapshot(&[]);
        assert_eq!(summary.average_speed, 0);
        assert!(summary.abnormal.is_empty());
    }
}
