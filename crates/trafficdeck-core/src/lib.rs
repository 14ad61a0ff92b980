//! trafficdeck-core: data synchronization and view navigation for the
//! traffic-operations dashboard.
//!
//! Sits between `trafficdeck-api` and presentation code. Stores fetch
//! through a [`CollectionSource`], fall back to bundled data when the
//! backend is unreachable, and publish immutable snapshots. The
//! [`NavigationController`] owns the view state machine, and the
//! [`Dashboard`] facade mounts the stores each view needs.

pub mod aggregate;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod fallback;
pub mod model;
pub mod navigation;
pub mod source;
pub mod store;
pub mod stream;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use aggregate::{AlertTally, MonitorSummary, StatsAggregator, StatsCounts};
pub use config::{BackendConfig, TlsVerification};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use navigation::{NavTab, NavigationController, NavigationState, ViewId};
pub use source::{BackendSource, ChangeFeed, CollectionSource, DashboardSource, Entity, Filters};
pub use store::{AlertStore, EntitySyncStore, IntersectionStore, StatsStore, Subscription, SyncSnapshot};
pub use stream::SnapshotStream;

pub use model::{
    Alert, AlertCategory, AlertFilter, AlertStatus, CongestionLevel, EntityKind, Intersection,
    IntersectionStatus, OnlineStatus, TrafficStats,
};
