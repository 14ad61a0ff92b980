// ── Alert domain types ──

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::CoreError;

/// Selection value meaning "no constraint".
pub const ALL: &str = "all";

/// What kind of incident raised the alert.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertCategory {
    Accident,
    Congestion,
    Device,
    Emergency,
}

/// Handling state of an alert.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertStatus {
    Pending,
    Processing,
    Resolved,
}

impl AlertStatus {
    /// Pending and processing alerts both still need attention.
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Resolved)
    }
}

/// One operator-facing alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub category: AlertCategory,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Backend-formatted time label, displayed as-is.
    pub time_label: String,
    pub status: AlertStatus,
}

// ── AlertFilter ─────────────────────────────────────────────────────

/// Status/category selection for the alerts list. `None` means "all".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub category: Option<AlertCategory>,
}

impl AlertFilter {
    pub fn new(status: Option<AlertStatus>, category: Option<AlertCategory>) -> Self {
        Self { status, category }
    }

    /// No constraint on either field.
    pub fn all() -> Self {
        Self::default()
    }

    /// Pending alerts of any category (home "pending" shortcut).
    pub fn pending() -> Self {
        Self::new(Some(AlertStatus::Pending), None)
    }

    /// Emergency alerts of any status (home "emergency" shortcut).
    pub fn emergencies() -> Self {
        Self::new(None, Some(AlertCategory::Emergency))
    }

    /// Parse raw selections as supplied by the presentation layer
    /// (`"all"` or an enumerated value).
    pub fn from_selection(status: &str, category: &str) -> Result<Self, CoreError> {
        Ok(Self {
            status: parse_selection(status, "status")?,
            category: parse_selection(category, "category")?,
        })
    }

    pub fn is_all(&self) -> bool {
        self.status.is_none() && self.category.is_none()
    }

    /// Exact match on status and on category; `None` matches anything.
    pub fn matches(&self, alert: &Alert) -> bool {
        self.status.is_none_or(|s| alert.status == s)
            && self.category.is_none_or(|c| alert.category == c)
    }

    /// Apply locally, preserving input order.
    pub fn apply(&self, alerts: &[Alert]) -> Vec<Alert> {
        alerts.iter().filter(|a| self.matches(a)).cloned().collect()
    }

    /// Selection strings for display (`"all"` when unset).
    pub fn status_label(&self) -> &'static str {
        self.status.map_or(ALL, Into::into)
    }

    pub fn category_label(&self) -> &'static str {
        self.category.map_or(ALL, Into::into)
    }
}

fn parse_selection<T: FromStr>(raw: &str, field: &str) -> Result<Option<T>, CoreError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case(ALL) {
        return Ok(None);
    }
    raw.to_ascii_lowercase()
        .parse()
        .map(Some)
        .map_err(|_| CoreError::Config {
            message: format!("unknown alert {field} '{raw}'"),
        })
}
