// ── Wire-to-domain conversions ──
//
// Bridges raw `trafficdeck_api` rows into `crate::model` types. Backend
// columns use a flattened snake_case layout (`count_down`, `type`, ...);
// enumerated columns are parsed strictly, and an unknown value rejects the
// whole row so a fetch never yields a half-valid snapshot.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use trafficdeck_api::{AlertRecord, IntersectionRecord};

use crate::error::CoreError;
use crate::model::{Alert, CongestionLevel, Intersection};

// ── Helpers ────────────────────────────────────────────────────────

fn parse_enum<T: FromStr>(raw: &str, column: &str, id: &str) -> Result<T, CoreError> {
    raw.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| CoreError::Deserialization {
            message: format!("row {id}: unknown {column} '{raw}'"),
        })
}

/// Negative, NaN and fractional values are normalised to a non-negative
/// whole number.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn non_negative_u32(raw: Option<f64>) -> u32 {
    match raw {
        Some(v) if v.is_finite() && v > 0.0 => v.round().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

fn non_negative_f64(raw: Option<f64>) -> f64 {
    raw.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

/// Prefer the backend's display label; otherwise render `created_at`.
fn time_label(time: Option<String>, created_at: Option<&str>) -> String {
    if let Some(label) = time.filter(|t| !t.is_empty()) {
        return label;
    }
    let Some(raw) = created_at else {
        return String::new();
    };
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_owned())
}

// ── Intersection ───────────────────────────────────────────────────

impl TryFrom<IntersectionRecord> for Intersection {
    type Error = CoreError;

    fn try_from(row: IntersectionRecord) -> Result<Self, Self::Error> {
        let status = parse_enum(&row.status, "status", &row.id)?;
        let congestion = match row.congestion_level.as_deref() {
            Some(raw) => parse_enum(raw, "congestion_level", &row.id)?,
            None => CongestionLevel::Low,
        };
        let countdown_secs = row
            .count_down
            .map_or(0, |c| u32::try_from(c.max(0)).unwrap_or(u32::MAX));

        Ok(Intersection {
            id: row.id,
            name: row.name,
            status,
            traffic_flow: non_negative_u32(row.traffic_flow),
            avg_speed: non_negative_f64(row.avg_speed),
            congestion,
            signal_phase: row.signal_phase.unwrap_or_default(),
            countdown_secs,
        })
    }
}

// ── Alert ──────────────────────────────────────────────────────────

impl TryFrom<AlertRecord> for Alert {
    type Error = CoreError;

    fn try_from(row: AlertRecord) -> Result<Self, Self::Error> {
        let category = parse_enum(&row.kind, "type", &row.id)?;
        let status = parse_enum(&row.status, "status", &row.id)?;
        let time_label = time_label(row.time, row.created_at.as_deref());

        Ok(Alert {
            id: row.id,
            category,
            title: row.title,
            description: row.description.unwrap_or_default(),
            location: row.location.unwrap_or_default(),
            time_label,
            status,
        })
    }
}
