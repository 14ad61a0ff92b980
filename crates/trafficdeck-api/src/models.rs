// Raw row shapes as the backend serves them.
//
// Column names follow the backend's snake_case convention; nullable columns
// are `Option`. `trafficdeck-core` translates these into domain types.

use serde::{Deserialize, Deserializer, Serialize};

/// Table holding intersection rows.
pub const INTERSECTIONS_TABLE: &str = "intersections";
/// Table holding alert rows.
pub const ALERTS_TABLE: &str = "alerts";

/// A row from the `intersections` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub traffic_flow: Option<f64>,
    #[serde(default)]
    pub avg_speed: Option<f64>,
    #[serde(default)]
    pub congestion_level: Option<String>,
    #[serde(default)]
    pub signal_phase: Option<String>,
    #[serde(default)]
    pub count_down: Option<i64>,
}

/// A row from the `alerts` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Alert category (`accident`, `congestion`, `device`, `emergency`).
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Display label pre-formatted by the backend (e.g. "2分钟前").
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    pub status: String,
}

/// Accept identifiers stored either as text or as integer columns.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn intersection_row_tolerates_nulls() {
        let json = r#"{
            "id": "INT-007",
            "name": "Jiefang Rd / Wuyi Ave",
            "status": "warning",
            "traffic_flow": 210,
            "avg_speed": null,
            "congestion_level": "heavy",
            "signal_phase": null,
            "count_down": 12
        }"#;
        let row: IntersectionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(row.id, "INT-007");
        assert_eq!(row.traffic_flow, Some(210.0));
        assert!(row.avg_speed.is_none());
        assert!(row.signal_phase.is_none());
        assert_eq!(row.count_down, Some(12));
    }

    #[test]
    fn alert_row_maps_type_column_and_numeric_id() {
        let json = r#"{
            "id": 42,
            "type": "emergency",
            "title": "Ambulance priority request",
            "status": "pending",
            "created_at": "2026-10-17T08:00:00Z"
        }"#;
        let row: AlertRecord = serde_json::from_str(json).unwrap();
        assert_eq!(row.id, "42");
        assert_eq!(row.kind, "emergency");
        assert!(row.time.is_none());
        assert_eq!(row.created_at.as_deref(), Some("2026-10-17T08:00:00Z"));
    }
}
