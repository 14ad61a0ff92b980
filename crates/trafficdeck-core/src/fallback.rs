// ── Bundled fallback dataset ──
//
// Substituted whenever the backend is unreachable so the dashboard always
// has something to show. Values are design-time data and must stay stable:
// tests and the offline CLI output depend on them.

use crate::model::{
    Alert, AlertCategory, AlertStatus, CongestionLevel, Intersection, IntersectionStatus,
    OnlineStatus, TrafficStats,
};

/// Identifier of the placeholder intersection.
pub const PLACEHOLDER_INTERSECTION_ID: &str = "INT-001";

/// Label shared by the fallback stats and the live congestion placeholder.
pub const PLACEHOLDER_CONGESTION_LABEL: &str = "轻度拥堵";

/// The single record shown when intersections cannot be fetched, or when
/// a requested intersection is not in the current snapshot.
pub fn placeholder_intersection() -> Intersection {
    Intersection {
        id: PLACEHOLDER_INTERSECTION_ID.into(),
        name: "中山路与人民路交叉口".into(),
        status: IntersectionStatus::Online,
        traffic_flow: 156,
        avg_speed: 28.0,
        congestion: CongestionLevel::Moderate,
        signal_phase: "东西方向直行".into(),
        countdown_secs: 18,
    }
}

/// Stats snapshot used when any of the backend counts fails.
pub fn fallback_stats() -> TrafficStats {
    TrafficStats {
        online_rate: 98.5,
        online_status: OnlineStatus::Normal,
        congestion_index: 62,
        congestion_label: PLACEHOLDER_CONGESTION_LABEL.into(),
        pending_alerts: 3,
        emergency_requests: 1,
        total_intersections: 128,
    }
}

/// The six demonstration alerts, in display order.
pub fn demo_alerts() -> Vec<Alert> {
    DEMO_ALERTS
        .iter()
        .map(|&(id, category, title, description, location, time_label, status)| Alert {
            id: id.into(),
            category,
            title: title.into(),
            description: description.into(),
            location: location.into(),
            time_label: time_label.into(),
            status,
        })
        .collect()
}

type DemoAlert = (
    &'static str,
    AlertCategory,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    AlertStatus,
);

const DEMO_ALERTS: [DemoAlert; 6] = [
    (
        "1",
        AlertCategory::Accident,
        "中山路与人民路交叉口发生交通事故",
        "和平路与幸福路交叉口交通事故已处理完毕",
        "中山路与人民路交叉口",
        "2分钟前",
        AlertStatus::Pending,
    ),
    (
        "2",
        AlertCategory::Emergency,
        "救护车优先通行请求已处理",
        "湘A-120XX 请求优先通行",
        "建设路全段",
        "5分钟前",
        AlertStatus::Resolved,
    ),
    (
        "3",
        AlertCategory::Congestion,
        "异常拥堵告警",
        "建国路路段拥堵指数达到85，建议调整信号灯配时",
        "建国路全段",
        "8分钟前",
        AlertStatus::Processing,
    ),
    (
        "4",
        AlertCategory::Device,
        "设备故障告警",
        "语音终端VT-003电量低告警已处理，已更换电池",
        "五一广场路口",
        "15分钟前",
        AlertStatus::Resolved,
    ),
    (
        "5",
        AlertCategory::Device,
        "设备维护完成，系统恢复正常",
        "日常巡检完成",
        "系统",
        "10分钟前",
        AlertStatus::Resolved,
    ),
    (
        "6",
        AlertCategory::Device,
        "信号灯控制箱温度过高",
        "建设路与解放路交叉口控制箱温度超过阈值",
        "建设路与解放路交叉口",
        "1分钟前",
        AlertStatus::Pending,
    ),
];
