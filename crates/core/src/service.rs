//! Catalogue of edge services that generate tasks.
//!
//! Each service kind fixes the class, processing demand, payload size,
//! relative deadline and relative arrival weight of the tasks it produces.

use serde::{Deserialize, Serialize};

use crate::task::{SimTime, TaskClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    LaneGuidance,
    NavigationRerouting,
    ParkingDiscovery,
    EvChargerBooking,
    TollingCharging,
    EmergencySos,
    IncidentUpload,
    CollisionAlert,
    SpeedLimitAr,
    RoadHazardBroadcast,
    DrowsinessAlert,
    SurroundView,
    SchoolZoneAdvisory,
    WeatherAwareRouting,
    TripSummaryAnalytics,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 15] = [
        ServiceKind::LaneGuidance,
        ServiceKind::NavigationRerouting,
        ServiceKind::ParkingDiscovery,
        ServiceKind::EvChargerBooking,
        ServiceKind::TollingCharging,
        ServiceKind::EmergencySos,
        ServiceKind::IncidentUpload,
        ServiceKind::CollisionAlert,
        ServiceKind::SpeedLimitAr,
        ServiceKind::RoadHazardBroadcast,
        ServiceKind::DrowsinessAlert,
        ServiceKind::SurroundView,
        ServiceKind::SchoolZoneAdvisory,
        ServiceKind::WeatherAwareRouting,
        ServiceKind::TripSummaryAnalytics,
    ];

    /// Service class this kind is scheduled under.
    pub fn class(self) -> TaskClass {
        use ServiceKind::*;
        match self {
            EmergencySos | CollisionAlert | RoadHazardBroadcast | IncidentUpload => {
                TaskClass::Emergency
            }
            LaneGuidance | NavigationRerouting | SpeedLimitAr | DrowsinessAlert | SurroundView
            | SchoolZoneAdvisory | WeatherAwareRouting | ParkingDiscovery => TaskClass::Safety,
            EvChargerBooking | TollingCharging | TripSummaryAnalytics => TaskClass::Normal,
        }
    }

    /// Processing demand in CPU work units.
    pub fn demand(self) -> f64 {
        use ServiceKind::*;
        match self {
            EmergencySos => 20.0,
            CollisionAlert => 15.0,
            RoadHazardBroadcast => 12.0,
            IncidentUpload => 18.0,
            LaneGuidance | NavigationRerouting | SpeedLimitAr | DrowsinessAlert | SurroundView
            | SchoolZoneAdvisory | WeatherAwareRouting => 10.0,
            ParkingDiscovery | EvChargerBooking | TollingCharging => 8.0,
            TripSummaryAnalytics => 5.0,
        }
    }

    /// Payload size in MB sent over the node link.
    pub fn data_size(self) -> f64 {
        use ServiceKind::*;
        match self {
            EmergencySos => 2.0,
            CollisionAlert => 1.5,
            IncidentUpload => 10.0,
            TripSummaryAnalytics => 3.0,
            _ => 1.0,
        }
    }

    /// Target end-to-end latency in seconds.
    pub fn relative_deadline(self) -> SimTime {
        use ServiceKind::*;
        match self {
            CollisionAlert => 5.0,
            EmergencySos | RoadHazardBroadcast => 8.0,
            IncidentUpload => 10.0,
            LaneGuidance | DrowsinessAlert | SurroundView => 15.0,
            NavigationRerouting | SpeedLimitAr | SchoolZoneAdvisory | WeatherAwareRouting => 20.0,
            ParkingDiscovery => 25.0,
            EvChargerBooking | TollingCharging => 60.0,
            TripSummaryAnalytics => 120.0,
        }
    }

    /// Unnormalized share of arrivals belonging to this kind.
    pub fn arrival_weight(self) -> f64 {
        use ServiceKind::*;
        match self {
            LaneGuidance | NavigationRerouting => 0.08,
            ParkingDiscovery => 0.05,
            EvChargerBooking => 0.03,
            TollingCharging => 0.02,
            EmergencySos => 0.10,
            IncidentUpload | CollisionAlert | SpeedLimitAr => 0.08,
            RoadHazardBroadcast => 0.10,
            DrowsinessAlert | SurroundView => 0.05,
            SchoolZoneAdvisory | WeatherAwareRouting => 0.02,
            TripSummaryAnalytics => 0.0,
        }
    }

    /// Default kind used when a task is built from a bare class.
    pub fn representative(class: TaskClass) -> Self {
        match class {
            TaskClass::Emergency => ServiceKind::EmergencySos,
            TaskClass::Safety => ServiceKind::LaneGuidance,
            TaskClass::Normal => ServiceKind::EvChargerBooking,
        }
    }

    pub fn as_str(self) -> &'static str {
        use ServiceKind::*;
        match self {
            LaneGuidance => "lane_guidance",
            NavigationRerouting => "navigation_rerouting",
            ParkingDiscovery => "parking_discovery",
            EvChargerBooking => "ev_charger_booking",
            TollingCharging => "tolling_charging",
            EmergencySos => "emergency_sos",
            IncidentUpload => "incident_upload",
            CollisionAlert => "collision_alert",
            SpeedLimitAr => "speed_limit_ar",
            RoadHazardBroadcast => "road_hazard_broadcast",
            DrowsinessAlert => "drowsiness_alert",
            SurroundView => "surround_view",
            SchoolZoneAdvisory => "school_zone_advisory",
            WeatherAwareRouting => "weather_aware_routing",
            TripSummaryAnalytics => "trip_summary_analytics",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
