// Route models for representing an optimized worker tour

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{GeoPoint, Job, Km, Minutes};
use crate::utils::distance::ZoneKey;

/// One visit in an optimized tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    pub job: Job,

    /// Position in the tour, starting at 1
    pub order: usize,

    /// Distance from the previous stop, or from the start for the first stop
    pub distance_from_prev_km: Km,

    pub travel_time_min: Minutes,

    pub shopping_time_min: Minutes,

    /// Zone key ("lat_index,lng_index") of the cell the stop belongs to
    pub cluster_id: String,
}

/// Aggregate of one zone of the tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub zone: ZoneKey,
    pub job_count: usize,
    pub centroid: Option<GeoPoint>,
    /// Distance driven to reach and serve the zone, entry hop included
    pub distance_km: Km,
}

/// Complete optimized tour with cost information
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutePlan {
    pub stops: Vec<RouteStop>,

    /// Jobs per zone; not serialized since JSON keys must be strings
    #[serde(skip)]
    pub clusters: BTreeMap<ZoneKey, Vec<Job>>,

    pub cluster_summaries: Vec<ClusterSummary>,

    pub total_distance_km: Km,

    pub total_time_min: Minutes,

    /// Radial baseline minus optimized distance; negative when the tour is worse
    pub distance_saved_km: Km,

    pub warnings: Vec<String>,
}

impl RoutePlan {
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Job ids in visiting order
    pub fn job_order(&self) -> Vec<&str> {
        self.stops.iter().map(|s| s.job.id.as_str()).collect()
    }

    /// When the last stop is done if the tour starts at `start`
    pub fn estimated_finish(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + Duration::minutes(self.total_time_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_plan() {
        let plan = RoutePlan::default();
        assert!(plan.is_empty());
        assert_eq!(plan.total_time_min, 0);
        assert!(plan.job_order().is_empty());
    }

    #[test]
    fn test_estimated_finish() {
        let plan = RoutePlan {
            total_time_min: 95,
            ..RoutePlan::default()
        };
        let start = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        assert_eq!(
            plan.estimated_finish(start),
            Utc.with_ymd_and_hms(2024, 3, 5, 10, 35, 0).unwrap()
        );
    }
}
