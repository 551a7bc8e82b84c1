// Worker position as last reported by the worker's own client

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::location::known;
use crate::models::{GeoPoint, WorkerId};

/// Last known position of a worker. Last write wins, no versioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerLocation {
    pub worker_id: WorkerId,

    pub name: String,

    #[serde(default)]
    pub position: Option<GeoPoint>,

    pub is_available: bool,

    pub updated_at: DateTime<Utc>,
}

impl WorkerLocation {
    pub fn new<S: Into<String>>(
        worker_id: S,
        name: S,
        position: Option<GeoPoint>,
        is_available: bool,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            name: name.into(),
            position,
            is_available,
            updated_at,
        }
    }

    /// Position if it can be used for distance math
    pub fn known_position(&self) -> Option<GeoPoint> {
        known(self.position)
    }

    /// Time since the worker last reported, never negative
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.updated_at).max(Duration::zero())
    }

    /// Whole minutes since the worker last reported
    pub fn minutes_since_update(&self, now: DateTime<Utc>) -> i64 {
        self.idle_for(now).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_minutes_since_update() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let w = WorkerLocation::new("w1", "Amina", Some(GeoPoint::new(48.8, 2.3)), true, t);
        assert_eq!(w.minutes_since_update(t + Duration::minutes(31)), 31);
        // clock skew on the client must not yield negative staleness
        assert_eq!(w.minutes_since_update(t - Duration::minutes(2)), 0);
        assert_eq!(w.idle_for(t - Duration::minutes(2)), Duration::zero());
        assert_eq!(w.idle_for(t + Duration::seconds(1830)), Duration::seconds(1830));
    }

    #[test]
    fn test_unknown_position() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let w = WorkerLocation::new("w1", "Amina", Some(GeoPoint::new(0.0, 0.0)), true, t);
        assert!(w.known_position().is_none());
    }
}
