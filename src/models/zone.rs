// Static geofence zones watched by the alert engine

use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, Meters};

/// A circular area of interest, immutable for the lifetime of the process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceZone {
    pub id: String,
    pub name: String,
    pub center: GeoPoint,
    pub radius_meters: Meters,
    /// Display color, passed through to the UI untouched
    pub color: String,
}

impl GeofenceZone {
    pub fn new<S: Into<String>>(
        id: S,
        name: S,
        center: GeoPoint,
        radius_meters: Meters,
        color: S,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            center,
            radius_meters,
            color: color.into(),
        }
    }

    /// Whether a point lies inside the zone, boundary included
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.center.distance_to(point) * 1000.0 <= self.radius_meters
    }
}

/// Zones configured at build time for the Paris launch area
pub fn default_zones() -> Vec<GeofenceZone> {
    vec![
        GeofenceZone::new(
            "paris-centre",
            "Paris Centre",
            GeoPoint::new(48.8566, 2.3522),
            2000.0,
            "#3b82f6",
        ),
        GeofenceZone::new(
            "la-defense",
            "La Défense",
            GeoPoint::new(48.8920, 2.2380),
            1500.0,
            "#10b981",
        ),
        GeofenceZone::new(
            "montparnasse",
            "Montparnasse",
            GeoPoint::new(48.8421, 2.3219),
            1000.0,
            "#f59e0b",
        ),
        GeofenceZone::new(
            "bastille",
            "Bastille",
            GeoPoint::new(48.8532, 2.3692),
            1000.0,
            "#ef4444",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_is_inside() {
        for zone in default_zones() {
            assert!(zone.contains(&zone.center), "{}", zone.id);
        }
    }

    #[test]
    fn test_point_outside_radius() {
        let zone = GeofenceZone::new("z", "Z", GeoPoint::new(45.0, 5.0), 500.0, "#000");
        // 0.01 degree of latitude is ~1.1 km
        assert!(!zone.contains(&GeoPoint::new(45.01, 5.0)));
        assert!(zone.contains(&GeoPoint::new(45.004, 5.0)));
    }
}
