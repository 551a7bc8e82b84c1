// Location model representing WGS84 coordinates

use serde::{Deserialize, Serialize};

use crate::models::Km;
use crate::utils::distance::haversine_km;

/// Represents a geographic position as latitude/longitude in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new point from latitude and longitude
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether this point can take part in distance math.
    ///
    /// A (0, 0) coordinate is the "no location" sentinel written by clients
    /// that never obtained a fix, so it counts as unknown.
    pub fn is_known(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && !(self.latitude == 0.0 && self.longitude == 0.0)
    }

    /// Great-circle distance to another point in kilometers
    pub fn distance_to(&self, other: &GeoPoint) -> Km {
        haversine_km(self, other)
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(p: GeoPoint) -> Self {
        geo::Point::new(p.longitude, p.latitude)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(p: geo::Point<f64>) -> Self {
        GeoPoint::new(p.y(), p.x())
    }
}

/// Keeps a point only when it is usable for distance math
pub fn known(point: Option<GeoPoint>) -> Option<GeoPoint> {
    point.filter(GeoPoint::is_known)
}
