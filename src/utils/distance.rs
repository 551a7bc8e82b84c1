// Distance calculation utilities

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{GeoPoint, Km};

/// Mean Earth radius used by every distance in the crate
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Size of a routing zone cell in degrees
pub const ZONE_CELL_DEGREES: f64 = 5.0;

/// Haversine great-circle distance between two points in kilometers.
///
/// Does not validate its inputs; callers filter unknown points first.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> Km {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Grid cell a point falls into when jobs are bucketed by zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneKey {
    pub lat_index: i32,
    pub lng_index: i32,
}

impl ZoneKey {
    pub fn of(point: &GeoPoint) -> Self {
        Self {
            lat_index: (point.latitude / ZONE_CELL_DEGREES).floor() as i32,
            lng_index: (point.longitude / ZONE_CELL_DEGREES).floor() as i32,
        }
    }
}

impl fmt::Display for ZoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat_index, self.lng_index)
    }
}
