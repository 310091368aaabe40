//! Great-circle distances for the nearby-first home listing.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Haversine distance between two points, in kilometers.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Short human distance label: meters below one kilometer, otherwise one
/// decimal of kilometers.
pub fn format_km(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as i64)
    } else {
        format!("{km:.1} km")
    }
}
