//! Postal locations attached to deals and user profiles.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

/// A Brazilian postal address. Coordinates are optional: manual address
/// entry may omit them, and the listing still works without.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    pub address: String,
    pub city: String,
    /// Two-letter region code ("SP", "RJ", ...).
    pub state: String,
    /// Digits-only postal code. Kept as a string so leading zeros survive.
    pub zip_code: String,
}

impl Location {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }
}
