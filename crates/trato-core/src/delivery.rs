//! Backend-computed delivery estimates.

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// One hop of the delivery route. Dates are backend display strings, kept
/// opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryStep {
    pub location: String,
    pub incoming_date: String,
    pub outcoming_date: String,
}

/// A delivery estimate between the deal's location and the interested
/// user's location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub from: Location,
    pub to: Location,
    pub value: f64,
    #[serde(default)]
    pub steps: Vec<DeliveryStep>,
}
