//! Bids placed on a deal, and who gets to see them.

use serde::{Deserialize, Serialize};

use crate::ids::{BidId, UserId};

/// A persisted bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub bidder: UserId,
    pub value: f64,
    pub description: String,
    pub accepted: bool,
}

/// An unsaved bid. The backend assigns the id and the bidder (from the
/// session token) when it lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidDraft {
    pub value: f64,
    pub description: String,
}

impl BidDraft {
    pub fn new(value: f64, description: impl Into<String>) -> Self {
        Self {
            value,
            description: description.into(),
        }
    }
}

/// Partial update for an existing bid: revising your own offer, or the deal
/// owner accepting / rejecting it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
}

impl BidPatch {
    pub fn accept() -> Self {
        Self {
            accepted: Some(true),
            ..Self::default()
        }
    }

    pub fn reject() -> Self {
        Self {
            accepted: Some(false),
            ..Self::default()
        }
    }

    pub fn revise(value: f64, description: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            description: Some(description.into()),
            accepted: None,
        }
    }
}

/// The deal owner sees every bid; everyone else sees only their own bids
/// plus any accepted one.
pub fn visible_bids<'a>(
    bids: &'a [Bid],
    viewer: Option<UserId>,
    owner: Option<UserId>,
) -> Vec<&'a Bid> {
    let viewer_owns_deal = match (viewer, owner) {
        (Some(viewer), Some(owner)) => viewer == owner,
        _ => false,
    };
    if viewer_owns_deal {
        return bids.iter().collect();
    }
    bids.iter()
        .filter(|bid| viewer.is_some_and(|viewer| bid.bidder == viewer) || bid.accepted)
        .collect()
}
