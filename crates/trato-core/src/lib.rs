//! # Trato Core
//!
//! Domain model and pure marketplace rules for Trato, a peer-to-peer
//! marketplace where users publish deals (sales, trades, and wanted items),
//! place bids, and negotiate over per-deal message threads.
//!
//! This crate has no I/O: everything here is data plus the rules that can be
//! checked without talking to the backend.
//!
//! ## Key Types
//!
//! - [`Deal`] / [`DealDraft`]: a published listing and the unsaved form data
//!   used to create or edit one
//! - [`Bid`] / [`BidDraft`] / [`BidPatch`]: offers on a deal
//! - [`Message`] / [`Conversation`]: the two-party chat threads on a deal
//! - [`Delivery`]: a backend-computed delivery estimate
//! - [`SearchFilters`]: the home-listing query
//!
//! ## Key Rules
//!
//! - [`visible_bids`]: owners see every bid, other users only their own plus
//!   any accepted one
//! - [`haversine_km`]: great-circle distance used for nearby-first ordering
//! - [`parse_positive_amount`]: pt-BR amount input ("10,50") for bids and
//!   deal values
//! - [`validate_deal_draft`]: the submit-time checks mirrored from the
//!   backend's rejection shape

pub mod bid;
pub mod conversation;
pub mod deal;
pub mod delivery;
pub mod geo;
pub mod ids;
pub mod invite;
pub mod location;
pub mod message;
pub mod money;
pub mod search;
pub mod user;
pub mod validate;

// Re-export main types
pub use bid::*;
pub use conversation::*;
pub use deal::*;
pub use delivery::*;
pub use geo::*;
pub use ids::*;
pub use invite::*;
pub use location::*;
pub use message::*;
pub use money::*;
pub use search::*;
pub use user::*;
pub use validate::*;
