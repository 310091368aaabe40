//! # Trato Client
//!
//! The stateful orchestration layer of the Trato marketplace client: the
//! code that used to be glue between views and the backend, reworked as
//! two headless state machines any front end can drive.
//!
//! - [`DealView`]: everything on the deal-detail screen: the root deal
//!   load, ownership, lazy per-tab resources (bids, delivery), and the
//!   two-party chat threads with their conversation sidebar
//! - [`DealSearch`]: the home listing: filters, a one-shot geolocation
//!   request through the [`Locator`] seam, and a purely client-side sort
//!   over the last fetched results
//!
//! Every fetch is guarded by a [`RequestToken`]: a response only lands if
//! no newer request for the same resource was issued while it was in
//! flight, so rapid tab flicker or repeated loads can never paint stale
//! data over fresh data.

pub mod chat;
pub mod config;
pub mod detail;
pub mod error;
pub mod load;
pub mod search;
pub mod token;

pub use config::ClientConfig;
pub use detail::{DealTab, DealView, DealViewEvent, ViewState};
pub use error::{ClientError, ClientResult};
pub use load::Load;
pub use search::{DealSearch, GeoOutcome, GeoStatus, Locator, StaticLocator};
pub use token::RequestToken;
