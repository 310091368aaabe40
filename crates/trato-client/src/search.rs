//! The home-listing search orchestrator.
//!
//! `DealSearch` merges free-text, type, and price filters into one server
//! query and layers a purely client-side ordering over the fetched
//! results. The server is only hit by [`DealSearch::apply`] (and its
//! alias [`DealSearch::retry`]); changing the sort order alone never
//! re-queries.
//!
//! Geolocation goes through the [`Locator`] seam, once, at
//! [`DealSearch::start`]: a position biases every subsequent search and
//! gives each hit a distance, while a denied or unsupported outcome
//! falls straight back to a non-geo search without blocking anything.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use trato_core::{Coordinates, SearchFilters, SearchHit, SortOrder, sort_hits};
use trato_gateway::Gateway;

use crate::error::ClientResult;
use crate::load::Load;
use crate::token::RequestToken;

/// One-shot position lookup. The real implementation wraps whatever the
/// platform offers; tests and the CLI use [`StaticLocator`].
#[async_trait]
pub trait Locator: Send + Sync {
    async fn locate(&self) -> GeoOutcome;
}

/// The success / denied / unsupported trichotomy of a position request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoOutcome {
    Position(Coordinates),
    Denied,
    Unsupported,
}

/// Where the geolocation request ended up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum GeoStatus {
    /// [`DealSearch::start`] has not run yet.
    #[default]
    Unknown,
    Located(Coordinates),
    Denied,
    Unsupported,
}

impl GeoStatus {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            GeoStatus::Located(coordinates) => Some(*coordinates),
            _ => None,
        }
    }
}

/// A fixed-outcome locator, for tests and environments with no position
/// source.
pub struct StaticLocator(GeoOutcome);

impl StaticLocator {
    pub fn at(lat: f64, lng: f64) -> Self {
        Self(GeoOutcome::Position(Coordinates::new(lat, lng)))
    }

    pub fn denied() -> Self {
        Self(GeoOutcome::Denied)
    }

    pub fn unsupported() -> Self {
        Self(GeoOutcome::Unsupported)
    }
}

#[async_trait]
impl Locator for StaticLocator {
    async fn locate(&self) -> GeoOutcome {
        self.0
    }
}

#[derive(Default)]
struct SearchState {
    filters: SearchFilters,
    order: SortOrder,
    geo: GeoStatus,
    hits: Load<Vec<SearchHit>>,
}

pub struct DealSearch {
    gateway: Arc<dyn Gateway>,
    state: RwLock<SearchState>,
    token: RequestToken,
}

impl DealSearch {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            state: RwLock::new(SearchState::default()),
            token: RequestToken::new(),
        }
    }

    /// Asks for a position once, then runs the first search: geo-biased
    /// when a position came back, plain otherwise. Neither denial nor an
    /// unsupported platform blocks the initial listing.
    pub async fn start(&self, locator: &dyn Locator) -> ClientResult<()> {
        let status = match locator.locate().await {
            GeoOutcome::Position(coordinates) => GeoStatus::Located(coordinates),
            GeoOutcome::Denied => GeoStatus::Denied,
            GeoOutcome::Unsupported => GeoStatus::Unsupported,
        };
        debug!(?status, "geolocation resolved");
        self.write_state(|state| state.geo = status);
        self.apply().await
    }

    /// Replaces the filters. Takes effect on the next [`apply`];
    /// the `near` bias is managed by the geolocation outcome, not the
    /// caller.
    ///
    /// [`apply`]: DealSearch::apply
    pub fn set_filters(&self, filters: SearchFilters) {
        self.write_state(|state| state.filters = filters);
    }

    pub fn filters(&self) -> SearchFilters {
        self.read_state(|state| state.filters.clone())
    }

    /// Reorders the already-fetched results. Client-side only: the last
    /// fetched page is re-sorted in place and the server is not
    /// consulted.
    pub fn set_order(&self, order: SortOrder) {
        self.write_state(|state| {
            state.order = order;
            if let Load::Ready(hits) = &mut state.hits {
                sort_hits(hits, order);
            }
        });
    }

    pub fn order(&self) -> SortOrder {
        self.read_state(|state| state.order)
    }

    pub fn geo_status(&self) -> GeoStatus {
        self.read_state(|state| state.geo)
    }

    pub fn hits(&self) -> Load<Vec<SearchHit>> {
        self.read_state(|state| state.hits.clone())
    }

    /// Runs the search with the current filters and geo bias, replacing
    /// the result set wholesale. This is the only operation that hits
    /// the server.
    pub async fn apply(&self) -> ClientResult<()> {
        let token = self.token.issue();
        let (filters, origin, order) = self.write_state(|state| {
            if !state.hits.is_ready() {
                state.hits = Load::Loading;
            }
            let mut filters = state.filters.clone();
            filters.near = state.geo.coordinates();
            (filters, state.geo.coordinates(), state.order)
        });

        match self.gateway.search_deals(&filters).await {
            Ok(deals) => {
                if !self.token.is_current(token) {
                    debug!("discarding stale search results");
                    return Ok(());
                }
                let mut hits = SearchHit::annotate(deals, origin);
                sort_hits(&mut hits, order);
                self.write_state(|state| state.hits = Load::Ready(hits));
                Ok(())
            }
            Err(err) => {
                if self.token.is_current(token) {
                    self.write_state(|state| state.hits = Load::Failed(err.to_string()));
                }
                Err(err.into())
            }
        }
    }

    /// The explicit retry affordance after a failed load.
    pub async fn retry(&self) -> ClientResult<()> {
        self.apply().await
    }

    fn read_state<R>(&self, read: impl FnOnce(&SearchState) -> R) -> R {
        read(&self.state.read().unwrap_or_else(|e| e.into_inner()))
    }

    fn write_state<R>(&self, write: impl FnOnce(&mut SearchState) -> R) -> R {
        write(&mut self.state.write().unwrap_or_else(|e| e.into_inner()))
    }
}
