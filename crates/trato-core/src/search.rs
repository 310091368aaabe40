//! The home-listing search query and the client-side ordering of its
//! results.

use crate::deal::{Deal, DealType};
use crate::geo::{Coordinates, haversine_km};

/// Filters for the deal search. Unset fields are left out of the request
/// entirely; `near` biases results toward a point when the searcher shared
/// their position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub term: Option<String>,
    pub deal_type: Option<DealType>,
    pub value_start: Option<f64>,
    pub value_end: Option<f64>,
    pub near: Option<Coordinates>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn with_deal_type(mut self, deal_type: DealType) -> Self {
        self.deal_type = Some(deal_type);
        self
    }

    pub fn with_value_start(mut self, value: f64) -> Self {
        self.value_start = Some(value);
        self
    }

    pub fn with_value_end(mut self, value: f64) -> Self {
        self.value_end = Some(value);
        self
    }

    pub fn with_near(mut self, near: Coordinates) -> Self {
        self.near = Some(near);
        self
    }
}

/// How the fetched results are ordered. Reordering is a pure client-side
/// transform; it never goes back to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Nearby,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    pub fn display_name(&self) -> &'static str {
        match self {
            SortOrder::Nearby => "Nearby first",
            SortOrder::PriceAsc => "Lowest price",
            SortOrder::PriceDesc => "Highest price",
        }
    }
}

/// One search result: the deal plus its distance from the searcher, when
/// both sides have coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub deal: Deal,
    pub distance_km: Option<f64>,
}

impl SearchHit {
    /// Wraps fetched deals, computing each distance once. Without an origin
    /// every distance is `None`.
    pub fn annotate(deals: Vec<Deal>, origin: Option<Coordinates>) -> Vec<SearchHit> {
        deals
            .into_iter()
            .map(|deal| {
                let distance_km = match (origin, deal.location.coordinates()) {
                    (Some(origin), Some(there)) => Some(haversine_km(origin, there)),
                    _ => None,
                };
                SearchHit { deal, distance_km }
            })
            .collect()
    }
}

/// Reorders hits in place. Stable, so ties keep the fetched order; deals
/// with no known distance sort after every known one.
pub fn sort_hits(hits: &mut [SearchHit], order: SortOrder) {
    match order {
        SortOrder::Nearby => hits.sort_by(|a, b| {
            let a = a.distance_km.unwrap_or(f64::INFINITY);
            let b = b.distance_km.unwrap_or(f64::INFINITY);
            a.total_cmp(&b)
        }),
        SortOrder::PriceAsc => hits.sort_by(|a, b| a.deal.value.total_cmp(&b.deal.value)),
        SortOrder::PriceDesc => hits.sort_by(|a, b| b.deal.value.total_cmp(&a.deal.value)),
    }
}
