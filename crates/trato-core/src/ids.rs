//! Typed identifiers for marketplace entities.
//!
//! The backend hands out plain integers; wrapping them keeps a deal id from
//! being passed where a user id belongs.

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }
}

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DealId(i64);

impl DealId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }
}

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BidId(i64);

impl BidId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }
}

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }
}

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InviteId(i64);

impl InviteId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_integers() {
        let id = DealId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: DealId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ids_display_their_raw_value() {
        assert_eq!(UserId::new(7).to_string(), "7");
        assert_eq!(BidId::new(-1).to_string(), "-1");
    }
}
