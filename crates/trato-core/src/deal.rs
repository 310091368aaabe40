//! Deal listings and the drafts used to create or edit them.
//!
//! A persisted [`Deal`] always has an id and (usually) a resolved owner; the
//! unsaved form data is a separate [`DealDraft`] so the two can never be
//! confused.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bid::Bid;
use crate::ids::{DealId, UserId};
use crate::location::Location;
use crate::message::Message;
use crate::validate::{digits_only, normalize_region};

/// Raised when the backend sends a numeric code outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} code: {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: i64,
}

/// What kind of listing this is. The wire carries these as 1, 2, 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum DealType {
    Sale,
    Trade,
    Want,
}

impl DealType {
    pub fn code(self) -> i64 {
        match self {
            DealType::Sale => 1,
            DealType::Trade => 2,
            DealType::Want => 3,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DealType::Sale => "Sale",
            DealType::Trade => "Trade",
            DealType::Want => "Want",
        }
    }

    pub fn all() -> [DealType; 3] {
        [DealType::Sale, DealType::Trade, DealType::Want]
    }
}

impl From<DealType> for i64 {
    fn from(deal_type: DealType) -> i64 {
        deal_type.code()
    }
}

impl TryFrom<i64> for DealType {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, UnknownCode> {
        match code {
            1 => Ok(DealType::Sale),
            2 => Ok(DealType::Trade),
            3 => Ok(DealType::Want),
            code => Err(UnknownCode {
                kind: "deal type",
                code,
            }),
        }
    }
}

/// How urgent the deal is. Wire codes 1 through 4; `Date` means "until a
/// specific date" and requires a limit date on the urgency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum UrgencyLevel {
    #[default]
    Low,
    Medium,
    High,
    Date,
}

impl UrgencyLevel {
    pub fn code(self) -> i64 {
        match self {
            UrgencyLevel::Low => 1,
            UrgencyLevel::Medium => 2,
            UrgencyLevel::High => 3,
            UrgencyLevel::Date => 4,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UrgencyLevel::Low => "Low",
            UrgencyLevel::Medium => "Medium",
            UrgencyLevel::High => "High",
            UrgencyLevel::Date => "By date",
        }
    }

    pub fn all() -> [UrgencyLevel; 4] {
        [
            UrgencyLevel::Low,
            UrgencyLevel::Medium,
            UrgencyLevel::High,
            UrgencyLevel::Date,
        ]
    }
}

impl From<UrgencyLevel> for i64 {
    fn from(level: UrgencyLevel) -> i64 {
        level.code()
    }
}

impl TryFrom<i64> for UrgencyLevel {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, UnknownCode> {
        match code {
            1 => Ok(UrgencyLevel::Low),
            2 => Ok(UrgencyLevel::Medium),
            3 => Ok(UrgencyLevel::High),
            4 => Ok(UrgencyLevel::Date),
            code => Err(UnknownCode {
                kind: "urgency",
                code,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Urgency {
    #[serde(rename = "type")]
    pub level: UrgencyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_date: Option<NaiveDate>,
}

impl Urgency {
    pub fn level(level: UrgencyLevel) -> Self {
        Self {
            level,
            limit_date: None,
        }
    }

    pub fn until(date: NaiveDate) -> Self {
        Self {
            level: UrgencyLevel::Date,
            limit_date: Some(date),
        }
    }
}

/// One listing photo. The id only exists once the backend has stored it;
/// the client never reads it, so a single value type is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub src: String,
}

impl Photo {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            id: None,
            src: src.into(),
        }
    }
}

/// A published listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    #[serde(rename = "type")]
    pub deal_type: DealType,
    pub value: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_for: Option<String>,
    pub location: Location,
    pub urgency: Urgency,
    #[serde(default)]
    pub photos: Vec<Photo>,
    /// Resolved publisher. `None` when the backend response carried no
    /// owner reference in either of its legacy spots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
}

impl Deal {
    /// Turns the persisted deal back into form data, for the edit flow.
    pub fn draft(&self) -> DealDraft {
        DealDraft {
            deal_type: self.deal_type,
            value: self.value,
            description: self.description.clone(),
            trade_for: self.trade_for.clone(),
            location: self.location.clone(),
            urgency: self.urgency.clone(),
            photos: self.photos.clone(),
        }
    }
}

/// Unsaved deal form data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealDraft {
    #[serde(rename = "type")]
    pub deal_type: DealType,
    pub value: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_for: Option<String>,
    pub location: Location,
    pub urgency: Urgency,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl DealDraft {
    /// Submit-time cleanup: trimmed description, canonical region code,
    /// digits-only postal code, trade target only on trade deals, limit
    /// date only on date urgency.
    pub fn normalized(&self) -> DealDraft {
        let mut draft = self.clone();
        draft.description = draft.description.trim().to_string();
        if let Some(region) = normalize_region(&draft.location.state) {
            draft.location.state = region;
        }
        draft.location.zip_code = digits_only(&draft.location.zip_code);
        if draft.deal_type != DealType::Trade {
            draft.trade_for = None;
        }
        if draft.urgency.level != UrgencyLevel::Date {
            draft.urgency.limit_date = None;
        }
        draft
    }
}

/// One row of the "deals I have offered on" listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferSummary {
    pub deal: Deal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid: Option<Bid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deal_type_codes_round_trip() {
        for deal_type in DealType::all() {
            assert_eq!(DealType::try_from(deal_type.code()).unwrap(), deal_type);
        }
        assert!(DealType::try_from(4).is_err());
    }

    #[test]
    fn urgency_serializes_with_numeric_type() {
        let urgency = Urgency::until(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        let json = serde_json::to_value(&urgency).unwrap();
        assert_eq!(json["type"], 4);
        assert_eq!(json["limit_date"], "2026-03-09");

        let low: Urgency = serde_json::from_value(serde_json::json!({ "type": 1 })).unwrap();
        assert_eq!(low.level, UrgencyLevel::Low);
        assert_eq!(low.limit_date, None);
    }

    #[test]
    fn normalized_draft_cleans_submit_fields() {
        let draft = DealDraft {
            deal_type: DealType::Sale,
            value: 100.0,
            description: "  bicycle in good shape  ".to_string(),
            trade_for: Some("anything".to_string()),
            location: Location {
                lat: None,
                lng: None,
                address: "Rua XV, 100".to_string(),
                city: "Curitiba".to_string(),
                state: "Paraná".to_string(),
                zip_code: "80.020-010".to_string(),
            },
            urgency: Urgency {
                level: UrgencyLevel::Low,
                limit_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            },
            photos: vec![],
        };

        let clean = draft.normalized();
        assert_eq!(clean.description, "bicycle in good shape");
        assert_eq!(clean.location.state, "PR");
        assert_eq!(clean.location.zip_code, "80020010");
        // not a trade, so the trade target goes away
        assert_eq!(clean.trade_for, None);
        // not date urgency, so the limit date goes away
        assert_eq!(clean.urgency.limit_date, None);
    }
}
