//! The normalization boundary for backend JSON.
//!
//! The backend grew organically and its payloads come in a handful of
//! legacy shapes. All of them are enumerated here, once, as serde DTOs
//! with a conversion into the canonical [`trato_core`] types. Nothing
//! outside this module is allowed to look at a raw payload.
//!
//! Accepted inbound shapes:
//!
//! 1. single-entity envelopes: `{"deal":{..}}`, `{"bid":{..}}`,
//!    `{"message":{..}}`, `{"user":{..}}`, `{"invite":{..}}` (invites may
//!    also arrive bare);
//! 2. wrapped element lists: `[{"bid":{..}}, ..]`, `[{"message":{..}}, ..]`,
//!    `[{"deal":{..}}, ..]` (search);
//! 3. list envelopes: `{"items":[..]}` or a bare array (conversations,
//!    invites), `{"deals":[..]}` (my deals), `{"items":[{deal,bid?,
//!    last_message?}]}` (my offers);
//! 4. the owner reference on a deal: top-level `user_id` or nested
//!    `user.id`;
//! 5. delivery: flat `{from,to,value,steps}` or an envelope
//!    `{"delivery":{..},"steps":[..]}` with the steps inside or beside it.
//!
//! Outbound bodies are built here too, so field renames (`body` →
//! `message`, `to_user` → `to_user_id`) stay in one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use trato_core::{
    AuthSession, Bid, BidDraft, BidId, Conversation, ConversationPreview, Deal, DealDraft, DealId,
    DealType, Delivery, DeliveryStep, FieldErrors, Invite, InviteDraft, InviteId, InviteStatus,
    Location, Message, MessageDraft, MessageId, OfferSummary, Photo, SearchFilters, Urgency, User,
    UserDraft, UserId, UserPatch, UserSummary,
};

// ---------------------------------------------------------------------
// Shared fragments
// ---------------------------------------------------------------------

/// Postal codes arrive as numbers on old rows and strings on new ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireZip {
    Number(i64),
    Text(String),
}

impl Default for WireZip {
    fn default() -> Self {
        WireZip::Text(String::new())
    }
}

impl WireZip {
    fn into_string(self) -> String {
        match self {
            WireZip::Number(n) => n.to_string(),
            WireZip::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireLocation {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: WireZip,
}

impl WireLocation {
    fn into_location(self) -> Location {
        Location {
            lat: self.lat,
            lng: self.lng,
            address: self.address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code.into_string(),
        }
    }
}

/// Outbound location. The backend stores postal codes numerically, so the
/// digits-only string is sent as a number.
#[derive(Debug, Serialize)]
pub struct LocationBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: i64,
}

impl From<&Location> for LocationBody {
    fn from(location: &Location) -> Self {
        Self {
            lat: location.lat,
            lng: location.lng,
            address: location.address.clone(),
            city: location.city.clone(),
            state: location.state.clone(),
            zip_code: location.zip_code.parse().unwrap_or(0),
        }
    }
}

// ---------------------------------------------------------------------
// Deals
// ---------------------------------------------------------------------

/// Nested owner reference, the newer of the two legacy spots.
#[derive(Debug, Clone, Deserialize)]
pub struct WireOwnerRef {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireDeal {
    pub id: i64,
    #[serde(rename = "type")]
    pub deal_type: DealType,
    pub value: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub trade_for: Option<String>,
    pub location: WireLocation,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub photos: Vec<Photo>,
    // Owner reference, shape 4: either of these may carry it.
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user: Option<WireOwnerRef>,
}

impl WireDeal {
    pub fn into_deal(self) -> Deal {
        let owner = self
            .user_id
            .or(self.user.map(|user| user.id))
            .map(UserId::new);
        Deal {
            id: DealId::new(self.id),
            deal_type: self.deal_type,
            value: self.value,
            description: self.description,
            trade_for: self.trade_for,
            location: self.location.into_location(),
            urgency: self.urgency,
            photos: self.photos,
            owner,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DealEnvelope {
    pub deal: WireDeal,
}

/// A wrapped deal row, as the search endpoint returns them.
#[derive(Debug, Deserialize)]
pub struct DealRow {
    pub deal: WireDeal,
}

#[derive(Debug, Deserialize)]
pub struct DealsEnvelope {
    pub deals: Vec<WireDeal>,
}

pub fn deals_from_rows(rows: Vec<DealRow>) -> Vec<Deal> {
    rows.into_iter().map(|row| row.deal.into_deal()).collect()
}

/// Outbound deal create/update body.
#[derive(Debug, Serialize)]
pub struct DealBody {
    #[serde(rename = "type")]
    pub deal_type: DealType,
    pub value: f64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_for: Option<String>,
    pub location: LocationBody,
    pub urgency: Urgency,
    pub photos: Vec<Photo>,
}

impl From<&DealDraft> for DealBody {
    fn from(draft: &DealDraft) -> Self {
        Self {
            deal_type: draft.deal_type,
            value: draft.value,
            description: draft.description.clone(),
            trade_for: draft.trade_for.clone(),
            location: LocationBody::from(&draft.location),
            urgency: draft.urgency.clone(),
            photos: draft.photos.clone(),
        }
    }
}

/// Outbound search body. Coordinates flatten into `lat`/`lng`.
#[derive(Debug, Serialize)]
pub struct SearchBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub deal_type: Option<DealType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl From<&SearchFilters> for SearchBody {
    fn from(filters: &SearchFilters) -> Self {
        Self {
            term: filters.term.clone(),
            deal_type: filters.deal_type,
            value_start: filters.value_start,
            value_end: filters.value_end,
            lat: filters.near.map(|near| near.lat),
            lng: filters.near.map(|near| near.lng),
        }
    }
}

// ---------------------------------------------------------------------
// Bids
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct WireBid {
    pub id: i64,
    pub user_id: i64,
    pub value: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub accepted: bool,
}

impl WireBid {
    pub fn into_bid(self) -> Bid {
        Bid {
            id: BidId::new(self.id),
            bidder: UserId::new(self.user_id),
            value: self.value,
            description: self.description,
            accepted: self.accepted,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BidEnvelope {
    pub bid: WireBid,
}

#[derive(Debug, Deserialize)]
pub struct BidRow {
    pub bid: WireBid,
}

pub fn bids_from_rows(rows: Vec<BidRow>) -> Vec<Bid> {
    rows.into_iter().map(|row| row.bid.into_bid()).collect()
}

#[derive(Debug, Serialize)]
pub struct BidBody {
    pub value: f64,
    pub description: String,
}

impl From<&BidDraft> for BidBody {
    fn from(draft: &BidDraft) -> Self {
        Self {
            value: draft.value,
            description: draft.description.clone(),
        }
    }
}

// ---------------------------------------------------------------------
// Messages and conversations
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl WireMessage {
    pub fn into_message(self) -> Message {
        Message {
            id: MessageId::new(self.id),
            sender: UserId::new(self.user_id),
            title: self.title,
            body: self.message,
            sent_at: self.created_at,
            read_at: self.read_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageEnvelope {
    pub message: WireMessage,
}

#[derive(Debug, Deserialize)]
pub struct MessageRow {
    pub message: WireMessage,
}

pub fn messages_from_rows(rows: Vec<MessageRow>) -> Vec<Message> {
    rows.into_iter()
        .map(|row| row.message.into_message())
        .collect()
}

/// Outbound message body. `to_user_id` is only present when the deal
/// owner writes into one of several counterpart threads.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_user_id: Option<i64>,
}

impl From<&MessageDraft> for MessageBody {
    fn from(draft: &MessageDraft) -> Self {
        Self {
            title: draft.title.clone(),
            message: draft.body.clone(),
            to_user_id: draft.to_user.map(UserId::raw),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadBody {
    pub with_user: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireUserSummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl WireUserSummary {
    fn into_summary(self) -> UserSummary {
        UserSummary {
            id: UserId::new(self.id),
            name: self.name,
            avatar_url: self.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WirePreview {
    pub id: i64,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireConversation {
    pub user: WireUserSummary,
    #[serde(default)]
    pub last_message: Option<WirePreview>,
    #[serde(default)]
    pub unread: u32,
}

impl WireConversation {
    pub fn into_conversation(self) -> Conversation {
        Conversation {
            peer: self.user.into_summary(),
            last_message: self.last_message.map(|preview| ConversationPreview {
                id: MessageId::new(preview.id),
                from_me: preview.from_me,
                title: preview.title,
                body: preview.message,
                sent_at: preview.created_at,
            }),
            unread: self.unread,
        }
    }
}

// ---------------------------------------------------------------------
// List envelopes (shape 3)
// ---------------------------------------------------------------------

/// `{"items":[..]}` or a bare array. Conversations and invites arrive in
/// either, depending on the backend version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Items { items: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListEnvelope<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Items { items } => items,
            ListEnvelope::Bare(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireOfferRow {
    pub deal: WireDeal,
    #[serde(default)]
    pub bid: Option<WireBid>,
    #[serde(default)]
    pub last_message: Option<WireMessage>,
}

impl WireOfferRow {
    pub fn into_offer(self) -> OfferSummary {
        OfferSummary {
            deal: self.deal.into_deal(),
            bid: self.bid.map(WireBid::into_bid),
            last_message: self.last_message.map(WireMessage::into_message),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OffersEnvelope {
    pub items: Vec<WireOfferRow>,
}

// ---------------------------------------------------------------------
// Delivery (shape 5)
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct WireDeliveryCore {
    pub from: WireLocation,
    pub to: WireLocation,
    pub value: f64,
    #[serde(default)]
    pub steps: Option<Vec<DeliveryStep>>,
}

/// Flat `{from,to,value,steps}` or enveloped `{"delivery":{..},"steps":
/// [..]}`. The envelope variant must come first so untagged decoding
/// tries it before the flat one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireDelivery {
    Enveloped {
        delivery: WireDeliveryCore,
        #[serde(default)]
        steps: Option<Vec<DeliveryStep>>,
    },
    Flat(WireDeliveryCore),
}

impl WireDelivery {
    pub fn into_delivery(self) -> Delivery {
        let (core, outer_steps) = match self {
            WireDelivery::Enveloped { delivery, steps } => (delivery, steps),
            WireDelivery::Flat(core) => (core, None),
        };
        let steps = core.steps.or(outer_steps).unwrap_or_default();
        Delivery {
            from: core.from.into_location(),
            to: core.to.into_location(),
            value: core.value,
            steps,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CalculateBody {
    pub user_id: i64,
}

// ---------------------------------------------------------------------
// Invites
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct WireInvite {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub user: Option<i64>,
    #[serde(default)]
    pub user_invited: Option<i64>,
    pub status: InviteStatus,
}

impl WireInvite {
    pub fn into_invite(self) -> Invite {
        Invite {
            id: InviteId::new(self.id),
            name: self.name,
            email: self.email,
            inviter: self.user.map(UserId::new),
            invitee: self.user_invited.map(UserId::new),
            status: self.status,
        }
    }
}

/// An invite row may come wrapped (`{"invite":{..}}`) or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InviteRow {
    Wrapped { invite: WireInvite },
    Bare(WireInvite),
}

impl InviteRow {
    pub fn into_invite(self) -> Invite {
        match self {
            InviteRow::Wrapped { invite } => invite.into_invite(),
            InviteRow::Bare(invite) => invite.into_invite(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InviteBody {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_invited: Option<i64>,
}

impl From<&InviteDraft> for InviteBody {
    fn from(draft: &InviteDraft) -> Self {
        Self {
            name: draft.name.clone(),
            email: draft.email.clone(),
            user_invited: draft.invitee.map(UserId::raw),
        }
    }
}

// ---------------------------------------------------------------------
// Users and authentication
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub location: WireLocation,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl WireUser {
    pub fn into_user(self) -> User {
        User {
            id: UserId::new(self.id),
            name: self.name,
            email: self.email,
            login: self.login,
            location: self.location.into_location(),
            avatar_url: self.avatar_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: WireUser,
}

#[derive(Debug, Deserialize)]
pub struct WireAuth {
    pub token: String,
    pub user: WireUser,
}

impl WireAuth {
    pub fn into_session(self) -> AuthSession {
        AuthSession {
            token: self.token,
            user: self.user.into_user(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub name: String,
    pub email: String,
    pub login: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub location: LocationBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<&UserDraft> for UserBody {
    fn from(draft: &UserDraft) -> Self {
        Self {
            name: draft.name.clone(),
            email: draft.email.clone(),
            login: draft.login.clone(),
            password: draft.password.clone(),
            location: LocationBody::from(&draft.location),
            avatar_url: draft.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserPatchBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationBody>,
}

impl From<&UserPatch> for UserPatchBody {
    fn from(patch: &UserPatch) -> Self {
        Self {
            name: patch.name.clone(),
            email: patch.email.clone(),
            login: patch.login.clone(),
            password: patch.password.clone(),
            location: patch.location.as_ref().map(LocationBody::from),
        }
    }
}

// ---------------------------------------------------------------------
// Rejection bodies
// ---------------------------------------------------------------------

/// Maps a rejection body into [`FieldErrors`]. A field→messages map
/// (possibly under an `"errors"` key) lands per field; a bare string,
/// array, or `{"message": ..}` becomes a single banner.
pub fn field_errors_from_body(body: &Value) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let map = match body {
        Value::Object(object) => match object.get("errors") {
            Some(Value::Object(inner)) => Some(inner),
            _ => Some(object),
        },
        Value::String(message) => {
            errors.add_general(message.clone());
            return errors;
        }
        Value::Array(messages) => {
            for message in messages {
                if let Value::String(text) = message {
                    errors.add_general(text.clone());
                }
            }
            return errors;
        }
        _ => None,
    };

    if let Some(map) = map {
        for (field, value) in map {
            if field == "message" {
                if let Value::String(text) = value {
                    errors.add_general(text.clone());
                }
                continue;
            }
            match value {
                Value::String(text) => errors.add(field.clone(), text.clone()),
                Value::Array(messages) => {
                    for message in messages {
                        if let Value::String(text) = message {
                            errors.add(field.clone(), text.clone());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if errors.is_empty() {
        errors.add_general("submission rejected");
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn owner_resolves_from_either_legacy_spot() {
        let top_level: WireDeal = serde_json::from_value(json!({
            "id": 1, "type": 1, "value": 100.0, "description": "bike",
            "location": {}, "user_id": 9,
        }))
        .unwrap();
        assert_eq!(top_level.into_deal().owner, Some(UserId::new(9)));

        let nested: WireDeal = serde_json::from_value(json!({
            "id": 1, "type": 1, "value": 100.0, "description": "bike",
            "location": {}, "user": { "id": 9 },
        }))
        .unwrap();
        assert_eq!(nested.into_deal().owner, Some(UserId::new(9)));

        let none: WireDeal = serde_json::from_value(json!({
            "id": 1, "type": 1, "value": 100.0, "description": "bike",
            "location": {},
        }))
        .unwrap();
        assert_eq!(none.into_deal().owner, None);
    }

    #[test]
    fn numeric_zip_codes_become_strings() {
        let location: WireLocation = serde_json::from_value(json!({
            "lat": -25.4, "lng": -49.2, "address": "Rua XV",
            "city": "Curitiba", "state": "PR", "zip_code": 80020010,
        }))
        .unwrap();
        assert_eq!(location.into_location().zip_code, "80020010");
    }

    #[test]
    fn wrapped_rows_flatten() {
        let rows: Vec<BidRow> = serde_json::from_value(json!([
            { "bid": { "id": 1, "user_id": 3, "value": 80.0 } },
            { "bid": { "id": 2, "user_id": 4, "value": 90.0, "accepted": true } },
        ]))
        .unwrap();
        let bids = bids_from_rows(rows);
        assert_eq!(bids.len(), 2);
        assert!(!bids[0].accepted);
        assert!(bids[1].accepted);

        let rows: Vec<MessageRow> = serde_json::from_value(json!([
            { "message": { "id": 5, "user_id": 3, "message": "hello" } },
        ]))
        .unwrap();
        assert_eq!(messages_from_rows(rows)[0].body, "hello");
    }

    #[test]
    fn list_envelope_accepts_items_and_bare_arrays() {
        let conversation = json!({ "user": { "id": 3, "name": "Ana" }, "unread": 1 });

        let enveloped: ListEnvelope<WireConversation> =
            serde_json::from_value(json!({ "items": [conversation.clone()] })).unwrap();
        assert_eq!(enveloped.into_vec().len(), 1);

        let bare: ListEnvelope<WireConversation> =
            serde_json::from_value(json!([conversation])).unwrap();
        assert_eq!(bare.into_vec().len(), 1);
    }

    #[test]
    fn delivery_decodes_flat_and_enveloped() {
        let step = json!({
            "location": "Registro/SP", "incoming_date": "2026-03-01",
            "outcoming_date": "2026-03-02",
        });
        let flat: WireDelivery = serde_json::from_value(json!({
            "from": {}, "to": {}, "value": 42.9, "steps": [step.clone()],
        }))
        .unwrap();
        assert_eq!(flat.into_delivery().steps.len(), 1);

        let beside: WireDelivery = serde_json::from_value(json!({
            "delivery": { "from": {}, "to": {}, "value": 42.9 },
            "steps": [step.clone()],
        }))
        .unwrap();
        let delivery = beside.into_delivery();
        assert_eq!(delivery.value, 42.9);
        assert_eq!(delivery.steps.len(), 1);

        let inside: WireDelivery = serde_json::from_value(json!({
            "delivery": { "from": {}, "to": {}, "value": 10.0, "steps": [step.clone(), step] },
        }))
        .unwrap();
        assert_eq!(inside.into_delivery().steps.len(), 2);
    }

    #[test]
    fn invite_rows_decode_wrapped_and_bare() {
        let invite = json!({
            "id": 7, "name": "Caio", "email": "caio@example.com",
            "user": 1, "status": "pending",
        });
        let wrapped: InviteRow =
            serde_json::from_value(json!({ "invite": invite.clone() })).unwrap();
        assert_eq!(wrapped.into_invite().id, InviteId::new(7));

        let bare: InviteRow = serde_json::from_value(invite).unwrap();
        let bare = bare.into_invite();
        assert_eq!(bare.inviter, Some(UserId::new(1)));
        assert_eq!(bare.invitee, None);
    }

    #[test]
    fn message_body_renames_outbound_fields() {
        let draft = MessageDraft::new("still available?").with_recipient(UserId::new(4));
        let body = serde_json::to_value(MessageBody::from(&draft)).unwrap();
        assert_eq!(body["message"], "still available?");
        assert_eq!(body["to_user_id"], 4);
        assert!(body.get("title").is_none());
        assert!(body.get("body").is_none());
    }

    #[test]
    fn search_body_flattens_coordinates() {
        let filters = SearchFilters::new()
            .with_term("bike")
            .with_near(trato_core::Coordinates::new(-25.4, -49.2));
        let body = serde_json::to_value(SearchBody::from(&filters)).unwrap();
        assert_eq!(body["term"], "bike");
        assert_eq!(body["lat"], -25.4);
        assert_eq!(body["lng"], -49.2);
        assert!(body.get("value_start").is_none());
    }

    #[test]
    fn field_errors_map_per_field_or_banner() {
        let mapped = field_errors_from_body(&json!({
            "value": ["must be greater than zero"],
            "description": "too short",
        }));
        assert_eq!(mapped.field("value"), ["must be greater than zero"]);
        assert_eq!(mapped.field("description"), ["too short"]);

        let nested = field_errors_from_body(&json!({ "errors": { "email": ["taken"] } }));
        assert_eq!(nested.field("email"), ["taken"]);

        let banner = field_errors_from_body(&json!("deal already closed"));
        assert_eq!(banner.general(), ["deal already closed"]);

        let message = field_errors_from_body(&json!({ "message": "not allowed" }));
        assert_eq!(message.general(), ["not allowed"]);

        let empty = field_errors_from_body(&json!(null));
        assert!(!empty.is_empty());
    }
}
