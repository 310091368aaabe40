//! Shared fixtures for the orchestrator suites: seed data builders, a
//! call-counting gateway wrapper, and a gateway whose fetches can be held
//! open mid-flight to exercise overlapping requests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use trato_core::{
    AuthSession, Bid, BidDraft, BidId, BidPatch, Conversation, Credentials, Deal, DealDraft,
    DealId, DealType, Delivery, Invite, InviteDraft, InviteId, InvitePatch, Location, Message,
    MessageDraft, OfferSummary, SearchFilters, SsoCredentials, Urgency, User, UserDraft, UserId,
    UserPatch,
};
use trato_gateway::{Gateway, GatewayResult, MemoryGateway};

pub fn user_draft(name: &str, login: &str, city: &str, coords: (f64, f64)) -> UserDraft {
    UserDraft {
        name: name.to_string(),
        email: format!("{login}@example.com"),
        login: login.to_string(),
        password: Some("secret".to_string()),
        location: Location {
            lat: Some(coords.0),
            lng: Some(coords.1),
            address: "Rua Principal, 1".to_string(),
            city: city.to_string(),
            state: "PR".to_string(),
            zip_code: "80020010".to_string(),
        },
        avatar_url: None,
    }
}

pub fn deal_draft(description: &str, value: f64, coords: Option<(f64, f64)>) -> DealDraft {
    DealDraft {
        deal_type: DealType::Sale,
        value,
        description: description.to_string(),
        trade_for: None,
        location: Location {
            lat: coords.map(|(lat, _)| lat),
            lng: coords.map(|(_, lng)| lng),
            address: "Av. Central, 100".to_string(),
            city: "Curitiba".to_string(),
            state: "PR".to_string(),
            zip_code: "80020010".to_string(),
        },
        urgency: Urgency::default(),
        photos: vec![],
    }
}

/// Counts calls per endpoint family while delegating everything to the
/// in-memory backend.
pub struct CountingGateway {
    pub inner: Arc<MemoryGateway>,
    pub search_calls: AtomicUsize,
    pub bid_list_calls: AtomicUsize,
    pub delivery_calls: AtomicUsize,
    pub message_list_calls: AtomicUsize,
    pub conversation_calls: AtomicUsize,
}

impl CountingGateway {
    pub fn new(inner: Arc<MemoryGateway>) -> Self {
        Self {
            inner,
            search_calls: AtomicUsize::new(0),
            bid_list_calls: AtomicUsize::new(0),
            delivery_calls: AtomicUsize::new(0),
            message_list_calls: AtomicUsize::new(0),
            conversation_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Gateway for CountingGateway {
    async fn authenticate(&self, credentials: &Credentials) -> GatewayResult<AuthSession> {
        self.inner.authenticate(credentials).await
    }

    async fn authenticate_sso(&self, credentials: &SsoCredentials) -> GatewayResult<AuthSession> {
        self.inner.authenticate_sso(credentials).await
    }

    async fn deal(&self, id: DealId) -> GatewayResult<Deal> {
        self.inner.deal(id).await
    }

    async fn search_deals(&self, filters: &SearchFilters) -> GatewayResult<Vec<Deal>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.search_deals(filters).await
    }

    async fn create_deal(&self, draft: &DealDraft) -> GatewayResult<Deal> {
        self.inner.create_deal(draft).await
    }

    async fn update_deal(&self, id: DealId, draft: &DealDraft) -> GatewayResult<Deal> {
        self.inner.update_deal(id, draft).await
    }

    async fn delete_deal(&self, id: DealId) -> GatewayResult<()> {
        self.inner.delete_deal(id).await
    }

    async fn my_deals(&self) -> GatewayResult<Vec<Deal>> {
        self.inner.my_deals().await
    }

    async fn my_offers(&self) -> GatewayResult<Vec<OfferSummary>> {
        self.inner.my_offers().await
    }

    async fn bids(&self, deal: DealId) -> GatewayResult<Vec<Bid>> {
        self.bid_list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.bids(deal).await
    }

    async fn place_bid(&self, deal: DealId, draft: &BidDraft) -> GatewayResult<Bid> {
        self.inner.place_bid(deal, draft).await
    }

    async fn update_bid(&self, deal: DealId, bid: BidId, patch: &BidPatch) -> GatewayResult<Bid> {
        self.inner.update_bid(deal, bid, patch).await
    }

    async fn messages(
        &self,
        deal: DealId,
        with_user: Option<UserId>,
    ) -> GatewayResult<Vec<Message>> {
        self.message_list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.messages(deal, with_user).await
    }

    async fn send_message(&self, deal: DealId, draft: &MessageDraft) -> GatewayResult<Message> {
        self.inner.send_message(deal, draft).await
    }

    async fn mark_read(&self, deal: DealId, with_user: UserId) -> GatewayResult<()> {
        self.inner.mark_read(deal, with_user).await
    }

    async fn conversations(&self, deal: DealId) -> GatewayResult<Vec<Conversation>> {
        self.conversation_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.conversations(deal).await
    }

    async fn delivery(&self, deal: DealId) -> GatewayResult<Delivery> {
        self.delivery_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delivery(deal).await
    }

    async fn calculate_delivery(&self, deal: DealId, user: UserId) -> GatewayResult<Delivery> {
        self.inner.calculate_delivery(deal, user).await
    }

    async fn invites(&self) -> GatewayResult<Vec<Invite>> {
        self.inner.invites().await
    }

    async fn create_invite(&self, draft: &InviteDraft) -> GatewayResult<Invite> {
        self.inner.create_invite(draft).await
    }

    async fn update_invite(&self, id: InviteId, patch: &InvitePatch) -> GatewayResult<Invite> {
        self.inner.update_invite(id, patch).await
    }

    async fn delete_invite(&self, id: InviteId) -> GatewayResult<()> {
        self.inner.delete_invite(id).await
    }

    async fn user(&self, id: UserId) -> GatewayResult<User> {
        self.inner.user(id).await
    }

    async fn create_user(&self, draft: &UserDraft) -> GatewayResult<User> {
        self.inner.create_user(draft).await
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> GatewayResult<User> {
        self.inner.update_user(id, patch).await
    }
}

/// Which fetch the [`GatedGateway`] holds open.
#[derive(Clone, Copy, PartialEq)]
pub enum Gate {
    /// Every `messages` call waits at the gate.
    Messages,
    /// Only the first `bids` call waits, and it resolves to an empty
    /// (stale) list; later calls pass straight through to the backend.
    FirstBids,
}

/// Delegates to [`MemoryGateway`] but parks the gated fetch until the
/// test releases it, so two overlapping requests can be interleaved
/// deterministically. `entered` gains a permit when a call reaches the
/// gate; add a permit to `release` to let it through.
pub struct GatedGateway {
    pub inner: Arc<MemoryGateway>,
    gate: Gate,
    bid_calls: AtomicUsize,
    pub entered: Semaphore,
    pub release: Semaphore,
}

impl GatedGateway {
    pub fn new(inner: Arc<MemoryGateway>, gate: Gate) -> Self {
        Self {
            inner,
            gate,
            bid_calls: AtomicUsize::new(0),
            entered: Semaphore::new(0),
            release: Semaphore::new(0),
        }
    }

    async fn wait_at_gate(&self) {
        self.entered.add_permits(1);
        self.release.acquire().await.unwrap().forget();
    }

    /// Blocks until a gated call is parked at the gate.
    pub async fn wait_for_entry(&self) {
        self.entered.acquire().await.unwrap().forget();
    }

    pub fn open_gate(&self) {
        self.release.add_permits(1);
    }
}

#[async_trait]
impl Gateway for GatedGateway {
    async fn authenticate(&self, credentials: &Credentials) -> GatewayResult<AuthSession> {
        self.inner.authenticate(credentials).await
    }

    async fn authenticate_sso(&self, credentials: &SsoCredentials) -> GatewayResult<AuthSession> {
        self.inner.authenticate_sso(credentials).await
    }

    async fn deal(&self, id: DealId) -> GatewayResult<Deal> {
        self.inner.deal(id).await
    }

    async fn search_deals(&self, filters: &SearchFilters) -> GatewayResult<Vec<Deal>> {
        self.inner.search_deals(filters).await
    }

    async fn create_deal(&self, draft: &DealDraft) -> GatewayResult<Deal> {
        self.inner.create_deal(draft).await
    }

    async fn update_deal(&self, id: DealId, draft: &DealDraft) -> GatewayResult<Deal> {
        self.inner.update_deal(id, draft).await
    }

    async fn delete_deal(&self, id: DealId) -> GatewayResult<()> {
        self.inner.delete_deal(id).await
    }

    async fn my_deals(&self) -> GatewayResult<Vec<Deal>> {
        self.inner.my_deals().await
    }

    async fn my_offers(&self) -> GatewayResult<Vec<OfferSummary>> {
        self.inner.my_offers().await
    }

    async fn bids(&self, deal: DealId) -> GatewayResult<Vec<Bid>> {
        if self.gate == Gate::FirstBids && self.bid_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.wait_at_gate().await;
            return Ok(vec![]);
        }
        self.inner.bids(deal).await
    }

    async fn place_bid(&self, deal: DealId, draft: &BidDraft) -> GatewayResult<Bid> {
        self.inner.place_bid(deal, draft).await
    }

    async fn update_bid(&self, deal: DealId, bid: BidId, patch: &BidPatch) -> GatewayResult<Bid> {
        self.inner.update_bid(deal, bid, patch).await
    }

    async fn messages(
        &self,
        deal: DealId,
        with_user: Option<UserId>,
    ) -> GatewayResult<Vec<Message>> {
        if self.gate == Gate::Messages {
            self.wait_at_gate().await;
        }
        self.inner.messages(deal, with_user).await
    }

    async fn send_message(&self, deal: DealId, draft: &MessageDraft) -> GatewayResult<Message> {
        self.inner.send_message(deal, draft).await
    }

    async fn mark_read(&self, deal: DealId, with_user: UserId) -> GatewayResult<()> {
        self.inner.mark_read(deal, with_user).await
    }

    async fn conversations(&self, deal: DealId) -> GatewayResult<Vec<Conversation>> {
        self.inner.conversations(deal).await
    }

    async fn delivery(&self, deal: DealId) -> GatewayResult<Delivery> {
        self.inner.delivery(deal).await
    }

    async fn calculate_delivery(&self, deal: DealId, user: UserId) -> GatewayResult<Delivery> {
        self.inner.calculate_delivery(deal, user).await
    }

    async fn invites(&self) -> GatewayResult<Vec<Invite>> {
        self.inner.invites().await
    }

    async fn create_invite(&self, draft: &InviteDraft) -> GatewayResult<Invite> {
        self.inner.create_invite(draft).await
    }

    async fn update_invite(&self, id: InviteId, patch: &InvitePatch) -> GatewayResult<Invite> {
        self.inner.update_invite(id, patch).await
    }

    async fn delete_invite(&self, id: InviteId) -> GatewayResult<()> {
        self.inner.delete_invite(id).await
    }

    async fn user(&self, id: UserId) -> GatewayResult<User> {
        self.inner.user(id).await
    }

    async fn create_user(&self, draft: &UserDraft) -> GatewayResult<User> {
        self.inner.create_user(draft).await
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> GatewayResult<User> {
        self.inner.update_user(id, patch).await
    }
}
