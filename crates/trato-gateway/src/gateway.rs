//! The Remote Data Gateway port.
//!
//! One trait method per backend endpoint, speaking canonical
//! [`trato_core`] types on both sides. The orchestration layer only ever
//! sees this trait, so it runs identically against [`HttpGateway`] and
//! [`MemoryGateway`].
//!
//! [`HttpGateway`]: crate::http::HttpGateway
//! [`MemoryGateway`]: crate::memory::MemoryGateway

use async_trait::async_trait;

use trato_core::{
    AuthSession, Bid, BidDraft, BidId, BidPatch, Conversation, Credentials, Deal, DealDraft,
    DealId, Delivery, Invite, InviteDraft, InviteId, InvitePatch, Message, MessageDraft,
    OfferSummary, SearchFilters, SsoCredentials, User, UserDraft, UserId, UserPatch,
};

use crate::error::GatewayResult;

/// The backend, as the client sees it.
#[async_trait]
pub trait Gateway: Send + Sync {
    // ---- authentication ----

    /// POST /authenticate
    async fn authenticate(&self, credentials: &Credentials) -> GatewayResult<AuthSession>;

    /// POST /authenticate/sso
    async fn authenticate_sso(&self, credentials: &SsoCredentials) -> GatewayResult<AuthSession>;

    // ---- deals ----

    /// GET /deal/{id}
    async fn deal(&self, id: DealId) -> GatewayResult<Deal>;

    /// POST /deal/search
    async fn search_deals(&self, filters: &SearchFilters) -> GatewayResult<Vec<Deal>>;

    /// POST /deal
    async fn create_deal(&self, draft: &DealDraft) -> GatewayResult<Deal>;

    /// PUT /deal/{id}
    async fn update_deal(&self, id: DealId, draft: &DealDraft) -> GatewayResult<Deal>;

    /// DELETE /deal/{id}
    async fn delete_deal(&self, id: DealId) -> GatewayResult<()>;

    /// GET /me/deals
    async fn my_deals(&self) -> GatewayResult<Vec<Deal>>;

    /// GET /me/offers
    async fn my_offers(&self) -> GatewayResult<Vec<OfferSummary>>;

    // ---- bids ----

    /// GET /deal/{id}/bid
    async fn bids(&self, deal: DealId) -> GatewayResult<Vec<Bid>>;

    /// POST /deal/{id}/bid
    async fn place_bid(&self, deal: DealId, draft: &BidDraft) -> GatewayResult<Bid>;

    /// PUT /deal/{id}/bid/{bidId}
    async fn update_bid(&self, deal: DealId, bid: BidId, patch: &BidPatch) -> GatewayResult<Bid>;

    // ---- messages ----

    /// GET /deal/{id}/message, optionally filtered to one counterpart's
    /// thread (`with_user`, owner only).
    async fn messages(&self, deal: DealId, with_user: Option<UserId>)
    -> GatewayResult<Vec<Message>>;

    /// POST /deal/{id}/message
    async fn send_message(&self, deal: DealId, draft: &MessageDraft) -> GatewayResult<Message>;

    /// POST /deal/{id}/message/read
    async fn mark_read(&self, deal: DealId, with_user: UserId) -> GatewayResult<()>;

    /// GET /deal/{id}/conversations
    async fn conversations(&self, deal: DealId) -> GatewayResult<Vec<Conversation>>;

    // ---- delivery ----

    /// GET /deal/{id}/delivery
    async fn delivery(&self, deal: DealId) -> GatewayResult<Delivery>;

    /// POST /deal/{id}/delivery
    async fn calculate_delivery(&self, deal: DealId, user: UserId) -> GatewayResult<Delivery>;

    // ---- invites ----

    /// GET /invites
    async fn invites(&self) -> GatewayResult<Vec<Invite>>;

    /// POST /invites
    async fn create_invite(&self, draft: &InviteDraft) -> GatewayResult<Invite>;

    /// PUT /invites/{id}
    async fn update_invite(&self, id: InviteId, patch: &InvitePatch) -> GatewayResult<Invite>;

    /// DELETE /invites/{id}
    async fn delete_invite(&self, id: InviteId) -> GatewayResult<()>;

    // ---- users ----

    /// GET /user/{id}
    async fn user(&self, id: UserId) -> GatewayResult<User>;

    /// POST /user (sign-up, no session required)
    async fn create_user(&self, draft: &UserDraft) -> GatewayResult<User>;

    /// PUT /user/{id}
    async fn update_user(&self, id: UserId, patch: &UserPatch) -> GatewayResult<User>;
}
