//! The real backend, over HTTP.
//!
//! `HttpGateway` is a thin typed veneer: it builds the request, attaches
//! the bearer token when a session exists, and pushes the response
//! through [`wire`] so callers only ever see canonical types.
//!
//! The 401 policy lives here: a 401 from the authenticate endpoints is
//! just bad credentials, but a 401 from anywhere else means the stored
//! session is dead, so it is cleared on the spot and the caller gets
//! [`GatewayError::SessionExpired`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use trato_core::{
    AuthSession, Bid, BidDraft, BidId, BidPatch, Conversation, Credentials, Deal, DealDraft,
    DealId, Delivery, Invite, InviteDraft, InviteId, InvitePatch, Message, MessageDraft,
    OfferSummary, SearchFilters, SsoCredentials, User, UserDraft, UserId, UserPatch,
};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::Gateway;
use crate::session::SessionStore;
use crate::wire;

/// Transport-level timeout, matching the backend's own expectations.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether a 401 means bad credentials or a dead session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Auth,
    Protected,
}

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl HttpGateway {
    /// A gateway rooted at `base_url` (no trailing slash) that reads its
    /// bearer token from `session`.
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> GatewayResult<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Maps a non-success response onto the error taxonomy. Consumes the
    /// response for rejection bodies.
    async fn check(&self, route: Route, response: Response) -> GatewayResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::UNAUTHORIZED if route == Route::Auth => {
                Err(GatewayError::InvalidCredentials)
            }
            StatusCode::UNAUTHORIZED => {
                warn!("401 from a protected endpoint, clearing session");
                self.session.clear();
                Err(GatewayError::SessionExpired)
            }
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let body: Value = response.json().await.unwrap_or(Value::Null);
                Err(GatewayError::Rejected(wire::field_errors_from_body(&body)))
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(GatewayError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        route: Route,
        builder: RequestBuilder,
    ) -> GatewayResult<T> {
        let response = builder.send().await?;
        let response = self.check(route, response).await?;
        let text = response.text().await?;
        debug!(bytes = text.len(), "response received");
        Ok(serde_json::from_str(&text)?)
    }

    /// For endpoints whose response body carries nothing we need.
    async fn execute(&self, builder: RequestBuilder) -> GatewayResult<()> {
        let response = builder.send().await?;
        self.check(Route::Protected, response).await?;
        Ok(())
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn authenticate(&self, credentials: &Credentials) -> GatewayResult<AuthSession> {
        let builder = self
            .request(Method::POST, "/authenticate")
            .json(credentials);
        let auth: wire::WireAuth = self.fetch(Route::Auth, builder).await?;
        Ok(auth.into_session())
    }

    async fn authenticate_sso(&self, credentials: &SsoCredentials) -> GatewayResult<AuthSession> {
        let builder = self
            .request(Method::POST, "/authenticate/sso")
            .json(credentials);
        let auth: wire::WireAuth = self.fetch(Route::Auth, builder).await?;
        Ok(auth.into_session())
    }

    async fn deal(&self, id: DealId) -> GatewayResult<Deal> {
        let builder = self.request(Method::GET, &format!("/deal/{id}"));
        let envelope: wire::DealEnvelope = self.fetch(Route::Protected, builder).await?;
        Ok(envelope.deal.into_deal())
    }

    async fn search_deals(&self, filters: &SearchFilters) -> GatewayResult<Vec<Deal>> {
        let builder = self
            .request(Method::POST, "/deal/search")
            .json(&wire::SearchBody::from(filters));
        let rows: Vec<wire::DealRow> = self.fetch(Route::Protected, builder).await?;
        Ok(wire::deals_from_rows(rows))
    }

    async fn create_deal(&self, draft: &DealDraft) -> GatewayResult<Deal> {
        let builder = self
            .request(Method::POST, "/deal")
            .json(&wire::DealBody::from(draft));
        let envelope: wire::DealEnvelope = self.fetch(Route::Protected, builder).await?;
        Ok(envelope.deal.into_deal())
    }

    async fn update_deal(&self, id: DealId, draft: &DealDraft) -> GatewayResult<Deal> {
        let builder = self
            .request(Method::PUT, &format!("/deal/{id}"))
            .json(&wire::DealBody::from(draft));
        let envelope: wire::DealEnvelope = self.fetch(Route::Protected, builder).await?;
        Ok(envelope.deal.into_deal())
    }

    async fn delete_deal(&self, id: DealId) -> GatewayResult<()> {
        self.execute(self.request(Method::DELETE, &format!("/deal/{id}")))
            .await
    }

    async fn my_deals(&self) -> GatewayResult<Vec<Deal>> {
        let builder = self.request(Method::GET, "/me/deals");
        let envelope: wire::DealsEnvelope = self.fetch(Route::Protected, builder).await?;
        Ok(envelope
            .deals
            .into_iter()
            .map(wire::WireDeal::into_deal)
            .collect())
    }

    async fn my_offers(&self) -> GatewayResult<Vec<OfferSummary>> {
        let builder = self.request(Method::GET, "/me/offers");
        let envelope: wire::OffersEnvelope = self.fetch(Route::Protected, builder).await?;
        Ok(envelope
            .items
            .into_iter()
            .map(wire::WireOfferRow::into_offer)
            .collect())
    }

    async fn bids(&self, deal: DealId) -> GatewayResult<Vec<Bid>> {
        let builder = self.request(Method::GET, &format!("/deal/{deal}/bid"));
        let rows: Vec<wire::BidRow> = self.fetch(Route::Protected, builder).await?;
        Ok(wire::bids_from_rows(rows))
    }

    async fn place_bid(&self, deal: DealId, draft: &BidDraft) -> GatewayResult<Bid> {
        let builder = self
            .request(Method::POST, &format!("/deal/{deal}/bid"))
            .json(&wire::BidBody::from(draft));
        let envelope: wire::BidEnvelope = self.fetch(Route::Protected, builder).await?;
        Ok(envelope.bid.into_bid())
    }

    async fn update_bid(&self, deal: DealId, bid: BidId, patch: &BidPatch) -> GatewayResult<Bid> {
        let builder = self
            .request(Method::PUT, &format!("/deal/{deal}/bid/{bid}"))
            .json(patch);
        let envelope: wire::BidEnvelope = self.fetch(Route::Protected, builder).await?;
        Ok(envelope.bid.into_bid())
    }

    async fn messages(
        &self,
        deal: DealId,
        with_user: Option<UserId>,
    ) -> GatewayResult<Vec<Message>> {
        let mut builder = self.request(Method::GET, &format!("/deal/{deal}/message"));
        if let Some(peer) = with_user {
            builder = builder.query(&[("with_user", peer.raw())]);
        }
        let rows: Vec<wire::MessageRow> = self.fetch(Route::Protected, builder).await?;
        Ok(wire::messages_from_rows(rows))
    }

    async fn send_message(&self, deal: DealId, draft: &MessageDraft) -> GatewayResult<Message> {
        let builder = self
            .request(Method::POST, &format!("/deal/{deal}/message"))
            .json(&wire::MessageBody::from(draft));
        let envelope: wire::MessageEnvelope = self.fetch(Route::Protected, builder).await?;
        Ok(envelope.message.into_message())
    }

    async fn mark_read(&self, deal: DealId, with_user: UserId) -> GatewayResult<()> {
        let builder = self
            .request(Method::POST, &format!("/deal/{deal}/message/read"))
            .json(&wire::ReadBody {
                with_user: with_user.raw(),
            });
        self.execute(builder).await
    }

    async fn conversations(&self, deal: DealId) -> GatewayResult<Vec<Conversation>> {
        let builder = self.request(Method::GET, &format!("/deal/{deal}/conversations"));
        let envelope: wire::ListEnvelope<wire::WireConversation> =
            self.fetch(Route::Protected, builder).await?;
        Ok(envelope
            .into_vec()
            .into_iter()
            .map(wire::WireConversation::into_conversation)
            .collect())
    }

    async fn delivery(&self, deal: DealId) -> GatewayResult<Delivery> {
        let builder = self.request(Method::GET, &format!("/deal/{deal}/delivery"));
        let payload: wire::WireDelivery = self.fetch(Route::Protected, builder).await?;
        Ok(payload.into_delivery())
    }

    async fn calculate_delivery(&self, deal: DealId, user: UserId) -> GatewayResult<Delivery> {
        let builder = self
            .request(Method::POST, &format!("/deal/{deal}/delivery"))
            .json(&wire::CalculateBody {
                user_id: user.raw(),
            });
        let payload: wire::WireDelivery = self.fetch(Route::Protected, builder).await?;
        Ok(payload.into_delivery())
    }

    async fn invites(&self) -> GatewayResult<Vec<Invite>> {
        let builder = self.request(Method::GET, "/invites");
        let envelope: wire::ListEnvelope<wire::InviteRow> =
            self.fetch(Route::Protected, builder).await?;
        Ok(envelope
            .into_vec()
            .into_iter()
            .map(wire::InviteRow::into_invite)
            .collect())
    }

    async fn create_invite(&self, draft: &InviteDraft) -> GatewayResult<Invite> {
        let builder = self
            .request(Method::POST, "/invites")
            .json(&wire::InviteBody::from(draft));
        let row: wire::InviteRow = self.fetch(Route::Protected, builder).await?;
        Ok(row.into_invite())
    }

    async fn update_invite(&self, id: InviteId, patch: &InvitePatch) -> GatewayResult<Invite> {
        let builder = self
            .request(Method::PUT, &format!("/invites/{id}"))
            .json(patch);
        let row: wire::InviteRow = self.fetch(Route::Protected, builder).await?;
        Ok(row.into_invite())
    }

    async fn delete_invite(&self, id: InviteId) -> GatewayResult<()> {
        self.execute(self.request(Method::DELETE, &format!("/invites/{id}")))
            .await
    }

    async fn user(&self, id: UserId) -> GatewayResult<User> {
        let builder = self.request(Method::GET, &format!("/user/{id}"));
        let envelope: wire::UserEnvelope = self.fetch(Route::Protected, builder).await?;
        Ok(envelope.user.into_user())
    }

    async fn create_user(&self, draft: &UserDraft) -> GatewayResult<User> {
        let builder = self
            .request(Method::POST, "/user")
            .json(&wire::UserBody::from(draft));
        let envelope: wire::UserEnvelope = self.fetch(Route::Protected, builder).await?;
        Ok(envelope.user.into_user())
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> GatewayResult<User> {
        let builder = self
            .request(Method::PUT, &format!("/user/{id}"))
            .json(&wire::UserPatchBody::from(patch));
        let envelope: wire::UserEnvelope = self.fetch(Route::Protected, builder).await?;
        Ok(envelope.user.into_user())
    }
}
