//! An in-memory backend implementing the full [`Gateway`] trait.
//!
//! Used by the orchestrator test suites and by the CLI's demo mode, so
//! every flow can run without a server. It enforces the same rules the
//! real backend does for the paths the client exercises: ownership on
//! mutation, positive bid values, read-state bookkeeping, and the
//! per-counterpart conversation aggregation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let gateway = MemoryGateway::new();
//! let ana = gateway.seed_user(&UserDraft { .. });
//! let deal = gateway.seed_deal(ana.id, &draft);
//! gateway.sign_in(ana.id);
//! let bids = gateway.bids(deal.id).await?;
//! ```

use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use trato_core::{
    AuthSession, Bid, BidDraft, BidId, BidPatch, Conversation, ConversationPreview, Credentials,
    Deal, DealDraft, DealId, Delivery, DeliveryStep, FieldErrors, Invite, InviteDraft, InviteId,
    InvitePatch, InviteStatus, Message, MessageDraft, MessageId, OfferSummary, SearchFilters,
    SsoCredentials, User, UserDraft, UserId, UserPatch, haversine_km,
};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::Gateway;

struct StoredUser {
    user: User,
    password: Option<String>,
}

/// A message plus the identity of its two-party thread. The thread is
/// keyed by the non-owner participant (the counterpart).
struct StoredMessage {
    message: Message,
    counterpart: UserId,
}

pub struct MemoryGateway {
    users: DashMap<UserId, StoredUser>,
    deals: DashMap<DealId, Deal>,
    bids: DashMap<DealId, Vec<Bid>>,
    messages: DashMap<DealId, Vec<StoredMessage>>,
    invites: DashMap<InviteId, Invite>,
    deliveries: DashMap<DealId, Delivery>,
    next_id: AtomicI64,
    acting: RwLock<Option<UserId>>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            deals: DashMap::new(),
            bids: DashMap::new(),
            messages: DashMap::new(),
            invites: DashMap::new(),
            deliveries: DashMap::new(),
            next_id: AtomicI64::new(1),
            acting: RwLock::new(None),
        }
    }

    fn fresh_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    // ---- seeding and test hooks ----

    /// Registers a user directly, skipping the sign-up endpoint.
    pub fn seed_user(&self, draft: &UserDraft) -> User {
        let user = User {
            id: UserId::new(self.fresh_id()),
            name: draft.name.clone(),
            email: draft.email.clone(),
            login: draft.login.clone(),
            location: draft.location.clone(),
            avatar_url: draft.avatar_url.clone(),
        };
        self.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password: draft.password.clone(),
            },
        );
        user
    }

    /// Publishes a deal directly under `owner`.
    pub fn seed_deal(&self, owner: UserId, draft: &DealDraft) -> Deal {
        let draft = draft.normalized();
        let deal = Deal {
            id: DealId::new(self.fresh_id()),
            deal_type: draft.deal_type,
            value: draft.value,
            description: draft.description,
            trade_for: draft.trade_for,
            location: draft.location,
            urgency: draft.urgency,
            photos: draft.photos,
            owner: Some(owner),
        };
        self.deals.insert(deal.id, deal.clone());
        deal
    }

    /// Signs a user in without credentials. Test and demo side door.
    pub fn sign_in(&self, user: UserId) {
        *self.acting.write().unwrap_or_else(|e| e.into_inner()) = Some(user);
    }

    pub fn sign_out(&self) {
        *self.acting.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    // ---- internals ----

    fn acting(&self) -> GatewayResult<UserId> {
        self.acting
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .ok_or(GatewayError::SessionExpired)
    }

    fn get_deal(&self, id: DealId) -> GatewayResult<Deal> {
        self.deals
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(GatewayError::NotFound)
    }

    fn get_user(&self, id: UserId) -> GatewayResult<User> {
        self.users
            .get(&id)
            .map(|entry| entry.user.clone())
            .ok_or(GatewayError::NotFound)
    }

    fn require_owner(&self, deal: &Deal, user: UserId) -> GatewayResult<()> {
        if deal.owner == Some(user) {
            Ok(())
        } else {
            Err(GatewayError::Status {
                status: 403,
                message: "only the deal owner may do this".to_string(),
            })
        }
    }

    fn session_for(&self, user: User) -> AuthSession {
        self.sign_in(user.id);
        AuthSession {
            token: format!("memory-token-{}", user.id),
            user,
        }
    }

    fn estimate(&self, deal: &Deal, user: &User) -> Delivery {
        let km = match (deal.location.coordinates(), user.location.coordinates()) {
            (Some(from), Some(to)) => Some(haversine_km(from, to)),
            _ => None,
        };
        let value = km.map(|km| ((20.0 + 1.2 * km) * 100.0).round() / 100.0);
        Delivery {
            from: deal.location.clone(),
            to: user.location.clone(),
            value: value.unwrap_or(50.0),
            steps: vec![
                DeliveryStep {
                    location: deal.location.city.clone(),
                    incoming_date: "day 0".to_string(),
                    outcoming_date: "day 1".to_string(),
                },
                DeliveryStep {
                    location: user.location.city.clone(),
                    incoming_date: "day 3".to_string(),
                    outcoming_date: String::new(),
                },
            ],
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn authenticate(&self, credentials: &Credentials) -> GatewayResult<AuthSession> {
        let found = self.users.iter().find_map(|entry| {
            (entry.user.login == credentials.login
                && entry.password.as_deref() == Some(credentials.password.as_str()))
            .then(|| entry.user.clone())
        });
        found
            .map(|user| self.session_for(user))
            .ok_or(GatewayError::InvalidCredentials)
    }

    async fn authenticate_sso(&self, credentials: &SsoCredentials) -> GatewayResult<AuthSession> {
        // The memory backend trusts any app token for a known login.
        let found = self.users.iter().find_map(|entry| {
            (entry.user.login == credentials.login).then(|| entry.user.clone())
        });
        found
            .map(|user| self.session_for(user))
            .ok_or(GatewayError::InvalidCredentials)
    }

    async fn deal(&self, id: DealId) -> GatewayResult<Deal> {
        self.acting()?;
        self.get_deal(id)
    }

    async fn search_deals(&self, filters: &SearchFilters) -> GatewayResult<Vec<Deal>> {
        self.acting()?;
        let term = filters.term.as_deref().map(str::to_lowercase);
        let mut found: Vec<Deal> = self
            .deals
            .iter()
            .map(|entry| entry.clone())
            .filter(|deal| {
                term.as_deref()
                    .is_none_or(|term| deal.description.to_lowercase().contains(term))
                    && filters
                        .deal_type
                        .is_none_or(|deal_type| deal.deal_type == deal_type)
                    && filters.value_start.is_none_or(|start| deal.value >= start)
                    && filters.value_end.is_none_or(|end| deal.value <= end)
            })
            .collect();
        found.sort_by_key(|deal| deal.id);
        Ok(found)
    }

    async fn create_deal(&self, draft: &DealDraft) -> GatewayResult<Deal> {
        let acting = self.acting()?;
        if let Err(errors) = trato_core::validate_deal_draft(draft) {
            return Err(GatewayError::Rejected(errors));
        }
        Ok(self.seed_deal(acting, draft))
    }

    async fn update_deal(&self, id: DealId, draft: &DealDraft) -> GatewayResult<Deal> {
        let acting = self.acting()?;
        let existing = self.get_deal(id)?;
        self.require_owner(&existing, acting)?;
        if let Err(errors) = trato_core::validate_deal_draft(draft) {
            return Err(GatewayError::Rejected(errors));
        }
        let draft = draft.normalized();
        let deal = Deal {
            id,
            deal_type: draft.deal_type,
            value: draft.value,
            description: draft.description,
            trade_for: draft.trade_for,
            location: draft.location,
            urgency: draft.urgency,
            photos: draft.photos,
            owner: existing.owner,
        };
        self.deals.insert(id, deal.clone());
        Ok(deal)
    }

    async fn delete_deal(&self, id: DealId) -> GatewayResult<()> {
        let acting = self.acting()?;
        let existing = self.get_deal(id)?;
        self.require_owner(&existing, acting)?;
        self.deals.remove(&id);
        self.bids.remove(&id);
        self.messages.remove(&id);
        self.deliveries.remove(&id);
        Ok(())
    }

    async fn my_deals(&self) -> GatewayResult<Vec<Deal>> {
        let acting = self.acting()?;
        let mut mine: Vec<Deal> = self
            .deals
            .iter()
            .map(|entry| entry.clone())
            .filter(|deal| deal.owner == Some(acting))
            .collect();
        mine.sort_by_key(|deal| deal.id);
        Ok(mine)
    }

    async fn my_offers(&self) -> GatewayResult<Vec<OfferSummary>> {
        let acting = self.acting()?;
        let mut offers = Vec::new();
        for entry in self.deals.iter() {
            let deal = entry.clone();
            if deal.owner == Some(acting) {
                continue;
            }
            let bid = self.bids.get(&deal.id).and_then(|bids| {
                bids.iter().find(|bid| bid.bidder == acting).cloned()
            });
            let last_message = self.messages.get(&deal.id).and_then(|thread| {
                thread
                    .iter()
                    .filter(|stored| stored.counterpart == acting)
                    .next_back()
                    .map(|stored| stored.message.clone())
            });
            if bid.is_some() || last_message.is_some() {
                offers.push(OfferSummary {
                    deal,
                    bid,
                    last_message,
                });
            }
        }
        offers.sort_by_key(|offer| offer.deal.id);
        Ok(offers)
    }

    async fn bids(&self, deal: DealId) -> GatewayResult<Vec<Bid>> {
        self.acting()?;
        self.get_deal(deal)?;
        Ok(self
            .bids
            .get(&deal)
            .map(|bids| bids.clone())
            .unwrap_or_default())
    }

    async fn place_bid(&self, deal: DealId, draft: &BidDraft) -> GatewayResult<Bid> {
        let acting = self.acting()?;
        let existing = self.get_deal(deal)?;
        if existing.owner == Some(acting) {
            return Err(GatewayError::Rejected(FieldErrors::banner(
                "the deal owner cannot bid on their own deal",
            )));
        }
        if draft.value <= 0.0 {
            let mut errors = FieldErrors::new();
            errors.add("value", "must be greater than zero");
            return Err(GatewayError::Rejected(errors));
        }
        let bid = Bid {
            id: BidId::new(self.fresh_id()),
            bidder: acting,
            value: draft.value,
            description: draft.description.clone(),
            accepted: false,
        };
        self.bids.entry(deal).or_default().push(bid.clone());
        Ok(bid)
    }

    async fn update_bid(&self, deal: DealId, bid: BidId, patch: &BidPatch) -> GatewayResult<Bid> {
        let acting = self.acting()?;
        let existing = self.get_deal(deal)?;
        // Acceptance is the owner's call; revising the offer is the
        // bidder's. Single-acceptance cardinality is enforced here the
        // way the backend does it: accepting one bid rejects the rest.
        if patch.accepted.is_some() {
            self.require_owner(&existing, acting)?;
        }
        let mut bids = self.bids.entry(deal).or_default();
        let accepting = patch.accepted == Some(true);
        let mut updated = None;
        for stored in bids.iter_mut() {
            if stored.id == bid {
                if let Some(value) = patch.value {
                    stored.value = value;
                }
                if let Some(description) = &patch.description {
                    stored.description = description.clone();
                }
                if let Some(accepted) = patch.accepted {
                    stored.accepted = accepted;
                }
                updated = Some(stored.clone());
            } else if accepting {
                stored.accepted = false;
            }
        }
        updated.ok_or(GatewayError::NotFound)
    }

    async fn messages(
        &self,
        deal: DealId,
        with_user: Option<UserId>,
    ) -> GatewayResult<Vec<Message>> {
        let acting = self.acting()?;
        let existing = self.get_deal(deal)?;
        let counterpart = if existing.owner == Some(acting) {
            with_user
        } else {
            Some(acting)
        };
        Ok(self
            .messages
            .get(&deal)
            .map(|thread| {
                thread
                    .iter()
                    .filter(|stored| {
                        counterpart.is_none_or(|counterpart| stored.counterpart == counterpart)
                    })
                    .map(|stored| stored.message.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn send_message(&self, deal: DealId, draft: &MessageDraft) -> GatewayResult<Message> {
        let acting = self.acting()?;
        let existing = self.get_deal(deal)?;
        let counterpart = if existing.owner == Some(acting) {
            draft.to_user.ok_or_else(|| {
                GatewayError::Rejected(FieldErrors::banner(
                    "the deal owner must address a counterpart",
                ))
            })?
        } else {
            acting
        };
        let message = Message {
            id: MessageId::new(self.fresh_id()),
            sender: acting,
            title: draft.title.clone(),
            body: draft.body.clone(),
            sent_at: Some(Utc::now()),
            read_at: None,
        };
        self.messages.entry(deal).or_default().push(StoredMessage {
            message: message.clone(),
            counterpart,
        });
        Ok(message)
    }

    async fn mark_read(&self, deal: DealId, with_user: UserId) -> GatewayResult<()> {
        let acting = self.acting()?;
        let existing = self.get_deal(deal)?;
        let counterpart = if existing.owner == Some(acting) {
            with_user
        } else {
            acting
        };
        if let Some(mut thread) = self.messages.get_mut(&deal) {
            for stored in thread.iter_mut() {
                if stored.counterpart == counterpart
                    && stored.message.sender != acting
                    && stored.message.read_at.is_none()
                {
                    stored.message.read_at = Some(Utc::now());
                }
            }
        }
        Ok(())
    }

    async fn conversations(&self, deal: DealId) -> GatewayResult<Vec<Conversation>> {
        let acting = self.acting()?;
        let existing = self.get_deal(deal)?;
        self.require_owner(&existing, acting)?;

        let mut counterparts: Vec<UserId> = Vec::new();
        let mut conversations = Vec::new();
        if let Some(thread) = self.messages.get(&deal) {
            for stored in thread.iter() {
                if !counterparts.contains(&stored.counterpart) {
                    counterparts.push(stored.counterpart);
                }
            }
            for counterpart in counterparts {
                let rows: Vec<&StoredMessage> = thread
                    .iter()
                    .filter(|stored| stored.counterpart == counterpart)
                    .collect();
                let unread = rows
                    .iter()
                    .filter(|stored| {
                        stored.message.sender == counterpart && stored.message.read_at.is_none()
                    })
                    .count() as u32;
                let peer = self
                    .users
                    .get(&counterpart)
                    .map(|entry| entry.user.summary())
                    .unwrap_or(trato_core::UserSummary {
                        id: counterpart,
                        name: format!("User {counterpart}"),
                        avatar_url: None,
                    });
                let last_message = rows.last().map(|stored| ConversationPreview {
                    id: stored.message.id,
                    from_me: stored.message.sender != counterpart,
                    title: stored.message.title.clone(),
                    body: stored.message.body.clone(),
                    sent_at: stored.message.sent_at,
                });
                conversations.push(Conversation {
                    peer,
                    last_message,
                    unread,
                });
            }
        }
        Ok(conversations)
    }

    async fn delivery(&self, deal: DealId) -> GatewayResult<Delivery> {
        let acting = self.acting()?;
        let existing = self.get_deal(deal)?;
        if let Some(cached) = self.deliveries.get(&deal) {
            return Ok(cached.clone());
        }
        let user = self.get_user(acting)?;
        let estimate = self.estimate(&existing, &user);
        self.deliveries.insert(deal, estimate.clone());
        Ok(estimate)
    }

    async fn calculate_delivery(&self, deal: DealId, user: UserId) -> GatewayResult<Delivery> {
        self.acting()?;
        let existing = self.get_deal(deal)?;
        let user = self.get_user(user)?;
        let estimate = self.estimate(&existing, &user);
        self.deliveries.insert(deal, estimate.clone());
        Ok(estimate)
    }

    async fn invites(&self) -> GatewayResult<Vec<Invite>> {
        let acting = self.acting()?;
        let mut mine: Vec<Invite> = self
            .invites
            .iter()
            .map(|entry| entry.clone())
            .filter(|invite| invite.inviter == Some(acting))
            .collect();
        mine.sort_by_key(|invite| invite.id);
        Ok(mine)
    }

    async fn create_invite(&self, draft: &InviteDraft) -> GatewayResult<Invite> {
        let acting = self.acting()?;
        if let Err(errors) = trato_core::validate_invite_draft(draft) {
            return Err(GatewayError::Rejected(errors));
        }
        let invite = Invite {
            id: InviteId::new(self.fresh_id()),
            name: draft.name.clone(),
            email: draft.email.clone(),
            inviter: Some(acting),
            invitee: draft.invitee,
            status: InviteStatus::Pending,
        };
        self.invites.insert(invite.id, invite.clone());
        Ok(invite)
    }

    async fn update_invite(&self, id: InviteId, patch: &InvitePatch) -> GatewayResult<Invite> {
        self.acting()?;
        let mut entry = self.invites.get_mut(&id).ok_or(GatewayError::NotFound)?;
        if let Some(name) = &patch.name {
            entry.name = name.clone();
        }
        if let Some(email) = &patch.email {
            entry.email = email.clone();
        }
        if let Some(status) = patch.status {
            entry.status = status;
        }
        Ok(entry.clone())
    }

    async fn delete_invite(&self, id: InviteId) -> GatewayResult<()> {
        self.acting()?;
        self.invites
            .remove(&id)
            .map(|_| ())
            .ok_or(GatewayError::NotFound)
    }

    async fn user(&self, id: UserId) -> GatewayResult<User> {
        self.acting()?;
        self.get_user(id)
    }

    async fn create_user(&self, draft: &UserDraft) -> GatewayResult<User> {
        // Sign-up needs no session.
        if self
            .users
            .iter()
            .any(|entry| entry.user.login == draft.login)
        {
            let mut errors = FieldErrors::new();
            errors.add("login", "already taken");
            return Err(GatewayError::Rejected(errors));
        }
        Ok(self.seed_user(draft))
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> GatewayResult<User> {
        let acting = self.acting()?;
        if acting != id {
            return Err(GatewayError::Status {
                status: 403,
                message: "profiles can only be edited by their owner".to_string(),
            });
        }
        let mut entry = self.users.get_mut(&id).ok_or(GatewayError::NotFound)?;
        if let Some(name) = &patch.name {
            entry.user.name = name.clone();
        }
        if let Some(email) = &patch.email {
            entry.user.email = email.clone();
        }
        if let Some(login) = &patch.login {
            entry.user.login = login.clone();
        }
        if let Some(password) = &patch.password {
            entry.password = Some(password.clone());
        }
        if let Some(location) = &patch.location {
            entry.user.location = location.clone();
        }
        Ok(entry.user.clone())
    }
}
