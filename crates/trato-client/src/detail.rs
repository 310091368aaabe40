//! The deal-detail orchestrator.
//!
//! One `DealView` owns everything the deal-detail screen shows: the root
//! deal, the active tab, the lazily fetched per-tab resources (bids,
//! delivery), and the chat state (thread, conversations, selected peer;
//! the chat operations live in [`crate::chat`]).
//!
//! Rules enforced here:
//!
//! - the root fetch is the gate: while it is not `Ready`, no dependent
//!   resource will fetch (a failed root is terminal for the view)
//! - tab fetches are lazy: selecting a tab fetches its resource only if
//!   it is still `Idle`; reselecting with a cache is a no-op, and a
//!   `Failed` resource waits for an explicit refresh
//! - bid mutations refetch the whole list afterwards, so server-side
//!   acceptance decisions are always reflected, never merged
//!   optimistically
//! - every fetch is token-guarded against stale responses
//!
//! State transitions are published as [`DealViewEvent`]s on a broadcast
//! channel so a front end can re-render without polling.

use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tracing::debug;

use trato_core::{Bid, BidDraft, BidId, BidPatch, Conversation, Deal, DealId, Delivery, Message,
    UserId, visible_bids};
use trato_gateway::Gateway;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::load::Load;
use crate::token::RequestToken;

/// The three tabs of the detail screen. Only `Bids` and `Delivery` have
/// an associated fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DealTab {
    #[default]
    Details,
    Bids,
    Delivery,
}

/// Published on every state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DealViewEvent {
    RootChanged,
    TabSelected(DealTab),
    BidsChanged,
    DeliveryChanged,
    ThreadChanged,
    ConversationsChanged,
    PeerChanged(Option<UserId>),
}

/// Everything a front end needs to render the detail screen. Cloned out
/// wholesale by [`DealView::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub deal: Load<Deal>,
    pub active_tab: DealTab,
    pub bids: Load<Vec<Bid>>,
    pub delivery: Load<Delivery>,
    pub thread: Load<Vec<Message>>,
    pub conversations: Load<Vec<Conversation>>,
    pub peer: Option<UserId>,
}

pub struct DealView {
    pub(crate) gateway: Arc<dyn Gateway>,
    pub(crate) config: ClientConfig,
    pub(crate) deal_id: DealId,
    pub(crate) viewer: Option<UserId>,
    pub(crate) state: RwLock<ViewState>,
    pub(crate) root_token: RequestToken,
    pub(crate) bids_token: RequestToken,
    pub(crate) delivery_token: RequestToken,
    pub(crate) thread_token: RequestToken,
    pub(crate) conversations_token: RequestToken,
    pub(crate) events: broadcast::Sender<DealViewEvent>,
}

impl DealView {
    /// A view over `deal_id` as seen by `viewer` (the session user, or
    /// `None` when signed out, in which case ownership never resolves).
    pub fn new(
        gateway: Arc<dyn Gateway>,
        viewer: Option<UserId>,
        deal_id: DealId,
        config: ClientConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity);
        Self {
            gateway,
            config,
            deal_id,
            viewer,
            state: RwLock::new(ViewState::default()),
            root_token: RequestToken::new(),
            bids_token: RequestToken::new(),
            delivery_token: RequestToken::new(),
            thread_token: RequestToken::new(),
            conversations_token: RequestToken::new(),
            events,
        }
    }

    pub fn deal_id(&self) -> DealId {
        self.deal_id
    }

    pub fn viewer(&self) -> Option<UserId> {
        self.viewer
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DealViewEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.read_state(Clone::clone)
    }

    /// The deal's owner, once the root load succeeded.
    pub fn owner(&self) -> Option<UserId> {
        self.read_state(|state| state.deal.ready().and_then(|deal| deal.owner))
    }

    /// True when the viewer published this deal.
    pub fn is_owner(&self) -> bool {
        match (self.viewer, self.owner()) {
            (Some(viewer), Some(owner)) => viewer == owner,
            _ => false,
        }
    }

    // ---- root fetch ----

    /// Loads the root deal, then kicks off what depends on it: the
    /// conversation list for the owner, or the fixed owner-thread for
    /// everyone else. Reloading supersedes any load still in flight.
    pub async fn load(&self) -> ClientResult<()> {
        let token = self.root_token.issue();
        self.write_state(|state| state.deal = Load::Loading);
        self.emit(DealViewEvent::RootChanged);

        match self.gateway.deal(self.deal_id).await {
            Ok(deal) => {
                if !self.root_token.is_current(token) {
                    debug!(deal = %self.deal_id, "discarding stale root response");
                    return Ok(());
                }
                let owner = deal.owner;
                self.write_state(|state| state.deal = Load::Ready(deal));
                self.emit(DealViewEvent::RootChanged);

                if self.is_owner() {
                    self.refresh_conversations().await?;
                    if self.config.auto_select_first_peer && self.peer().is_none() {
                        let first = self.read_state(|state| {
                            state
                                .conversations
                                .ready()
                                .and_then(|conversations| conversations.first())
                                .map(|conversation| conversation.peer.id)
                        });
                        if let Some(peer) = first {
                            self.select_peer(peer).await?;
                        }
                    }
                } else if let Some(owner) = owner {
                    // A non-owner always talks to the deal owner.
                    self.write_state(|state| state.peer = Some(owner));
                    self.emit(DealViewEvent::PeerChanged(Some(owner)));
                    self.fetch_thread().await?;
                }
                Ok(())
            }
            Err(err) => {
                if self.root_token.is_current(token) {
                    self.write_state(|state| state.deal = Load::Failed(err.to_string()));
                    self.emit(DealViewEvent::RootChanged);
                }
                Err(err.into())
            }
        }
    }

    // ---- tabs ----

    /// Activates a tab. The first selection of `Bids` or `Delivery`
    /// fetches; any later selection finds the cache and does nothing.
    pub async fn select_tab(&self, tab: DealTab) -> ClientResult<()> {
        self.write_state(|state| state.active_tab = tab);
        self.emit(DealViewEvent::TabSelected(tab));
        match tab {
            DealTab::Details => Ok(()),
            DealTab::Bids => {
                if self.read_state(|state| state.bids.is_idle()) {
                    self.refresh_bids().await
                } else {
                    Ok(())
                }
            }
            DealTab::Delivery => {
                if self.read_state(|state| state.delivery.is_idle()) {
                    self.refresh_delivery().await
                } else {
                    Ok(())
                }
            }
        }
    }

    // ---- bids ----

    /// Fetches the bid list, bypassing the tab cache. A previous list
    /// keeps rendering until the replacement lands.
    pub async fn refresh_bids(&self) -> ClientResult<()> {
        self.require_root()?;
        let token = self.bids_token.issue();
        self.write_state(|state| {
            if !state.bids.is_ready() {
                state.bids = Load::Loading;
            }
        });
        self.emit(DealViewEvent::BidsChanged);

        match self.gateway.bids(self.deal_id).await {
            Ok(bids) => {
                if self.bids_token.is_current(token) {
                    self.write_state(|state| state.bids = Load::Ready(bids));
                    self.emit(DealViewEvent::BidsChanged);
                } else {
                    debug!(deal = %self.deal_id, "discarding stale bid list");
                }
                Ok(())
            }
            Err(err) => {
                if self.bids_token.is_current(token) {
                    self.write_state(|state| state.bids = Load::Failed(err.to_string()));
                    self.emit(DealViewEvent::BidsChanged);
                }
                Err(err.into())
            }
        }
    }

    /// Places a bid, then refetches the full list so the cached state is
    /// whatever the server decided, acceptance flags included.
    pub async fn place_bid(&self, draft: &BidDraft) -> ClientResult<Bid> {
        self.require_root()?;
        let bid = self.gateway.place_bid(self.deal_id, draft).await?;
        self.refresh_bids().await?;
        Ok(bid)
    }

    /// Revises, accepts, or rejects a bid, then refetches the list.
    pub async fn update_bid(&self, bid: BidId, patch: &BidPatch) -> ClientResult<Bid> {
        self.require_root()?;
        let updated = self.gateway.update_bid(self.deal_id, bid, patch).await?;
        self.refresh_bids().await?;
        Ok(updated)
    }

    /// The bids the viewer is allowed to see: all of them for the owner,
    /// their own plus any accepted one for everyone else.
    pub fn visible_bids(&self) -> Vec<Bid> {
        self.read_state(|state| {
            let owner = state.deal.ready().and_then(|deal| deal.owner);
            state
                .bids
                .ready()
                .map(|bids| {
                    visible_bids(bids, self.viewer, owner)
                        .into_iter()
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    // ---- delivery ----

    /// Fetches the current delivery estimate, bypassing the tab cache.
    pub async fn refresh_delivery(&self) -> ClientResult<()> {
        self.require_root()?;
        let token = self.delivery_token.issue();
        self.write_state(|state| {
            if !state.delivery.is_ready() {
                state.delivery = Load::Loading;
            }
        });
        self.emit(DealViewEvent::DeliveryChanged);

        match self.gateway.delivery(self.deal_id).await {
            Ok(delivery) => {
                if self.delivery_token.is_current(token) {
                    self.write_state(|state| state.delivery = Load::Ready(delivery));
                    self.emit(DealViewEvent::DeliveryChanged);
                } else {
                    debug!(deal = %self.deal_id, "discarding stale delivery estimate");
                }
                Ok(())
            }
            Err(err) => {
                if self.delivery_token.is_current(token) {
                    self.write_state(|state| state.delivery = Load::Failed(err.to_string()));
                    self.emit(DealViewEvent::DeliveryChanged);
                }
                Err(err.into())
            }
        }
    }

    /// Asks the backend to recalculate the estimate for the viewer and
    /// replaces the cached one.
    pub async fn calculate_delivery(&self) -> ClientResult<Delivery> {
        self.require_root()?;
        let viewer = self.viewer.ok_or(ClientError::SignedOut)?;
        let token = self.delivery_token.issue();
        let delivery = self
            .gateway
            .calculate_delivery(self.deal_id, viewer)
            .await?;
        if self.delivery_token.is_current(token) {
            self.write_state(|state| state.delivery = Load::Ready(delivery.clone()));
            self.emit(DealViewEvent::DeliveryChanged);
        }
        Ok(delivery)
    }

    // ---- shared plumbing ----

    /// Dependent fetches refuse to run beneath anything but a `Ready`
    /// root.
    pub(crate) fn require_root(&self) -> ClientResult<()> {
        if self.read_state(|state| state.deal.is_ready()) {
            Ok(())
        } else {
            Err(ClientError::RootNotLoaded)
        }
    }

    pub(crate) fn read_state<R>(&self, read: impl FnOnce(&ViewState) -> R) -> R {
        read(&self.state.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub(crate) fn write_state<R>(&self, write: impl FnOnce(&mut ViewState) -> R) -> R {
        write(&mut self.state.write().unwrap_or_else(|e| e.into_inner()))
    }

    pub(crate) fn emit(&self, event: DealViewEvent) {
        // Nobody listening is fine; the state is still queryable.
        let _ = self.events.send(event);
    }
}
