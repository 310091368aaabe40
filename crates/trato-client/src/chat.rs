//! The chat half of [`DealView`]: which two-party thread is active, and
//! how it stays in sync with the backend's read-state bookkeeping.
//!
//! Peer resolution depends on who is looking:
//!
//! - a non-owner always talks to the deal owner; the peer is fixed as
//!   soon as the root load succeeds (see [`DealView::load`])
//! - the owner has one thread per counterpart and must pick one from the
//!   conversation list; nothing is fetched until they do
//!
//! Sent messages are never appended locally: the thread is refetched so
//! ordering and timestamps are always the server's.

use tracing::debug;

use trato_core::{Message, MessageDraft, UserId};

use crate::detail::{DealView, DealViewEvent};
use crate::error::{ClientError, ClientResult};
use crate::load::Load;

impl DealView {
    /// The counterpart of the active thread, when resolved.
    pub fn peer(&self) -> Option<UserId> {
        self.read_state(|state| state.peer)
    }

    /// Owner only: switches to a counterpart's thread. The rendered
    /// thread is cleared before the first await, so the previous peer's
    /// messages can never flash under the new selection. After the
    /// thread lands the conversation is marked read and the sidebar
    /// counters refresh.
    pub async fn select_peer(&self, peer: UserId) -> ClientResult<()> {
        self.require_root()?;
        if !self.is_owner() {
            return Err(ClientError::NotOwner);
        }

        self.write_state(|state| {
            state.peer = Some(peer);
            state.thread = Load::Loading;
        });
        self.emit(DealViewEvent::PeerChanged(Some(peer)));
        self.emit(DealViewEvent::ThreadChanged);

        self.fetch_thread().await?;
        // a newer selection may have taken over while the fetch was in
        // flight; only the current peer's conversation gets marked read
        if self.peer() != Some(peer) {
            debug!(deal = %self.deal_id, %peer, "selection superseded, skipping mark-read");
            return Ok(());
        }
        self.gateway.mark_read(self.deal_id, peer).await?;
        self.refresh_conversations().await
    }

    /// Fetches the active thread: filtered by the selected peer for the
    /// owner, the single owner-thread for everyone else.
    pub async fn fetch_thread(&self) -> ClientResult<()> {
        self.require_root()?;
        let filter = if self.is_owner() {
            Some(self.peer().ok_or(ClientError::NoPeerSelected)?)
        } else {
            None
        };

        let token = self.thread_token.issue();
        self.write_state(|state| {
            if !state.thread.is_ready() {
                state.thread = Load::Loading;
            }
        });
        self.emit(DealViewEvent::ThreadChanged);

        match self.gateway.messages(self.deal_id, filter).await {
            Ok(messages) => {
                if self.thread_token.is_current(token) {
                    self.write_state(|state| state.thread = Load::Ready(messages));
                    self.emit(DealViewEvent::ThreadChanged);
                } else {
                    debug!(deal = %self.deal_id, "discarding stale thread");
                }
                Ok(())
            }
            Err(err) => {
                if self.thread_token.is_current(token) {
                    self.write_state(|state| state.thread = Load::Failed(err.to_string()));
                    self.emit(DealViewEvent::ThreadChanged);
                }
                Err(err.into())
            }
        }
    }

    /// Sends into the active thread and refetches it. The owner's copy
    /// of the thread is also re-marked read and the counters refreshed,
    /// so the owner's own message cannot drift the unread bookkeeping.
    pub async fn send_message(&self, draft: MessageDraft) -> ClientResult<Message> {
        self.require_root()?;
        let owner = self.is_owner();
        let mut draft = draft;
        if owner {
            let peer = self.peer().ok_or(ClientError::NoPeerSelected)?;
            draft.to_user = Some(peer);
        }

        let sent = self.gateway.send_message(self.deal_id, &draft).await?;
        self.fetch_thread().await?;
        if owner {
            if let Some(peer) = self.peer() {
                self.gateway.mark_read(self.deal_id, peer).await?;
                self.refresh_conversations().await?;
            }
        }
        Ok(sent)
    }

    /// Owner only: refetches the per-counterpart conversation summaries.
    pub async fn refresh_conversations(&self) -> ClientResult<()> {
        self.require_root()?;
        if !self.is_owner() {
            return Err(ClientError::NotOwner);
        }

        let token = self.conversations_token.issue();
        self.write_state(|state| {
            if !state.conversations.is_ready() {
                state.conversations = Load::Loading;
            }
        });
        self.emit(DealViewEvent::ConversationsChanged);

        match self.gateway.conversations(self.deal_id).await {
            Ok(conversations) => {
                if self.conversations_token.is_current(token) {
                    self.write_state(|state| state.conversations = Load::Ready(conversations));
                    self.emit(DealViewEvent::ConversationsChanged);
                } else {
                    debug!(deal = %self.deal_id, "discarding stale conversation list");
                }
                Ok(())
            }
            Err(err) => {
                if self.conversations_token.is_current(token) {
                    self.write_state(|state| {
                        state.conversations = Load::Failed(err.to_string())
                    });
                    self.emit(DealViewEvent::ConversationsChanged);
                }
                Err(err.into())
            }
        }
    }
}
