//! Behavioral tests for [`DealView`] against the in-memory backend: root
//! gating, lazy tab fetches, bid visibility, chat peer resolution, and
//! the discard of superseded in-flight responses.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{CountingGateway, Gate, GatedGateway, deal_draft, user_draft};
use trato_client::{ClientConfig, ClientError, DealTab, DealView};
use trato_core::{BidDraft, BidPatch, Deal, DealId, MessageDraft, User, UserId};
use trato_gateway::{Gateway, MemoryGateway};

const CURITIBA: (f64, f64) = (-25.4284, -49.2733);
const SAO_PAULO: (f64, f64) = (-23.5505, -46.6333);

struct Fixture {
    memory: Arc<MemoryGateway>,
    counting: Arc<CountingGateway>,
    ana: User,
    bruno: User,
    caio: User,
    deal: Deal,
}

fn fixture() -> Fixture {
    let memory = Arc::new(MemoryGateway::new());
    let ana = memory.seed_user(&user_draft("Ana", "ana", "Curitiba", CURITIBA));
    let bruno = memory.seed_user(&user_draft("Bruno", "bruno", "São Paulo", SAO_PAULO));
    let caio = memory.seed_user(&user_draft("Caio", "caio", "São Paulo", SAO_PAULO));
    let deal = memory.seed_deal(
        ana.id,
        &deal_draft("bicycle in good shape", 250.0, Some(CURITIBA)),
    );
    let counting = Arc::new(CountingGateway::new(memory.clone()));
    Fixture {
        memory,
        counting,
        ana,
        bruno,
        caio,
        deal,
    }
}

impl Fixture {
    fn view_for(&self, viewer: UserId) -> Arc<DealView> {
        self.memory.sign_in(viewer);
        Arc::new(DealView::new(
            self.counting.clone(),
            Some(viewer),
            self.deal.id,
            ClientConfig::default(),
        ))
    }

    /// Has `sender` drop a message into the deal's thread, then restores
    /// no acting user.
    async fn says(&self, sender: UserId, body: &str) {
        self.memory.sign_in(sender);
        self.memory
            .send_message(self.deal.id, &MessageDraft::new(body))
            .await
            .unwrap();
        self.memory.sign_out();
    }
}

// ---- root load and peer resolution ----

#[tokio::test]
async fn non_owner_load_fixes_peer_on_owner_and_fetches_the_thread() {
    let fx = fixture();
    fx.says(fx.bruno.id, "is it still available?").await;

    let view = fx.view_for(fx.bruno.id);
    view.load().await.unwrap();

    let state = view.snapshot();
    assert!(state.deal.is_ready());
    assert_eq!(state.peer, Some(fx.ana.id));
    assert_eq!(state.thread.ready().map(Vec::len), Some(1));
    // the conversation sidebar is an owner-only concern
    assert!(state.conversations.is_idle());
    assert_eq!(fx.counting.message_list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fx.counting.conversation_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn owner_load_fetches_conversations_but_no_thread_until_a_peer_is_picked() {
    let fx = fixture();
    fx.says(fx.bruno.id, "is it still available?").await;

    let view = fx.view_for(fx.ana.id);
    view.load().await.unwrap();

    let state = view.snapshot();
    assert!(view.is_owner());
    assert_eq!(state.peer, None);
    assert!(state.thread.is_idle());
    let conversations = state.conversations.ready().unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].peer.id, fx.bruno.id);
    assert_eq!(conversations[0].unread, 1);
    assert_eq!(fx.counting.message_list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn owner_with_no_conversations_gets_an_empty_ready_list() {
    let fx = fixture();
    let view = fx.view_for(fx.ana.id);
    view.load().await.unwrap();

    let state = view.snapshot();
    assert_eq!(state.conversations.ready().map(Vec::len), Some(0));
    assert_eq!(state.peer, None);
    assert_eq!(fx.counting.message_list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn auto_select_opens_the_first_conversation_and_marks_it_read() {
    let fx = fixture();
    fx.says(fx.bruno.id, "is it still available?").await;
    fx.says(fx.caio.id, "would you trade it?").await;

    fx.memory.sign_in(fx.ana.id);
    let view = DealView::new(
        fx.counting.clone(),
        Some(fx.ana.id),
        fx.deal.id,
        ClientConfig::default().with_auto_select_first_peer(true),
    );
    view.load().await.unwrap();

    let state = view.snapshot();
    assert_eq!(state.peer, Some(fx.bruno.id));
    assert_eq!(state.thread.ready().map(Vec::len), Some(1));
    // selecting marked bruno's thread read and refreshed the sidebar
    let conversations = state.conversations.ready().unwrap();
    assert_eq!(conversations[0].unread, 0);
    assert_eq!(conversations[1].unread, 1);
}

#[tokio::test]
async fn failed_root_blocks_every_dependent_fetch() {
    let fx = fixture();
    fx.memory.sign_in(fx.bruno.id);
    let view = DealView::new(
        fx.counting.clone(),
        Some(fx.bruno.id),
        DealId::new(9999),
        ClientConfig::default(),
    );

    assert!(view.load().await.is_err());
    assert!(view.snapshot().deal.is_failed());

    let err = view.select_tab(DealTab::Bids).await.unwrap_err();
    assert!(matches!(err, ClientError::RootNotLoaded));
    assert!(matches!(
        view.refresh_delivery().await.unwrap_err(),
        ClientError::RootNotLoaded
    ));
    assert_eq!(fx.counting.bid_list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.counting.delivery_calls.load(Ordering::SeqCst), 0);
}

// ---- tabs ----

#[tokio::test]
async fn tab_resources_fetch_once_and_only_when_selected() {
    let fx = fixture();
    let view = fx.view_for(fx.bruno.id);
    view.load().await.unwrap();

    assert_eq!(fx.counting.bid_list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.counting.delivery_calls.load(Ordering::SeqCst), 0);

    view.select_tab(DealTab::Delivery).await.unwrap();
    view.select_tab(DealTab::Delivery).await.unwrap();
    assert_eq!(fx.counting.delivery_calls.load(Ordering::SeqCst), 1);
    assert!(view.snapshot().delivery.is_ready());

    view.select_tab(DealTab::Bids).await.unwrap();
    view.select_tab(DealTab::Details).await.unwrap();
    view.select_tab(DealTab::Bids).await.unwrap();
    assert_eq!(fx.counting.bid_list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(view.snapshot().active_tab, DealTab::Bids);
}

// ---- bids ----

#[tokio::test]
async fn bid_visibility_follows_the_viewer() {
    let fx = fixture();
    fx.memory.sign_in(fx.bruno.id);
    fx.memory
        .place_bid(fx.deal.id, &BidDraft::new(200.0, "cash today"))
        .await
        .unwrap();
    fx.memory.sign_in(fx.caio.id);
    fx.memory
        .place_bid(fx.deal.id, &BidDraft::new(220.0, "can pick up"))
        .await
        .unwrap();

    let view = fx.view_for(fx.bruno.id);
    view.load().await.unwrap();
    view.select_tab(DealTab::Bids).await.unwrap();
    let visible = view.visible_bids();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].bidder, fx.bruno.id);

    let view = fx.view_for(fx.ana.id);
    view.load().await.unwrap();
    view.select_tab(DealTab::Bids).await.unwrap();
    assert_eq!(view.visible_bids().len(), 2);
}

#[tokio::test]
async fn placing_a_bid_refetches_the_list() {
    let fx = fixture();
    let view = fx.view_for(fx.bruno.id);
    view.load().await.unwrap();
    view.select_tab(DealTab::Bids).await.unwrap();
    assert_eq!(fx.counting.bid_list_calls.load(Ordering::SeqCst), 1);

    let bid = view
        .place_bid(&BidDraft::new(200.0, "cash today"))
        .await
        .unwrap();
    assert_eq!(bid.bidder, fx.bruno.id);
    assert_eq!(fx.counting.bid_list_calls.load(Ordering::SeqCst), 2);
    let state = view.snapshot();
    assert_eq!(state.bids.ready().map(Vec::len), Some(1));
}

#[tokio::test]
async fn accepting_one_bid_shows_the_server_side_rejections() {
    let fx = fixture();
    fx.memory.sign_in(fx.bruno.id);
    let bruno_bid = fx
        .memory
        .place_bid(fx.deal.id, &BidDraft::new(200.0, "cash today"))
        .await
        .unwrap();
    fx.memory.sign_in(fx.caio.id);
    fx.memory
        .place_bid(fx.deal.id, &BidDraft::new(220.0, "can pick up"))
        .await
        .unwrap();

    let view = fx.view_for(fx.ana.id);
    view.load().await.unwrap();
    view.select_tab(DealTab::Bids).await.unwrap();

    let updated = view.update_bid(bruno_bid.id, &BidPatch::accept()).await.unwrap();
    assert!(updated.accepted);

    // the cached list is the refetched one, acceptance flags included
    let state = view.snapshot();
    let bids = state.bids.ready().unwrap();
    assert_eq!(bids.len(), 2);
    for bid in bids {
        assert_eq!(bid.accepted, bid.id == bruno_bid.id);
    }
}

// ---- chat ----

#[tokio::test]
async fn sent_messages_come_back_through_a_refetch() {
    let fx = fixture();
    let view = fx.view_for(fx.bruno.id);
    view.load().await.unwrap();
    assert_eq!(fx.counting.message_list_calls.load(Ordering::SeqCst), 1);

    let sent = view
        .send_message(MessageDraft::new("is it still available?"))
        .await
        .unwrap();
    assert_eq!(sent.sender, fx.bruno.id);
    assert_eq!(fx.counting.message_list_calls.load(Ordering::SeqCst), 2);

    let state = view.snapshot();
    let thread = state.thread.ready().unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].body, "is it still available?");
}

#[tokio::test]
async fn owner_cannot_send_without_a_selected_peer() {
    let fx = fixture();
    let view = fx.view_for(fx.ana.id);
    view.load().await.unwrap();

    let err = view
        .send_message(MessageDraft::new("hello?"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NoPeerSelected));
}

#[tokio::test]
async fn only_the_owner_selects_peers() {
    let fx = fixture();
    let view = fx.view_for(fx.bruno.id);
    view.load().await.unwrap();

    let err = view.select_peer(fx.caio.id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotOwner));
}

#[tokio::test]
async fn selecting_a_peer_marks_their_conversation_read() {
    let fx = fixture();
    fx.says(fx.bruno.id, "is it still available?").await;

    let view = fx.view_for(fx.ana.id);
    view.load().await.unwrap();
    assert_eq!(view.snapshot().conversations.ready().unwrap()[0].unread, 1);

    view.select_peer(fx.bruno.id).await.unwrap();
    let state = view.snapshot();
    assert_eq!(state.peer, Some(fx.bruno.id));
    assert_eq!(state.thread.ready().map(Vec::len), Some(1));
    assert_eq!(state.conversations.ready().unwrap()[0].unread, 0);
}

#[tokio::test]
async fn switching_peers_clears_the_thread_before_the_new_one_resolves() {
    let fx = fixture();
    fx.says(fx.bruno.id, "message from bruno").await;
    fx.says(fx.caio.id, "message from caio").await;

    let gated = Arc::new(GatedGateway::new(fx.memory.clone(), Gate::Messages));
    fx.memory.sign_in(fx.ana.id);
    let view = Arc::new(DealView::new(
        gated.clone(),
        Some(fx.ana.id),
        fx.deal.id,
        ClientConfig::default(),
    ));
    view.load().await.unwrap();

    // open bruno's thread, letting the fetch straight through
    let select = tokio::spawn({
        let view = view.clone();
        let peer = fx.bruno.id;
        async move { view.select_peer(peer).await }
    });
    gated.wait_for_entry().await;
    gated.open_gate();
    select.await.unwrap().unwrap();
    let thread = view.snapshot().thread;
    assert_eq!(thread.ready().unwrap()[0].body, "message from bruno");

    // switch to caio and look at the state while the fetch is parked
    let select = tokio::spawn({
        let view = view.clone();
        let peer = fx.caio.id;
        async move { view.select_peer(peer).await }
    });
    gated.wait_for_entry().await;
    let state = view.snapshot();
    assert_eq!(state.peer, Some(fx.caio.id));
    assert!(
        state.thread.is_loading(),
        "the old peer's messages must not survive the switch"
    );

    gated.open_gate();
    select.await.unwrap().unwrap();
    let thread = view.snapshot().thread;
    assert_eq!(thread.ready().unwrap()[0].body, "message from caio");
}

#[tokio::test]
async fn a_superseded_selection_does_not_mark_its_thread_read() {
    let fx = fixture();
    fx.says(fx.bruno.id, "message from bruno").await;
    fx.says(fx.caio.id, "message from caio").await;

    let gated = Arc::new(GatedGateway::new(fx.memory.clone(), Gate::Messages));
    fx.memory.sign_in(fx.ana.id);
    let view = Arc::new(DealView::new(
        gated.clone(),
        Some(fx.ana.id),
        fx.deal.id,
        ClientConfig::default(),
    ));
    view.load().await.unwrap();

    // bruno's thread fetch parks at the gate; caio's selection overtakes it
    let first = tokio::spawn({
        let view = view.clone();
        let peer = fx.bruno.id;
        async move { view.select_peer(peer).await }
    });
    gated.wait_for_entry().await;
    let second = tokio::spawn({
        let view = view.clone();
        let peer = fx.caio.id;
        async move { view.select_peer(peer).await }
    });
    gated.wait_for_entry().await;

    gated.open_gate();
    gated.open_gate();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let state = view.snapshot();
    assert_eq!(state.peer, Some(fx.caio.id));
    assert_eq!(state.thread.ready().unwrap()[0].body, "message from caio");

    // only caio's conversation was marked read; bruno's is still unread
    view.refresh_conversations().await.unwrap();
    let state = view.snapshot();
    let conversations = state.conversations.ready().unwrap();
    let unread_of = |peer| {
        conversations
            .iter()
            .find(|c| c.peer.id == peer)
            .unwrap()
            .unread
    };
    assert_eq!(unread_of(fx.bruno.id), 1);
    assert_eq!(unread_of(fx.caio.id), 0);
}

// ---- superseded requests ----

#[tokio::test]
async fn a_newer_bid_fetch_wins_over_a_slow_stale_one() {
    let fx = fixture();
    fx.memory.sign_in(fx.bruno.id);
    fx.memory
        .place_bid(fx.deal.id, &BidDraft::new(200.0, "cash today"))
        .await
        .unwrap();

    let gated = Arc::new(GatedGateway::new(fx.memory.clone(), Gate::FirstBids));
    fx.memory.sign_in(fx.ana.id);
    let view = Arc::new(DealView::new(
        gated.clone(),
        Some(fx.ana.id),
        fx.deal.id,
        ClientConfig::default(),
    ));
    view.load().await.unwrap();

    // first fetch parks at the gate and will resolve to an empty list
    let slow = tokio::spawn({
        let view = view.clone();
        async move { view.select_tab(DealTab::Bids).await }
    });
    gated.wait_for_entry().await;

    // a second fetch overtakes it with the real list
    view.refresh_bids().await.unwrap();
    assert_eq!(view.snapshot().bids.ready().map(Vec::len), Some(1));

    gated.open_gate();
    slow.await.unwrap().unwrap();
    assert_eq!(
        view.snapshot().bids.ready().map(Vec::len),
        Some(1),
        "the stale empty list must be discarded"
    );
}

// ---- delivery ----

#[tokio::test]
async fn recalculating_delivery_needs_a_signed_in_viewer() {
    let fx = fixture();
    fx.memory.sign_in(fx.bruno.id);
    let view = DealView::new(
        fx.counting.clone(),
        None,
        fx.deal.id,
        ClientConfig::default(),
    );
    view.load().await.unwrap();
    assert!(view.snapshot().deal.is_ready());

    let err = view.calculate_delivery().await.unwrap_err();
    assert!(matches!(err, ClientError::SignedOut));
}

#[tokio::test]
async fn recalculated_estimate_replaces_the_cached_one() {
    let fx = fixture();
    let view = fx.view_for(fx.bruno.id);
    view.load().await.unwrap();
    view.select_tab(DealTab::Delivery).await.unwrap();

    let delivery = view.calculate_delivery().await.unwrap();
    assert!(delivery.value > 0.0);
    assert_eq!(view.snapshot().delivery.ready(), Some(&delivery));
}
