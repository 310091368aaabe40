//! Command handlers: each clap subcommand maps to one `cmd_*` function
//! that drives the gateway or an orchestrator and renders the outcome.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow, bail};
use chrono::NaiveDate;

use trato_client::{ClientConfig, ClientError, DealSearch, DealTab, DealView, StaticLocator};
use trato_core::{
    AuthSession, BidDraft, BidId, BidPatch, Credentials, DealDraft, DealId, DealType, InviteDraft,
    InvitePatch, Location, MessageDraft, SearchFilters, SearchHit, SortOrder, SsoCredentials,
    Urgency,
    UrgencyLevel, UserDraft, UserId, UserPatch, format_brl, parse_amount, parse_positive_amount,
    validate_deal_draft, validate_invite_draft,
};
use trato_gateway::{Gateway, GatewayError, MemoryGateway, SessionStore};

use crate::display;
use crate::{InviteAction, KindArg, PlaceArgs, ProfileAction};

pub struct Context {
    pub gateway: Arc<dyn Gateway>,
    pub session: Arc<SessionStore>,
}

impl Context {
    fn require_user(&self) -> Result<UserId> {
        self.session
            .current_user_id()
            .ok_or_else(|| anyhow!("not signed in — run `trato login` first"))
    }

    fn view(&self, deal: i64) -> DealView {
        DealView::new(
            self.gateway.clone(),
            self.session.current_user_id(),
            DealId::new(deal),
            ClientConfig::default(),
        )
    }
}

impl PlaceArgs {
    fn location(&self) -> Location {
        Location {
            lat: self.lat,
            lng: self.lng,
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip.clone(),
        }
    }
}

/// Unwraps a gateway result, rendering a rejected submission instead of
/// bubbling it as a failure.
fn submitted<T>(result: Result<T, GatewayError>, what: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(GatewayError::Rejected(errors)) => {
            display::print_error(&format!("{what} rejected:"));
            display::print_field_errors(&errors);
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn client_submitted<T>(result: Result<T, ClientError>, what: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ClientError::Gateway(GatewayError::Rejected(errors))) => {
            display::print_error(&format!("{what} rejected:"));
            display::print_field_errors(&errors);
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

// ---- session ----

pub async fn cmd_login(
    ctx: &Context,
    login: &str,
    password: Option<String>,
    sso: Option<String>,
) -> Result<()> {
    let auth = match (password, sso) {
        (Some(password), None) => {
            ctx.gateway
                .authenticate(&Credentials::new(login, password))
                .await
        }
        (None, Some(token)) => {
            ctx.gateway
                .authenticate_sso(&SsoCredentials::new(login, token))
                .await
        }
        _ => bail!("provide either --password or --sso"),
    };
    match auth {
        Ok(auth) => {
            let name = auth.user.name.clone();
            ctx.session.establish(auth);
            display::print_success(&format!("Signed in as {name}"));
            Ok(())
        }
        Err(GatewayError::InvalidCredentials) => {
            display::print_error("Invalid credentials");
            Ok(())
        }
        Err(err) => Err(err).context("sign-in failed"),
    }
}

pub fn cmd_logout(ctx: &Context) -> Result<()> {
    ctx.session.clear();
    display::print_info("Signed out.");
    Ok(())
}

pub async fn cmd_signup(
    ctx: &Context,
    name: &str,
    email: &str,
    login: &str,
    password: &str,
    place: &PlaceArgs,
) -> Result<()> {
    let draft = UserDraft {
        name: name.to_string(),
        email: email.to_string(),
        login: login.to_string(),
        password: Some(password.to_string()),
        location: place.location(),
        avatar_url: None,
    };
    if let Some(user) = submitted(ctx.gateway.create_user(&draft).await, "signup")? {
        display::print_success(&format!("Account created for {}", user.name));
        display::print_info(&format!("Sign in with: trato login {login} --password ..."));
    }
    Ok(())
}

pub async fn cmd_profile(ctx: &Context, action: Option<ProfileAction>) -> Result<()> {
    let me = ctx.require_user()?;
    match action.unwrap_or(ProfileAction::Show) {
        ProfileAction::Show => {
            let user = ctx.gateway.user(me).await.context("failed to load profile")?;
            display::print_profile(&user);
        }
        ProfileAction::Edit {
            name,
            email,
            password,
        } => {
            let patch = UserPatch {
                name,
                email,
                password,
                ..UserPatch::default()
            };
            if patch.is_empty() {
                display::print_warning("Nothing to change.");
                return Ok(());
            }
            if let Some(user) = submitted(ctx.gateway.update_user(me, &patch).await, "profile")? {
                // keep the persisted session's profile copy in sync
                if let Some(token) = ctx.session.token() {
                    ctx.session.establish(AuthSession {
                        token,
                        user: user.clone(),
                    });
                }
                display::print_success(&format!("Profile updated for {}", user.name));
            }
        }
    }
    Ok(())
}

// ---- search ----

pub async fn cmd_search(
    ctx: &Context,
    term: Option<String>,
    kind: Option<KindArg>,
    min: Option<String>,
    max: Option<String>,
    position: Option<(f64, f64)>,
    order: SortOrder,
) -> Result<()> {
    let mut filters = SearchFilters::new();
    if let Some(term) = term {
        filters = filters.with_term(term);
    }
    if let Some(kind) = kind {
        filters = filters.with_deal_type(kind.into());
    }
    if let Some(min) = min {
        filters = filters.with_value_start(parse_amount(&min)?);
    }
    if let Some(max) = max {
        filters = filters.with_value_end(parse_amount(&max)?);
    }

    let search = DealSearch::new(ctx.gateway.clone());
    search.set_filters(filters);
    let locator = match position {
        Some((lat, lng)) => StaticLocator::at(lat, lng),
        // the terminal has no position source of its own
        None => StaticLocator::unsupported(),
    };
    search.start(&locator).await.context("search failed")?;
    search.set_order(order);

    display::print_info(&format!("Ordered by: {}", order.display_name()));
    match search.hits().ready() {
        Some(hits) => display::print_hits(hits),
        None => display::print_error("search produced no result set"),
    }
    Ok(())
}

// ---- deal detail ----

pub async fn cmd_show(ctx: &Context, deal: i64) -> Result<()> {
    let view = ctx.view(deal);
    view.load().await.context("failed to load the deal")?;

    let state = view.snapshot();
    if let Some(deal) = state.deal.ready() {
        display::print_deal(deal);
    }
    if view.is_owner()
        && let Some(conversations) = state.conversations.ready()
    {
        display::print_conversations(conversations);
    }
    display::print_info(&format!(
        "More: trato bids {deal} · trato delivery {deal} · trato chat {deal}"
    ));
    Ok(())
}

pub async fn cmd_publish(
    ctx: &Context,
    value: &str,
    description: &str,
    kind: DealType,
    trade_for: Option<String>,
    urgency: UrgencyLevel,
    until: Option<String>,
    place: &PlaceArgs,
) -> Result<()> {
    let limit_date = parse_limit_date(until)?;
    let draft = DealDraft {
        deal_type: kind,
        value: parse_positive_amount(value)?,
        description: description.to_string(),
        trade_for,
        location: place.location(),
        urgency: Urgency {
            level: urgency,
            limit_date,
        },
        photos: vec![],
    }
    .normalized();

    if let Err(errors) = validate_deal_draft(&draft) {
        display::print_error("deal rejected:");
        display::print_field_errors(&errors);
        return Ok(());
    }
    if let Some(deal) = submitted(ctx.gateway.create_deal(&draft).await, "deal")? {
        display::print_success(&format!("Published deal #{}", deal.id));
        display::print_deal(&deal);
    }
    Ok(())
}

pub async fn cmd_edit(
    ctx: &Context,
    deal: i64,
    value: Option<String>,
    description: Option<String>,
    trade_for: Option<String>,
    urgency: Option<UrgencyLevel>,
    until: Option<String>,
) -> Result<()> {
    let id = DealId::new(deal);
    let current = ctx
        .gateway
        .deal(id)
        .await
        .context("failed to load the deal")?;

    let mut draft = current.draft();
    if let Some(value) = value {
        draft.value = parse_positive_amount(&value)?;
    }
    if let Some(description) = description {
        draft.description = description;
    }
    if trade_for.is_some() {
        draft.trade_for = trade_for;
    }
    if let Some(level) = urgency {
        draft.urgency.level = level;
    }
    if let Some(limit) = parse_limit_date(until)? {
        draft.urgency.limit_date = Some(limit);
    }
    let draft = draft.normalized();

    if let Err(errors) = validate_deal_draft(&draft) {
        display::print_error("deal rejected:");
        display::print_field_errors(&errors);
        return Ok(());
    }
    if let Some(updated) = submitted(ctx.gateway.update_deal(id, &draft).await, "deal")? {
        display::print_success(&format!("Updated deal #{}", updated.id));
        display::print_deal(&updated);
    }
    Ok(())
}

pub async fn cmd_delete(ctx: &Context, deal: i64) -> Result<()> {
    ctx.gateway
        .delete_deal(DealId::new(deal))
        .await
        .context("failed to delete the deal")?;
    display::print_success(&format!("Deleted deal #{deal}"));
    Ok(())
}

fn parse_limit_date(until: Option<String>) -> Result<Option<NaiveDate>> {
    until
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .with_context(|| format!("not a valid date (YYYY-MM-DD): {raw}"))
        })
        .transpose()
}

// ---- bids ----

pub async fn cmd_bid(ctx: &Context, deal: i64, value: &str, description: &str) -> Result<()> {
    ctx.require_user()?;
    let amount = parse_positive_amount(value)?;
    let view = ctx.view(deal);
    view.load().await.context("failed to load the deal")?;

    let draft = BidDraft::new(amount, description);
    if let Some(bid) = client_submitted(view.place_bid(&draft).await, "bid")? {
        display::print_success(&format!("Offered {}", format_brl(bid.value)));
        display::print_bids(&view.visible_bids(), view.viewer());
    }
    Ok(())
}

pub async fn cmd_bids(ctx: &Context, deal: i64) -> Result<()> {
    let view = ctx.view(deal);
    view.load().await.context("failed to load the deal")?;
    view.select_tab(DealTab::Bids)
        .await
        .context("failed to load the bids")?;
    display::print_bids(&view.visible_bids(), view.viewer());
    Ok(())
}

pub async fn cmd_decide(ctx: &Context, deal: i64, bid: i64, accept: bool) -> Result<()> {
    ctx.require_user()?;
    let view = ctx.view(deal);
    view.load().await.context("failed to load the deal")?;

    let patch = if accept {
        BidPatch::accept()
    } else {
        BidPatch::reject()
    };
    let what = if accept { "acceptance" } else { "rejection" };
    if client_submitted(view.update_bid(BidId::new(bid), &patch).await, what)?.is_some() {
        display::print_success(&format!(
            "Bid #{bid} {}",
            if accept { "accepted" } else { "rejected" }
        ));
        display::print_bids(&view.visible_bids(), view.viewer());
    }
    Ok(())
}

// ---- chat ----

pub async fn cmd_chat(ctx: &Context, deal: i64, with: Option<i64>) -> Result<()> {
    let me = ctx.require_user()?;
    let view = ctx.view(deal);
    view.load().await.context("failed to load the deal")?;

    if view.is_owner() {
        let conversations = view.snapshot().conversations.ready().cloned().unwrap_or_default();
        if conversations.is_empty() {
            display::print_info("Nobody has messaged about this deal yet.");
            return Ok(());
        }
        display::print_conversations(&conversations);
        let peer = match with {
            Some(raw) => UserId::new(raw),
            None => conversations[0].peer.id,
        };
        view.select_peer(peer)
            .await
            .context("failed to open the conversation")?;
    } else if view.peer().is_none() {
        bail!("this deal has no resolvable owner to talk to");
    }

    print_thread(&view, me);
    display::print_chat_help();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        display::print_prompt(&format!("deal {deal}"));
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input).is_err() || input.is_empty() {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let (command, rest) = match input.split_once(' ') {
            Some((command, rest)) => (command, rest),
            None => (input, ""),
        };
        match (command, rest) {
            ("/quit", _) | ("/exit", _) => {
                display::print_info("Leaving the chat.");
                break;
            }
            ("/history", _) => {
                view.fetch_thread()
                    .await
                    .context("failed to refresh the thread")?;
                print_thread(&view, me);
            }
            ("/peers", _) => {
                if view.is_owner() {
                    view.refresh_conversations()
                        .await
                        .context("failed to refresh conversations")?;
                    if let Some(conversations) = view.snapshot().conversations.ready() {
                        display::print_conversations(conversations);
                    }
                } else {
                    display::print_warning("Only the deal owner has multiple conversations.");
                }
            }
            ("/switch", rest) => {
                let raw: i64 = rest
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("usage: /switch <user-id>"))?;
                view.select_peer(UserId::new(raw))
                    .await
                    .context("failed to switch conversation")?;
                print_thread(&view, me);
            }
            _ => match view.send_message(MessageDraft::new(input)).await {
                Ok(sent) => display::print_message(&sent, Some(me)),
                Err(ClientError::Gateway(GatewayError::Rejected(errors))) => {
                    display::print_error("message rejected:");
                    display::print_field_errors(&errors);
                }
                Err(err) => return Err(err).context("failed to send the message"),
            },
        }
    }
    Ok(())
}

fn print_thread(view: &DealView, me: UserId) {
    let state = view.snapshot();
    match state.thread.ready() {
        Some(messages) if messages.is_empty() => {
            display::print_info("No messages yet. Say hello.")
        }
        Some(messages) => {
            println!();
            for message in messages {
                display::print_message(message, Some(me));
            }
            println!();
        }
        None => {
            if let Some(error) = state.thread.error() {
                display::print_error(error);
            }
        }
    }
}

// ---- delivery ----

pub async fn cmd_delivery(ctx: &Context, deal: i64, calculate: bool) -> Result<()> {
    let view = ctx.view(deal);
    view.load().await.context("failed to load the deal")?;

    if calculate {
        match view.calculate_delivery().await {
            Ok(delivery) => display::print_delivery(&delivery),
            Err(ClientError::SignedOut) => {
                display::print_error("sign in to calculate delivery to your address")
            }
            Err(err) => return Err(err).context("failed to calculate delivery"),
        }
        return Ok(());
    }

    view.select_tab(DealTab::Delivery)
        .await
        .context("failed to load the delivery estimate")?;
    let state = view.snapshot();
    match state.delivery.ready() {
        Some(delivery) => display::print_delivery(delivery),
        None => display::print_warning("No delivery estimate for this deal yet."),
    }
    Ok(())
}

// ---- listings ----

pub async fn cmd_mine(ctx: &Context) -> Result<()> {
    ctx.require_user()?;
    let deals = ctx
        .gateway
        .my_deals()
        .await
        .context("failed to load your deals")?;
    display::print_hits(&SearchHit::annotate(deals, None));
    Ok(())
}

pub async fn cmd_offers(ctx: &Context) -> Result<()> {
    ctx.require_user()?;
    let offers = ctx
        .gateway
        .my_offers()
        .await
        .context("failed to load your offers")?;
    display::print_offers(&offers);
    Ok(())
}

// ---- invites ----

pub async fn cmd_invites(ctx: &Context, action: Option<InviteAction>) -> Result<()> {
    ctx.require_user()?;
    match action.unwrap_or(InviteAction::List) {
        InviteAction::List => {
            let invites = ctx
                .gateway
                .invites()
                .await
                .context("failed to load invites")?;
            display::print_invites(&invites);
        }
        InviteAction::Send { name, email } => {
            let draft = InviteDraft::new(name, email);
            if let Err(errors) = validate_invite_draft(&draft) {
                display::print_error("invite rejected:");
                display::print_field_errors(&errors);
                return Ok(());
            }
            if let Some(invite) = submitted(ctx.gateway.create_invite(&draft).await, "invite")? {
                display::print_success(&format!("Invited {} <{}>", invite.name, invite.email));
            }
        }
        InviteAction::Edit {
            id,
            name,
            email,
            status,
        } => {
            let mut patch = InvitePatch::default();
            if let Some(name) = name {
                patch = patch.with_name(name);
            }
            if let Some(email) = email {
                patch = patch.with_email(email);
            }
            if let Some(status) = status {
                patch = patch.with_status(status.into());
            }
            if patch == InvitePatch::default() {
                display::print_warning("Nothing to change.");
                return Ok(());
            }
            let updated = ctx
                .gateway
                .update_invite(trato_core::InviteId::new(id), &patch)
                .await;
            if let Some(invite) = submitted(updated, "invite")? {
                display::print_success(&format!(
                    "Updated invite #{}: {} <{}> ({})",
                    invite.id,
                    invite.name,
                    invite.email,
                    invite.status.display_name()
                ));
            }
        }
        InviteAction::Remove { id } => {
            ctx.gateway
                .delete_invite(trato_core::InviteId::new(id))
                .await
                .context("failed to remove the invite")?;
            display::print_success(&format!("Removed invite #{id}"));
        }
    }
    Ok(())
}

// ---- demo ----

const CURITIBA: (f64, f64) = (-25.4284, -49.2733);
const SAO_PAULO: (f64, f64) = (-23.5505, -46.6333);

fn demo_user(name: &str, login: &str, city: &str, state: &str, coords: (f64, f64)) -> UserDraft {
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
            state: state.to_string(),
            zip_code: "80020010".to_string(),
        },
        avatar_url: None,
    }
}

fn demo_deal(description: &str, value: f64, coords: (f64, f64)) -> DealDraft {
    DealDraft {
        deal_type: DealType::Sale,
        value,
        description: description.to_string(),
        trade_for: None,
        location: Location {
            lat: Some(coords.0),
            lng: Some(coords.1),
            address: "Av. Central, 100".to_string(),
            city: "Curitiba".to_string(),
            state: "PR".to_string(),
            zip_code: "80020010".to_string(),
        },
        urgency: Urgency::default(),
        photos: vec![],
    }
}

/// Walks the search / detail / bid / chat flows against an in-memory
/// marketplace, narrating each step.
pub async fn cmd_demo() -> Result<()> {
    display::print_banner();
    display::print_info("Running against an in-memory marketplace, no server involved.");

    let memory = Arc::new(MemoryGateway::new());
    let ana = memory.seed_user(&demo_user("Ana", "ana", "Curitiba", "PR", CURITIBA));
    let bruno = memory.seed_user(&demo_user("Bruno", "bruno", "São Paulo", "SP", SAO_PAULO));
    let deal = memory.seed_deal(ana.id, &demo_deal("bicycle in good shape", 250.0, CURITIBA));
    memory.seed_deal(ana.id, &demo_deal("vintage record player", 400.0, CURITIBA));

    // Bruno searches from São Paulo and sees distances
    memory.sign_in(bruno.id);
    display::print_info("Bruno searches from São Paulo:");
    let search = DealSearch::new(memory.clone());
    search
        .start(&StaticLocator::at(SAO_PAULO.0, SAO_PAULO.1))
        .await?;
    if let Some(hits) = search.hits().ready() {
        display::print_hits(hits);
    }

    // Bruno opens the bicycle, bids, and says hello
    let bruno_view = DealView::new(
        memory.clone(),
        Some(bruno.id),
        deal.id,
        ClientConfig::default(),
    );
    bruno_view.load().await?;
    if let Some(deal) = bruno_view.snapshot().deal.ready() {
        display::print_deal(deal);
    }
    let bid = bruno_view
        .place_bid(&BidDraft::new(230.0, "can pick it up this weekend"))
        .await?;
    display::print_success(&format!("Bruno offers {}", format_brl(bid.value)));
    let hello = bruno_view
        .send_message(MessageDraft::new("is it still available?"))
        .await?;
    display::print_message(&hello, Some(bruno.id));

    bruno_view.select_tab(DealTab::Delivery).await?;
    if let Some(delivery) = bruno_view.snapshot().delivery.ready() {
        display::print_delivery(delivery);
    }

    // Ana opens her deal, reads the conversation, and accepts the bid
    memory.sign_in(ana.id);
    display::print_info("Ana opens her deal:");
    let ana_view = DealView::new(
        memory.clone(),
        Some(ana.id),
        deal.id,
        ClientConfig::default().with_auto_select_first_peer(true),
    );
    ana_view.load().await?;
    if let Some(conversations) = ana_view.snapshot().conversations.ready() {
        display::print_conversations(conversations);
    }
    let reply = ana_view
        .send_message(MessageDraft::new("yes! when can you come by?"))
        .await?;
    display::print_message(&reply, Some(ana.id));

    ana_view.update_bid(bid.id, &BidPatch::accept()).await?;
    display::print_success("Ana accepts Bruno's bid");
    ana_view.select_tab(DealTab::Bids).await?;
    display::print_bids(&ana_view.visible_bids(), Some(ana.id));

    display::print_success("Demo complete.");
    Ok(())
}
