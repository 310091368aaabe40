//! Terminal rendering for the trato CLI.

use chrono::{DateTime, Local, Utc};
use colored::Colorize;

use trato_core::{
    Bid, Conversation, Deal, Delivery, FieldErrors, Invite, Message, OfferSummary, SearchHit,
    User, UserId, format_brl, format_km,
};

pub fn print_banner() {
    println!();
    println!("{}", "╔════════════════════════════════════════╗".cyan());
    println!("{}", "║   trato — peer-to-peer marketplace     ║".cyan());
    println!("{}", "╚════════════════════════════════════════╝".cyan());
    println!();
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg.green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg.dimmed());
}

pub fn print_error(msg: &str) {
    println!("{} {}", "✗".red().bold(), msg.red());
}

pub fn print_warning(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg.yellow());
}

/// Renders a rejected submission: per-field messages first, then the
/// form-wide banner lines.
pub fn print_field_errors(errors: &FieldErrors) {
    for (field, messages) in errors.fields() {
        for message in messages {
            println!("  {} {}: {}", "✗".red(), field.yellow(), message.red());
        }
    }
    for message in errors.general() {
        println!("  {} {}", "✗".red(), message.red());
    }
}

pub fn print_deal(deal: &Deal) {
    println!();
    println!(
        "{} {}  {}",
        format!("#{}", deal.id).dimmed(),
        deal.description.bold(),
        format!("[{}]", deal.deal_type.display_name()).cyan()
    );
    println!("  {}  {}", "value:".dimmed(), format_brl(deal.value).green());
    if let Some(trade_for) = &deal.trade_for {
        println!("  {}  {}", "trade for:".dimmed(), trade_for);
    }
    println!(
        "  {}  {}, {} - {}",
        "where:".dimmed(),
        deal.location.address,
        deal.location.city,
        deal.location.state
    );
    println!(
        "  {}  {}",
        "urgency:".dimmed(),
        deal.urgency.level.display_name()
    );
    if let Some(limit) = deal.urgency.limit_date {
        println!("  {}  {}", "until:".dimmed(), limit);
    }
    if let Some(owner) = deal.owner {
        println!("  {}  user {}", "published by:".dimmed(), owner);
    }
    println!();
}

pub fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("{}", "No deals match the current filters.".dimmed());
        return;
    }
    println!();
    println!("{}", "Deals:".yellow().bold());
    println!("{}", "───────────────────────────────────────".dimmed());
    for hit in hits {
        let distance = match hit.distance_km {
            Some(km) => format!("  {}", format_km(km)).blue().to_string(),
            None => String::new(),
        };
        println!(
            "  {} {} {} {}{}",
            format!("#{}", hit.deal.id).dimmed(),
            hit.deal.description.cyan(),
            format_brl(hit.deal.value).green(),
            format!("[{}]", hit.deal.deal_type.display_name()).dimmed(),
            distance
        );
    }
    println!();
}

pub fn print_bids(bids: &[Bid], viewer: Option<UserId>) {
    if bids.is_empty() {
        println!("{}", "No bids visible on this deal.".dimmed());
        return;
    }
    println!();
    println!("{}", "Bids:".yellow().bold());
    for bid in bids {
        let who = if viewer == Some(bid.bidder) {
            "you".cyan().bold().to_string()
        } else {
            format!("user {}", bid.bidder)
        };
        let flag = if bid.accepted {
            "  ✓ accepted".green().bold().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} {} by {} — {}{}",
            format!("#{}", bid.id).dimmed(),
            format_brl(bid.value).green(),
            who,
            bid.description,
            flag
        );
    }
    println!();
}

pub fn print_conversations(conversations: &[Conversation]) {
    if conversations.is_empty() {
        println!("{}", "Nobody has messaged about this deal yet.".dimmed());
        return;
    }
    println!();
    println!("{}", "Conversations:".yellow().bold());
    for conversation in conversations {
        let badge = if conversation.unread > 0 {
            format!(" ({} unread)", conversation.unread)
                .red()
                .bold()
                .to_string()
        } else {
            String::new()
        };
        let preview = conversation
            .last_message
            .as_ref()
            .map(|last| {
                let prefix = if last.from_me { "you: " } else { "" };
                format!("  {}{}", prefix, last.body).dimmed().to_string()
            })
            .unwrap_or_default();
        println!(
            "  {} {}{}{}",
            format!("user {}", conversation.peer.id).dimmed(),
            conversation.peer.name.cyan().bold(),
            badge,
            preview
        );
    }
    println!();
}

pub fn print_message(message: &Message, viewer: Option<UserId>) {
    let time = message
        .sent_at
        .map(|sent: DateTime<Utc>| {
            let local: DateTime<Local> = sent.into();
            local.format("%d/%m %H:%M").to_string()
        })
        .unwrap_or_default();
    let mine = viewer == Some(message.sender);
    let sender = if mine {
        "you".cyan().bold()
    } else {
        format!("user {}", message.sender).magenta().bold()
    };
    let receipt = if mine && message.is_read() {
        " ✓✓".green().to_string()
    } else if mine {
        " ✓".dimmed().to_string()
    } else {
        String::new()
    };
    if let Some(title) = &message.title {
        println!("{} {} [{}] {}{}", time.dimmed(), sender, title, message.body, receipt);
    } else {
        println!("{} {} {}{}", time.dimmed(), sender, message.body, receipt);
    }
}

pub fn print_delivery(delivery: &Delivery) {
    println!();
    println!("{}", "Delivery estimate:".yellow().bold());
    println!(
        "  {} {} → {}",
        "route:".dimmed(),
        delivery.from.city,
        delivery.to.city
    );
    println!("  {}  {}", "cost:".dimmed(), format_brl(delivery.value).green());
    for step in &delivery.steps {
        println!(
            "    {} {}  in {}  out {}",
            "•".dimmed(),
            step.location.cyan(),
            step.incoming_date,
            step.outcoming_date
        );
    }
    println!();
}

pub fn print_offers(offers: &[OfferSummary]) {
    if offers.is_empty() {
        println!("{}", "You have not offered on any deal.".dimmed());
        return;
    }
    println!();
    println!("{}", "Deals you offered on:".yellow().bold());
    for offer in offers {
        println!(
            "  {} {} {}",
            format!("#{}", offer.deal.id).dimmed(),
            offer.deal.description.cyan(),
            format_brl(offer.deal.value).green()
        );
        if let Some(bid) = &offer.bid {
            let flag = if bid.accepted { " (accepted)".green().to_string() } else { String::new() };
            println!("      your bid: {}{}", format_brl(bid.value), flag);
        }
        if let Some(last) = &offer.last_message {
            println!("      last message: {}", last.body.dimmed());
        }
    }
    println!();
}

pub fn print_invites(invites: &[Invite]) {
    if invites.is_empty() {
        println!("{}", "No invites sent.".dimmed());
        return;
    }
    println!();
    println!("{}", "Invites:".yellow().bold());
    for invite in invites {
        println!(
            "  {} {} <{}> — {}",
            format!("#{}", invite.id).dimmed(),
            invite.name.cyan(),
            invite.email,
            invite.status.display_name()
        );
    }
    println!();
}

pub fn print_profile(user: &User) {
    println!();
    println!("{} {}", "Signed in as".dimmed(), user.name.cyan().bold());
    println!("  {}  {}", "login:".dimmed(), user.login);
    println!("  {}  {}", "email:".dimmed(), user.email);
    if !user.location.city.is_empty() {
        println!(
            "  {}  {}, {}",
            "city:".dimmed(),
            user.location.city,
            user.location.state
        );
    }
    println!();
}

pub fn print_chat_help() {
    println!();
    println!("{}", "Chat commands:".yellow().bold());
    println!("  {}   - Send a message (just type)", "<message>".cyan());
    println!("  {}    - Show the thread again", "/history".cyan());
    println!("  {}      - List conversations (owner)", "/peers".cyan());
    println!("  {} - Switch thread (owner)", "/switch <id>".cyan());
    println!("  {}       - Leave the chat", "/quit".cyan());
    println!();
}

pub fn print_prompt(label: &str) {
    print!("{} {} ", format!("[{}]", label).cyan(), ">".green());
}
