//! trato: command-line client for the Trato peer-to-peer marketplace.
//!
//! ## Usage
//!
//! ```bash
//! # Sign in and look around
//! trato login ana --password secret
//! trato search bicycle --max 300,00
//!
//! # Inspect one deal
//! trato show 42
//! trato bids 42
//! trato delivery 42 --calculate
//!
//! # Negotiate
//! trato bid 42 250,00 "cash today"
//! trato chat 42
//!
//! # Self-contained walkthrough, no server needed
//! trato demo
//! ```

mod commands;
mod display;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};

use trato_core::{DealType, InviteStatus, SortOrder, UrgencyLevel};
use trato_gateway::{HttpGateway, SessionStore};

/// Command-line client for the Trato marketplace.
#[derive(Parser)]
#[command(name = "trato")]
#[command(about = "Buy, sell, and trade with people nearby")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL
    #[arg(long, default_value = "http://localhost:3333")]
    server: String,

    /// Data directory for the persisted session
    #[arg(long, default_value = "~/.trato")]
    data_dir: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a password or an SSO token
    Login {
        login: String,
        #[arg(short, long)]
        password: Option<String>,
        /// Application token from the SSO provider
        #[arg(long, conflicts_with = "password")]
        sso: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Create an account
    Signup {
        name: String,
        email: String,
        login: String,
        password: String,
        #[command(flatten)]
        place: PlaceArgs,
    },
    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
    /// Search the listings
    Search {
        /// Free-text term
        term: Option<String>,
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Minimum value, pt-BR formatted ("10,50")
        #[arg(long)]
        min: Option<String>,
        /// Maximum value, pt-BR formatted
        #[arg(long)]
        max: Option<String>,
        /// Your position, for nearby-first results
        #[arg(long, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
        #[arg(long, value_enum, default_value_t = OrderArg::Nearby)]
        order: OrderArg,
    },
    /// Show one deal
    Show { deal: i64 },
    /// Publish a new deal
    Publish {
        /// Asking value, pt-BR formatted
        value: String,
        description: String,
        #[arg(long, value_enum, default_value_t = KindArg::Sale)]
        kind: KindArg,
        /// What you want in return (trade deals)
        #[arg(long)]
        trade_for: Option<String>,
        #[arg(long, value_enum, default_value_t = UrgencyArg::Low)]
        urgency: UrgencyArg,
        /// Limit date (YYYY-MM-DD) when urgency is "date"
        #[arg(long)]
        until: Option<String>,
        #[command(flatten)]
        place: PlaceArgs,
    },
    /// Edit a deal you published
    Edit {
        deal: i64,
        #[arg(long)]
        value: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        trade_for: Option<String>,
        #[arg(long, value_enum)]
        urgency: Option<UrgencyArg>,
        #[arg(long)]
        until: Option<String>,
    },
    /// Delete a deal you published
    Delete { deal: i64 },
    /// Place a bid on a deal
    Bid {
        deal: i64,
        /// Offered value, pt-BR formatted
        value: String,
        #[arg(default_value = "")]
        description: String,
    },
    /// List the bids you can see on a deal
    Bids { deal: i64 },
    /// Accept a bid on your deal
    Accept { deal: i64, bid: i64 },
    /// Reject a bid on your deal
    Reject { deal: i64, bid: i64 },
    /// Open the chat for a deal
    Chat {
        deal: i64,
        /// Counterpart to talk to (deal owner only)
        #[arg(long)]
        with: Option<i64>,
    },
    /// Show the delivery estimate for a deal
    Delivery {
        deal: i64,
        /// Recalculate for your address instead of showing the cached one
        #[arg(long)]
        calculate: bool,
    },
    /// List the deals you published
    Mine,
    /// List the deals you offered on
    Offers,
    /// Manage your invites
    Invites {
        #[command(subcommand)]
        action: Option<InviteAction>,
    },
    /// Walk through the main flows against an in-memory marketplace
    Demo,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show the signed-in profile
    Show,
    /// Update profile fields
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum InviteAction {
    /// List your invites
    List,
    /// Invite someone by name and email
    Send { name: String, email: String },
    /// Update an invite's name, email, or status
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Remove an invite
    Remove { id: i64 },
}

/// Address flags shared by signup and publish.
#[derive(clap::Args)]
struct PlaceArgs {
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    city: String,
    /// Two-letter region code or full state name
    #[arg(long, default_value = "")]
    state: String,
    #[arg(long, default_value = "")]
    zip: String,
    #[arg(long, requires = "lng")]
    lat: Option<f64>,
    #[arg(long, requires = "lat")]
    lng: Option<f64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Sale,
    Trade,
    Want,
}

impl From<KindArg> for DealType {
    fn from(kind: KindArg) -> DealType {
        match kind {
            KindArg::Sale => DealType::Sale,
            KindArg::Trade => DealType::Trade,
            KindArg::Want => DealType::Want,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum UrgencyArg {
    Low,
    Medium,
    High,
    Date,
}

impl From<UrgencyArg> for UrgencyLevel {
    fn from(urgency: UrgencyArg) -> UrgencyLevel {
        match urgency {
            UrgencyArg::Low => UrgencyLevel::Low,
            UrgencyArg::Medium => UrgencyLevel::Medium,
            UrgencyArg::High => UrgencyLevel::High,
            UrgencyArg::Date => UrgencyLevel::Date,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Pending,
    Accepted,
    Rejected,
}

impl From<StatusArg> for InviteStatus {
    fn from(status: StatusArg) -> InviteStatus {
        match status {
            StatusArg::Pending => InviteStatus::Pending,
            StatusArg::Accepted => InviteStatus::Accepted,
            StatusArg::Rejected => InviteStatus::Rejected,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    Nearby,
    PriceAsc,
    PriceDesc,
}

impl From<OrderArg> for SortOrder {
    fn from(order: OrderArg) -> SortOrder {
        match order {
            OrderArg::Nearby => SortOrder::Nearby,
            OrderArg::PriceAsc => SortOrder::PriceAsc,
            OrderArg::PriceDesc => SortOrder::PriceDesc,
        }
    }
}

fn resolve_data_dir(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trato=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Commands::Demo) {
        return commands::cmd_demo().await;
    }

    let data_dir = resolve_data_dir(&cli.data_dir);
    let session = Arc::new(SessionStore::load(&data_dir));
    let gateway = HttpGateway::new(cli.server.as_str(), session.clone())
        .context("failed to build the HTTP client")?;
    let ctx = commands::Context {
        gateway: Arc::new(gateway),
        session,
    };

    match cli.command {
        Commands::Login {
            login,
            password,
            sso,
        } => commands::cmd_login(&ctx, &login, password, sso).await,
        Commands::Logout => commands::cmd_logout(&ctx),
        Commands::Signup {
            name,
            email,
            login,
            password,
            place,
        } => commands::cmd_signup(&ctx, &name, &email, &login, &password, &place).await,
        Commands::Profile { action } => commands::cmd_profile(&ctx, action).await,
        Commands::Search {
            term,
            kind,
            min,
            max,
            lat,
            lng,
            order,
        } => commands::cmd_search(&ctx, term, kind, min, max, lat.zip(lng), order.into()).await,
        Commands::Show { deal } => commands::cmd_show(&ctx, deal).await,
        Commands::Publish {
            value,
            description,
            kind,
            trade_for,
            urgency,
            until,
            place,
        } => {
            commands::cmd_publish(
                &ctx,
                &value,
                &description,
                kind.into(),
                trade_for,
                urgency.into(),
                until,
                &place,
            )
            .await
        }
        Commands::Edit {
            deal,
            value,
            description,
            trade_for,
            urgency,
            until,
        } => {
            commands::cmd_edit(
                &ctx,
                deal,
                value,
                description,
                trade_for,
                urgency.map(Into::into),
                until,
            )
            .await
        }
        Commands::Delete { deal } => commands::cmd_delete(&ctx, deal).await,
        Commands::Bid {
            deal,
            value,
            description,
        } => commands::cmd_bid(&ctx, deal, &value, &description).await,
        Commands::Bids { deal } => commands::cmd_bids(&ctx, deal).await,
        Commands::Accept { deal, bid } => commands::cmd_decide(&ctx, deal, bid, true).await,
        Commands::Reject { deal, bid } => commands::cmd_decide(&ctx, deal, bid, false).await,
        Commands::Chat { deal, with } => commands::cmd_chat(&ctx, deal, with).await,
        Commands::Delivery { deal, calculate } => {
            commands::cmd_delivery(&ctx, deal, calculate).await
        }
        Commands::Mine => commands::cmd_mine(&ctx).await,
        Commands::Offers => commands::cmd_offers(&ctx).await,
        Commands::Invites { action } => commands::cmd_invites(&ctx, action).await,
        Commands::Demo => unreachable!("handled above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn invite_edit_parses_its_fields() {
        let cli = Cli::parse_from([
            "trato", "invites", "edit", "3", "--name", "Bia", "--status", "accepted",
        ]);
        match cli.command {
            Commands::Invites {
                action: Some(InviteAction::Edit {
                    id,
                    name,
                    email,
                    status,
                }),
            } => {
                assert_eq!(id, 3);
                assert_eq!(name.as_deref(), Some("Bia"));
                assert_eq!(email, None);
                assert!(matches!(status, Some(StatusArg::Accepted)));
            }
            _ => panic!("parsed into the wrong command"),
        }
    }

    #[test]
    fn tilde_data_dir_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(resolve_data_dir("~/.trato"), home.join(".trato"));
        }
        assert_eq!(resolve_data_dir("/tmp/trato"), PathBuf::from("/tmp/trato"));
    }
}
