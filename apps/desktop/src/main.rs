use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::ScreenClient;
use tracing_subscriber::EnvFilter;

mod chat;
mod kitchen;
mod pos;
mod repair;
mod todo;

#[derive(Parser, Debug)]
#[command(about = "Terminal screens for the shop-floor backend")]
struct Args {
    /// Backend base URL; REST and the broadcast hub share it.
    #[arg(long, default_value = "http://localhost:3001")]
    server_url: String,
    #[command(subcommand)]
    screen: Screen,
}

#[derive(Subcommand, Debug)]
enum Screen {
    /// Chat room relayed through the broadcast hub.
    Chat {
        /// Name shown as the sender of your messages.
        #[arg(long)]
        character: String,
    },
    /// Food-ordering point of sale.
    Pos {
        #[arg(long, default_value = "1")]
        table: String,
    },
    /// Live feed of confirmed orders.
    Kitchen,
    /// Repair-ticket intake form.
    Repair,
    /// Repair-ticket admin: walk tickets through their statuses.
    RepairAdmin,
    /// Read-only per-status ticket counts.
    RepairDashboard,
    /// Team todo board.
    Todo {
        /// Name new items are assigned to.
        #[arg(long)]
        assignee: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let client = ScreenClient::new(args.server_url)?;
    match args.screen {
        Screen::Chat { character } => chat::run(client, character).await,
        Screen::Pos { table } => pos::run(client, table).await,
        Screen::Kitchen => kitchen::run(client).await,
        Screen::Repair => repair::run_intake(client).await,
        Screen::RepairAdmin => repair::run_admin(client).await,
        Screen::RepairDashboard => repair::run_dashboard(client).await,
        Screen::Todo { assignee } => todo::run(client, assignee).await,
    }
}
