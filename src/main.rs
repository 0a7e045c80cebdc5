//! guildfit - guild-based fitness competition over Telegram

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;

use guildfit::cache::TtlCache;
use guildfit::db::Database;
use guildfit::{bot, web};

const DB_PATH: &str = "guildfit.db";

#[derive(Parser)]
#[command(name = "guildfit")]
#[command(author, version, about = "Guild fitness competition bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot
    Bot {
        /// Telegram bot token (or set TELOXIDE_TOKEN env var)
        #[arg(short, long, env = "TELOXIDE_TOKEN")]
        token: String,
    },

    /// Serve the Mini App dashboard API
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        bind: String,
    },

    /// Run the bot and the dashboard API together
    Run {
        /// Telegram bot token (or set TELOXIDE_TOKEN env var)
        #[arg(short, long, env = "TELOXIDE_TOKEN")]
        token: String,

        /// Address to bind the dashboard API
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        bind: String,
    },

    /// Print guild standings
    Leaderboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let db = Arc::new(Mutex::new(Database::open(DB_PATH)?));

    match cli.command {
        Some(Commands::Bot { token }) => {
            bot::run_bot(token, db).await?;
        }

        Some(Commands::Serve { bind }) => {
            let state = web::ApiState { db, cache: TtlCache::new() };
            web::serve(&bind, state).await?;
        }

        Some(Commands::Run { token, bind }) => {
            let state = web::ApiState { db: Arc::clone(&db), cache: TtlCache::new() };
            tokio::try_join!(bot::run_bot(token, db), web::serve(&bind, state))?;
        }

        Some(Commands::Leaderboard) | None => {
            let db = db.lock().await;
            let standings = db.guild_standings()?;
            println!("Guild standings");
            println!("{:-<50}", "");
            for (place, standing) in standings.iter().enumerate() {
                println!(
                    "{}. {} {:20} | {:6} pts | {} members",
                    place + 1,
                    standing.guild.emblem,
                    standing.guild.name,
                    standing.points,
                    standing.members
                );
            }
        }
    }

    Ok(())
}
