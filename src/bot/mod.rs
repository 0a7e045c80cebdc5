//! Telegram bot module - guild competition flows over the two-slot chat UI
//!
//! Every view is rendered into the per-chat content message; the bottom
//! reply keyboard is the persistent nav. Wizard inputs are deleted so the
//! transcript stays at the two managed messages.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Local, NaiveDate, Utc};
use regex::Regex;
use teloxide::{
    dispatching::dialogue::{Dialogue, InMemStorage},
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup},
    utils::command::BotCommands,
};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::activities::{self, Category};
use crate::cache::TtlCache;
use crate::db::{Database, GuildStanding, Member, Workout};
use crate::stats::Progress;
use crate::ui::{ChatScreen, TelegramChat};

type BotDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Rendered leaderboard/profile views stay cached this long
const VIEW_TTL_SECS: i64 = 60;
const MAX_DURATION_MINS: i64 = 600;

const BTN_LOG: &str = "🏋️ Log workout";
const BTN_BOARD: &str = "🏆 Leaderboard";
const BTN_STATS: &str = "👤 My stats";
const BTN_HELP: &str = "ℹ️ Help";
const BTN_REGISTER: &str = "📝 Register";

const NAV_TEXT: &str = "⬇️ Quick actions";
const OOPS_TEXT: &str = "⚠️ Something went wrong. Please try again.";

/// Process-wide bot state handed to every handler
struct AppContext {
    db: Arc<Mutex<Database>>,
    screen: ChatScreen<TelegramChat>,
    views: TtlCache<String>,
}

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Idle,
    /// Waiting for the display name during registration
    AwaitingName,
    /// Name captured, waiting for a guild pick
    AwaitingGuild { name: String },
    /// Activity picked, waiting for a date (buttons or YYYY-MM-DD text)
    AwaitingDate { activity_id: String },
    /// Waiting for a duration in minutes (buttons or free text)
    AwaitingDuration { activity_id: String, performed_on: NaiveDate },
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Bot commands:")]
pub enum Command {
    #[command(description = "open the main menu")]
    Start,
    #[command(description = "show help")]
    Help,
    #[command(description = "back to the main menu")]
    Menu,
    #[command(description = "cancel the current flow")]
    Cancel,
}

/// Start the Telegram bot
pub async fn run_bot(token: String, db: Arc<Mutex<Database>>) -> Result<()> {
    let bot = Bot::new(token);
    let ctx = Arc::new(AppContext {
        db,
        screen: ChatScreen::new(TelegramChat::new(bot.clone())),
        views: TtlCache::new(),
    });

    let handler = dptree::entry()
        .enter_dialogue::<Update, InMemStorage<State>, State>()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            Update::filter_message()
                .endpoint(handle_message),
        )
        .branch(
            Update::filter_callback_query()
                .endpoint(handle_callback),
        );

    info!("starting bot dispatcher");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<State>::new(), ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    msg: Message,
    cmd: Command,
    dialogue: BotDialogue,
    ctx: Arc<AppContext>,
) -> HandlerResult {
    let chat = msg.chat.id;
    ctx.screen.delete_user_message(chat, msg.id).await;

    let user_id = match msg.from.as_ref() {
        Some(user) => user.id.0 as i64,
        None => return Ok(()),
    };

    match cmd {
        Command::Start => {
            let member = { ctx.db.lock().await.find_member(user_id)? };
            ctx.screen
                .init(chat, "Loading...", NAV_TEXT, nav_keyboard(member.is_some()))
                .await?;
            dialogue.reset().await?;
            match member {
                Some(member) => show_menu(&ctx, chat, &member).await?,
                None => start_registration(&ctx, &dialogue, chat).await?,
            }
        }

        Command::Help => {
            ctx.screen
                .update_content(chat, &help_text(), Some(back_keyboard()))
                .await?;
        }

        Command::Menu | Command::Cancel => {
            dialogue.reset().await?;
            let member = { ctx.db.lock().await.find_member(user_id)? };
            match member {
                Some(member) => show_menu(&ctx, chat, &member).await?,
                None => start_registration(&ctx, &dialogue, chat).await?,
            }
        }
    }

    Ok(())
}

async fn handle_message(
    msg: Message,
    dialogue: BotDialogue,
    ctx: Arc<AppContext>,
) -> HandlerResult {
    let chat = msg.chat.id;
    let text = msg.text().map(|t| t.trim().to_string());
    ctx.screen.delete_user_message(chat, msg.id).await;

    let (Some(text), Some(user)) = (text, msg.from.as_ref()) else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;

    let state = dialogue.get().await?.unwrap_or_default();
    match state {
        State::AwaitingName => {
            if text.is_empty() || text.chars().count() > 64 {
                ctx.screen
                    .update_content(chat, "The name must be 1 to 64 characters. Try again:", None)
                    .await?;
                return Ok(());
            }
            let guilds = { ctx.db.lock().await.list_guilds()? };
            let prompt = format!("Nice to meet you, {text}!\n\nPick your guild:");
            ctx.screen
                .update_content(chat, &prompt, Some(guild_keyboard(&guilds)))
                .await?;
            dialogue.update(State::AwaitingGuild { name: text }).await?;
        }

        State::AwaitingGuild { .. } => {
            let guilds = { ctx.db.lock().await.list_guilds()? };
            ctx.screen
                .update_content(chat, "Use the buttons to pick your guild:", Some(guild_keyboard(&guilds)))
                .await?;
        }

        State::AwaitingDate { activity_id } => match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            Ok(date) if date <= Local::now().date_naive() => {
                prompt_duration(&ctx, &dialogue, chat, activity_id, date).await?;
            }
            _ => {
                ctx.screen
                    .update_content(
                        chat,
                        "Send the date as YYYY-MM-DD (today or earlier), or use the buttons:",
                        Some(date_keyboard()),
                    )
                    .await?;
            }
        },

        State::AwaitingDuration { activity_id, performed_on } => match text.parse::<i64>() {
            Ok(mins) if (1..=MAX_DURATION_MINS).contains(&mins) => {
                finish_workout(&ctx, &dialogue, chat, user_id, &activity_id, performed_on, mins)
                    .await?;
            }
            _ => {
                ctx.screen
                    .update_content(
                        chat,
                        &format!("Send the duration in minutes (1 to {MAX_DURATION_MINS}), or use the buttons:"),
                        Some(duration_keyboard()),
                    )
                    .await?;
            }
        },

        State::Idle => handle_nav_press(&ctx, &dialogue, chat, user_id, &text).await?,
    }

    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    dialogue: BotDialogue,
    ctx: Arc<AppContext>,
) -> HandlerResult {
    let user_id = q.from.id.0 as i64;
    let chat = q.message.as_ref().map(|m| m.chat().id);

    if let (Some(chat), Some(data)) = (chat, q.data.as_deref()) {
        dispatch_callback(&ctx, &dialogue, chat, user_id, data).await?;
    }

    bot.answer_callback_query(q.id).await?;
    Ok(())
}

async fn dispatch_callback(
    ctx: &AppContext,
    dialogue: &BotDialogue,
    chat: ChatId,
    user_id: i64,
    data: &str,
) -> HandlerResult {
    if let Some(menu) = data.strip_prefix("menu:") {
        match menu {
            "main" => {
                dialogue.reset().await?;
                let member = { ctx.db.lock().await.find_member(user_id)? };
                match member {
                    Some(member) => show_menu(ctx, chat, &member).await?,
                    None => start_registration(ctx, dialogue, chat).await?,
                }
            }
            "log" => begin_logging(ctx, chat, user_id).await?,
            "board" => show_leaderboard(ctx, chat).await?,
            "me" => show_stats(ctx, chat, user_id).await?,
            "register" => start_registration(ctx, dialogue, chat).await?,
            _ => {}
        }
    } else if let Some(key) = data.strip_prefix("guild:") {
        // Only valid while a registration is waiting on the guild pick;
        // presses on stale buttons are ignored.
        let State::AwaitingGuild { name } = dialogue.get().await?.unwrap_or_default() else {
            return Ok(());
        };
        let Ok(guild_id) = key.parse::<i64>() else {
            return Ok(());
        };
        complete_registration(ctx, dialogue, chat, user_id, name, guild_id).await?;
    } else if let Some(key) = data.strip_prefix("cat:") {
        let Some(category) = Category::from_key(key) else {
            return Ok(());
        };
        let text = format!("{} {}\n\nPick an activity:", category.emoji(), category.name());
        ctx.screen
            .update_content(chat, &text, Some(activity_keyboard(category)))
            .await?;
    } else if let Some(id) = data.strip_prefix("act:") {
        let Some(activity) = activities::find_activity(id) else {
            return Ok(());
        };
        let text = format!("{} {}\n\nWhen was it?", activity.category.emoji(), activity.name);
        ctx.screen
            .update_content(chat, &text, Some(date_keyboard()))
            .await?;
        dialogue
            .update(State::AwaitingDate { activity_id: activity.id.to_string() })
            .await?;
    } else if let Some(choice) = data.strip_prefix("date:") {
        let State::AwaitingDate { activity_id } = dialogue.get().await?.unwrap_or_default() else {
            return Ok(());
        };
        let today = Local::now().date_naive();
        let performed_on = match choice {
            "today" => today,
            "yesterday" => today - Duration::days(1),
            _ => return Ok(()),
        };
        prompt_duration(ctx, dialogue, chat, activity_id, performed_on).await?;
    } else if let Some(mins) = data.strip_prefix("dur:") {
        let State::AwaitingDuration { activity_id, performed_on } =
            dialogue.get().await?.unwrap_or_default()
        else {
            return Ok(());
        };
        let Ok(mins) = mins.parse::<i64>() else {
            return Ok(());
        };
        finish_workout(ctx, dialogue, chat, user_id, &activity_id, performed_on, mins).await?;
    }

    Ok(())
}

async fn show_menu(ctx: &AppContext, chat: ChatId, member: &Member) -> HandlerResult {
    let text = format!("🏟 guildfit\n\nWhat's next, {}?", member.name);
    ctx.screen
        .update_content(chat, &text, Some(main_menu_keyboard()))
        .await?;
    Ok(())
}

async fn start_registration(
    ctx: &AppContext,
    dialogue: &BotDialogue,
    chat: ChatId,
) -> HandlerResult {
    ctx.screen
        .update_content(
            chat,
            "👋 Welcome to guildfit!\n\nWhat name should appear on the leaderboards?",
            None,
        )
        .await?;
    dialogue.update(State::AwaitingName).await?;
    Ok(())
}

async fn complete_registration(
    ctx: &AppContext,
    dialogue: &BotDialogue,
    chat: ChatId,
    user_id: i64,
    name: String,
    guild_id: i64,
) -> HandlerResult {
    let member = Member {
        id: user_id,
        chat_id: chat.0,
        name,
        guild_id,
        registered_at: Utc::now(),
    };

    let guild = {
        let db = ctx.db.lock().await;
        let guild = db.find_guild(guild_id)?;
        if guild.is_some() {
            db.register_member(&member)?;
        }
        guild
    };

    let Some(guild) = guild else {
        let guilds = { ctx.db.lock().await.list_guilds()? };
        ctx.screen
            .update_content(chat, "That guild does not exist. Pick one of these:", Some(guild_keyboard(&guilds)))
            .await?;
        return Ok(());
    };

    dialogue.reset().await?;
    // Registration unlocks the full bottom menu.
    ctx.screen.update_keyboard(chat, NAV_TEXT, nav_keyboard(true)).await?;
    let text = format!(
        "🎉 Welcome, {}!\n\nYou fight for {} {}. Every minute of training earns points for your guild.",
        member.name, guild.emblem, guild.name
    );
    ctx.screen
        .update_content(chat, &text, Some(main_menu_keyboard()))
        .await?;
    info!(user = member.id, guild = guild.id, "member registered");
    Ok(())
}

async fn handle_nav_press(
    ctx: &AppContext,
    dialogue: &BotDialogue,
    chat: ChatId,
    user_id: i64,
    text: &str,
) -> HandlerResult {
    match text {
        BTN_LOG => begin_logging(ctx, chat, user_id).await?,
        BTN_BOARD => show_leaderboard(ctx, chat).await?,
        BTN_STATS => show_stats(ctx, chat, user_id).await?,
        BTN_HELP => {
            ctx.screen
                .update_content(chat, &help_text(), Some(back_keyboard()))
                .await?;
        }
        BTN_REGISTER => start_registration(ctx, dialogue, chat).await?,
        _ => {
            ctx.screen
                .update_content(chat, "Use the menu buttons, or /menu to start over.", Some(main_menu_keyboard()))
                .await?;
        }
    }
    Ok(())
}

async fn begin_logging(ctx: &AppContext, chat: ChatId, user_id: i64) -> HandlerResult {
    let registered = { ctx.db.lock().await.find_member(user_id)?.is_some() };
    if !registered {
        ctx.screen
            .update_content(chat, "You need to register first.", Some(register_keyboard()))
            .await?;
        return Ok(());
    }
    ctx.screen
        .update_content(chat, "💪 What did you train?\n\nPick a category:", Some(category_keyboard()))
        .await?;
    Ok(())
}

async fn prompt_duration(
    ctx: &AppContext,
    dialogue: &BotDialogue,
    chat: ChatId,
    activity_id: String,
    performed_on: NaiveDate,
) -> HandlerResult {
    ctx.screen
        .update_content(chat, "⏱ For how long?\n\nPick a duration or type the minutes:", Some(duration_keyboard()))
        .await?;
    dialogue
        .update(State::AwaitingDuration { activity_id, performed_on })
        .await?;
    Ok(())
}

async fn finish_workout(
    ctx: &AppContext,
    dialogue: &BotDialogue,
    chat: ChatId,
    user_id: i64,
    activity_id: &str,
    performed_on: NaiveDate,
    duration_mins: i64,
) -> HandlerResult {
    let Some(activity) = activities::find_activity(activity_id) else {
        dialogue.reset().await?;
        ctx.screen
            .update_content(chat, OOPS_TEXT, Some(main_menu_keyboard()))
            .await?;
        return Ok(());
    };

    let member = { ctx.db.lock().await.find_member(user_id)? };
    let Some(member) = member else {
        dialogue.reset().await?;
        ctx.screen
            .update_content(chat, "You need to register first.", Some(register_keyboard()))
            .await?;
        return Ok(());
    };

    let points = activities::points_for(activity.category, duration_mins);
    let workout = Workout {
        id: None,
        user_id: member.id,
        activity_id: activity.id.to_string(),
        category: activity.category.key().to_string(),
        duration_mins,
        points,
        performed_on,
        logged_at: Utc::now(),
    };

    let guild = {
        let db = ctx.db.lock().await;
        db.add_workout(&workout)?;
        db.find_guild(member.guild_id)?
    };

    // Every cached view this log touches is now stale.
    let stale = Regex::new(&format!("^(board|me:{})$", member.id))?;
    ctx.views.remove_matching(&stale);

    let guild_line = guild
        .map(|g| format!(" for {} {}", g.emblem, g.name))
        .unwrap_or_default();
    let text = format!(
        "✅ Logged!\n\n{} {} - {} min on {}\n+{} pts{}",
        activity.category.emoji(),
        activity.name,
        duration_mins,
        performed_on,
        points,
        guild_line
    );
    ctx.screen
        .update_content(chat, &text, Some(after_log_keyboard()))
        .await?;
    dialogue.reset().await?;
    info!(user = member.id, activity = activity.id, points, "workout logged");
    Ok(())
}

async fn show_leaderboard(ctx: &AppContext, chat: ChatId) -> HandlerResult {
    let db = Arc::clone(&ctx.db);
    let view = ctx
        .views
        .get_or_fetch("board", Duration::seconds(VIEW_TTL_SECS), move || async move {
            let db = db.lock().await;
            Ok(render_standings(&db.guild_standings()?))
        })
        .await;

    match view {
        Ok(text) => {
            ctx.screen
                .update_content(chat, &text, Some(back_keyboard()))
                .await?;
        }
        Err(err) => {
            error!(%err, "leaderboard fetch failed");
            ctx.screen
                .update_content(chat, OOPS_TEXT, Some(back_keyboard()))
                .await?;
        }
    }
    Ok(())
}

async fn show_stats(ctx: &AppContext, chat: ChatId, user_id: i64) -> HandlerResult {
    let member = { ctx.db.lock().await.find_member(user_id)? };
    let Some(member) = member else {
        ctx.screen
            .update_content(chat, "You need to register first.", Some(register_keyboard()))
            .await?;
        return Ok(());
    };

    let db = Arc::clone(&ctx.db);
    let key = format!("me:{user_id}");
    let view = ctx
        .views
        .get_or_fetch(&key, Duration::seconds(VIEW_TTL_SECS), move || async move {
            let db = db.lock().await;
            let guild = db.find_guild(member.guild_id)?;
            let workouts = db.workouts_for_user(member.id)?;
            drop(db);
            Ok(render_stats(&member, guild.as_ref(), &Progress::new(workouts)))
        })
        .await;

    match view {
        Ok(text) => {
            ctx.screen
                .update_content(chat, &text, Some(back_keyboard()))
                .await?;
        }
        Err(err) => {
            error!(%err, "stats fetch failed");
            ctx.screen
                .update_content(chat, OOPS_TEXT, Some(back_keyboard()))
                .await?;
        }
    }
    Ok(())
}

fn render_standings(standings: &[GuildStanding]) -> String {
    let mut text = String::from("🏆 Guild leaderboard\n\n");
    for (place, standing) in standings.iter().enumerate() {
        let medal = match place {
            0 => "🥇",
            1 => "🥈",
            2 => "🥉",
            _ => "▫️",
        };
        text.push_str(&format!(
            "{medal} {} {} - {} pts ({} members)\n",
            standing.guild.emblem, standing.guild.name, standing.points, standing.members
        ));
    }
    text
}

fn render_stats(member: &Member, guild: Option<&crate::db::Guild>, progress: &Progress) -> String {
    let today = Local::now().date_naive();
    let mut text = format!("👤 {}\n", member.name);
    if let Some(guild) = guild {
        text.push_str(&format!("{} {}\n", guild.emblem, guild.name));
    }
    text.push_str(&format!(
        "\nTotal: {} pts, {} min, {} workouts\nThis week: {} pts in {} sessions\nStreak: {} days 🔥\n",
        progress.total_points(),
        progress.total_minutes(),
        progress.workout_count(),
        progress.week_points(today),
        progress.week_sessions(today),
        progress.streak_days(today),
    ));
    if let Some(favorite) = progress.favorite_category().and_then(Category::from_key) {
        text.push_str(&format!("Favorite: {} {}\n", favorite.emoji(), favorite.name()));
    }
    text
}

fn help_text() -> String {
    format!(
        "{}\n\nLog workouts to earn points for your guild; leaderboards and your stats live in the menu and the Mini App dashboard.",
        Command::descriptions()
    )
}

fn nav_keyboard(registered: bool) -> KeyboardMarkup {
    let rows = if registered {
        vec![
            vec![KeyboardButton::new(BTN_LOG), KeyboardButton::new(BTN_BOARD)],
            vec![KeyboardButton::new(BTN_STATS), KeyboardButton::new(BTN_HELP)],
        ]
    } else {
        vec![vec![KeyboardButton::new(BTN_REGISTER), KeyboardButton::new(BTN_HELP)]]
    };
    KeyboardMarkup::new(rows).resize_keyboard()
}

fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(BTN_LOG, "menu:log")],
        vec![
            InlineKeyboardButton::callback(BTN_BOARD, "menu:board"),
            InlineKeyboardButton::callback(BTN_STATS, "menu:me"),
        ],
    ])
}

fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback("⬅️ Menu", "menu:main")]])
}

fn register_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(BTN_REGISTER, "menu:register")]])
}

fn after_log_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🔁 Log another", "menu:log")],
        vec![
            InlineKeyboardButton::callback(BTN_BOARD, "menu:board"),
            InlineKeyboardButton::callback("⬅️ Menu", "menu:main"),
        ],
    ])
}

fn guild_keyboard(guilds: &[crate::db::Guild]) -> InlineKeyboardMarkup {
    let rows = guilds
        .iter()
        .map(|g| {
            vec![InlineKeyboardButton::callback(
                format!("{} {}", g.emblem, g.name),
                format!("guild:{}", g.id),
            )]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

fn category_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Category::all()
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|c| {
                    InlineKeyboardButton::callback(
                        format!("{} {}", c.emoji(), c.name()),
                        format!("cat:{}", c.key()),
                    )
                })
                .collect()
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("⬅️ Menu", "menu:main")]);
    InlineKeyboardMarkup::new(rows)
}

fn activity_keyboard(category: Category) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = activities::activities_in(category)
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|a| InlineKeyboardButton::callback(a.name.to_string(), format!("act:{}", a.id)))
                .collect()
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("⬅️ Back", "menu:log")]);
    InlineKeyboardMarkup::new(rows)
}

fn date_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("📅 Today", "date:today"),
            InlineKeyboardButton::callback("Yesterday", "date:yesterday"),
        ],
        vec![InlineKeyboardButton::callback("⬅️ Menu", "menu:main")],
    ])
}

fn duration_keyboard() -> InlineKeyboardMarkup {
    let presets = [15, 30, 45, 60, 90];
    let row = presets
        .iter()
        .map(|m| InlineKeyboardButton::callback(format!("{m} min"), format!("dur:{m}")))
        .collect();
    InlineKeyboardMarkup::new(vec![row, vec![InlineKeyboardButton::callback("⬅️ Menu", "menu:main")]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Guild;

    fn standing(name: &str, emblem: &str, members: i64, points: i64) -> GuildStanding {
        GuildStanding {
            guild: Guild { id: 1, name: name.to_string(), emblem: emblem.to_string() },
            members,
            points,
        }
    }

    #[test]
    fn standings_render_with_medals_in_order() {
        let text = render_standings(&[
            standing("Iron Wolves", "🐺", 3, 500),
            standing("Golden Lions", "🦁", 2, 300),
            standing("Storm Eagles", "🦅", 1, 100),
        ]);
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[2].starts_with("🥇"));
        assert!(lines[3].starts_with("🥈"));
        assert!(lines[4].starts_with("🥉"));
        assert!(lines[2].contains("500 pts"));
        assert!(lines[2].contains("3 members"));
    }

    #[test]
    fn nav_keyboard_depends_on_registration() {
        assert_eq!(nav_keyboard(true).keyboard.len(), 2);
        assert_eq!(nav_keyboard(false).keyboard.len(), 1);
    }

    #[test]
    fn category_keyboard_covers_all_categories() {
        let keyboard = category_keyboard();
        let buttons: usize = keyboard.inline_keyboard.iter().map(|row| row.len()).sum();
        // One button per category plus the menu button.
        assert_eq!(buttons, Category::all().len() + 1);
    }
}
