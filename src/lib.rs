//! guildfit - guild-based fitness competition over Telegram
//!
//! Members register into a guild, log workouts through a conversational
//! wizard, and compete on guild leaderboards. A small JSON API feeds the
//! Mini App dashboard.

pub mod activities;
pub mod bot;
pub mod cache;
pub mod db;
pub mod stats;
pub mod ui;
pub mod web;

pub use db::Database;
