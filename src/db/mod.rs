//! Database module - SQLite storage for guilds, members and workouts

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

/// Guilds every member picks from at registration
const DEFAULT_GUILDS: &[(&str, &str)] = &[
    ("Iron Wolves", "🐺"),
    ("Golden Lions", "🦁"),
    ("Storm Eagles", "🦅"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: i64,
    pub name: String,
    pub emblem: String,
}

/// Registered competitor; `id` is the Telegram user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub chat_id: i64,
    pub name: String,
    pub guild_id: i64,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: Option<i64>,
    pub user_id: i64,
    pub activity_id: String,
    pub category: String,
    pub duration_mins: i64,
    pub points: i64,
    pub performed_on: NaiveDate,
    pub logged_at: DateTime<Utc>,
}

/// One row of the guild leaderboard
#[derive(Debug, Clone, Serialize)]
pub struct GuildStanding {
    pub guild: Guild,
    pub members: i64,
    pub points: i64,
}

/// One row of a guild's internal ranking
#[derive(Debug, Clone, Serialize)]
pub struct MemberScore {
    pub user_id: i64,
    pub name: String,
    pub points: i64,
    pub workouts: i64,
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema and seed the default guilds
    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS guilds (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                emblem TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS members (
                id INTEGER PRIMARY KEY,
                chat_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                guild_id INTEGER NOT NULL REFERENCES guilds(id),
                registered_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS workouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES members(id),
                activity_id TEXT NOT NULL,
                category TEXT NOT NULL,
                duration_mins INTEGER NOT NULL,
                points INTEGER NOT NULL,
                performed_on TEXT NOT NULL,
                logged_at TEXT NOT NULL
            )",
            [],
        )?;

        for (name, emblem) in DEFAULT_GUILDS {
            self.conn.execute(
                "INSERT OR IGNORE INTO guilds (name, emblem) VALUES (?1, ?2)",
                params![name, emblem],
            )?;
        }

        Ok(())
    }

    pub fn list_guilds(&self) -> Result<Vec<Guild>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, emblem FROM guilds ORDER BY id")?;
        let guilds = stmt
            .query_map([], Self::guild_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(guilds)
    }

    pub fn find_guild(&self, id: i64) -> Result<Option<Guild>> {
        let guild = self
            .conn
            .query_row(
                "SELECT id, name, emblem FROM guilds WHERE id = ?1",
                params![id],
                Self::guild_from_row,
            )
            .optional()?;
        Ok(guild)
    }

    /// Register a member, or re-register: name, chat and guild follow the
    /// latest registration, the original timestamp is kept
    pub fn register_member(&self, member: &Member) -> Result<()> {
        self.conn.execute(
            "INSERT INTO members (id, chat_id, name, guild_id, registered_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 chat_id = excluded.chat_id,
                 name = excluded.name,
                 guild_id = excluded.guild_id",
            params![
                member.id,
                member.chat_id,
                member.name,
                member.guild_id,
                member.registered_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn find_member(&self, id: i64) -> Result<Option<Member>> {
        let member = self
            .conn
            .query_row(
                "SELECT id, chat_id, name, guild_id, registered_at FROM members WHERE id = ?1",
                params![id],
                Self::member_from_row,
            )
            .optional()?;
        Ok(member)
    }

    /// Add new workout record
    pub fn add_workout(&self, workout: &Workout) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO workouts (user_id, activity_id, category, duration_mins, points, performed_on, logged_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                workout.user_id,
                workout.activity_id,
                workout.category,
                workout.duration_mins,
                workout.points,
                workout.performed_on.format("%Y-%m-%d").to_string(),
                workout.logged_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All workouts of one member, newest first
    pub fn workouts_for_user(&self, user_id: i64) -> Result<Vec<Workout>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, activity_id, category, duration_mins, points, performed_on, logged_at
             FROM workouts WHERE user_id = ?1
             ORDER BY performed_on DESC, logged_at DESC",
        )?;
        let workouts = stmt
            .query_map(params![user_id], Self::workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    /// Guild leaderboard: total points and member count per guild, best
    /// guild first. Guilds without members still appear with zero points.
    pub fn guild_standings(&self) -> Result<Vec<GuildStanding>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.id, g.name, g.emblem,
                    COUNT(DISTINCT m.id) AS members,
                    COALESCE(SUM(w.points), 0) AS points
             FROM guilds g
             LEFT JOIN members m ON m.guild_id = g.id
             LEFT JOIN workouts w ON w.user_id = m.id
             GROUP BY g.id
             ORDER BY points DESC, g.name ASC",
        )?;
        let standings = stmt
            .query_map([], |row| {
                Ok(GuildStanding {
                    guild: Self::guild_from_row(row)?,
                    members: row.get(3)?,
                    points: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(standings)
    }

    /// Ranking inside one guild, best member first
    pub fn guild_members_ranked(&self, guild_id: i64, limit: usize) -> Result<Vec<MemberScore>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.name,
                    COALESCE(SUM(w.points), 0) AS points,
                    COUNT(w.id) AS workouts
             FROM members m
             LEFT JOIN workouts w ON w.user_id = m.id
             WHERE m.guild_id = ?1
             GROUP BY m.id
             ORDER BY points DESC, m.name ASC
             LIMIT ?2",
        )?;
        let scores = stmt
            .query_map(params![guild_id, limit as i64], |row| {
                Ok(MemberScore {
                    user_id: row.get(0)?,
                    name: row.get(1)?,
                    points: row.get(2)?,
                    workouts: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(scores)
    }

    fn guild_from_row(row: &Row) -> rusqlite::Result<Guild> {
        Ok(Guild { id: row.get(0)?, name: row.get(1)?, emblem: row.get(2)? })
    }

    fn member_from_row(row: &Row) -> rusqlite::Result<Member> {
        let registered: String = row.get(4)?;
        Ok(Member {
            id: row.get(0)?,
            chat_id: row.get(1)?,
            name: row.get(2)?,
            guild_id: row.get(3)?,
            registered_at: DateTime::parse_from_rfc3339(&registered)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    fn workout_from_row(row: &Row) -> rusqlite::Result<Workout> {
        let performed: String = row.get(6)?;
        let logged: String = row.get(7)?;
        Ok(Workout {
            id: Some(row.get(0)?),
            user_id: row.get(1)?,
            activity_id: row.get(2)?,
            category: row.get(3)?,
            duration_mins: row.get(4)?,
            points: row.get(5)?,
            performed_on: NaiveDate::parse_from_str(&performed, "%Y-%m-%d")
                .unwrap_or_else(|_| Utc::now().date_naive()),
            logged_at: DateTime::parse_from_rfc3339(&logged)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}
