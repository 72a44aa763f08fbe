//! SQLite snapshot store — the relational source of the four input tables.
//!
//! RULE: Only store.rs talks to the database.
//! Engines receive an `InputSnapshot`; they never execute SQL.

use crate::{
    calendar::{format_timestamp, parse_timestamp},
    error::MetricsResult,
    snapshot::{Event, InputSnapshot, Plan, Source, TableSchema, User, EVENTS, PLANS, SOURCES, USERS},
};
use rusqlite::{params, Connection};

pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> MetricsResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> MetricsResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Wrap a connection whose schema is managed elsewhere.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> MetricsResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_schema.sql"))?;
        Ok(())
    }

    // ── Writes ─────────────────────────────────────────────────

    pub fn insert_plan(&self, plan: &Plan) -> MetricsResult<()> {
        insert_plan(&self.conn, plan)
    }

    pub fn insert_source(&self, source: &Source) -> MetricsResult<()> {
        insert_source(&self.conn, source)
    }

    pub fn insert_user(&self, user: &User) -> MetricsResult<()> {
        insert_user(&self.conn, user)
    }

    pub fn insert_event(&self, event: &Event) -> MetricsResult<()> {
        insert_event(&self.conn, event)
    }

    /// Write a whole snapshot in one transaction.
    pub fn save_snapshot(&mut self, snapshot: &InputSnapshot) -> MetricsResult<()> {
        let tx = self.conn.transaction()?;
        for plan in &snapshot.plans {
            insert_plan(&tx, plan)?;
        }
        for source in &snapshot.sources {
            insert_source(&tx, source)?;
        }
        for user in &snapshot.users {
            insert_user(&tx, user)?;
        }
        for event in &snapshot.events {
            insert_event(&tx, event)?;
        }
        tx.commit()?;
        log::info!(
            "saved snapshot: {} users, {} events",
            snapshot.users.len(),
            snapshot.events.len()
        );
        Ok(())
    }

    // ── Reads ──────────────────────────────────────────────────

    /// Read all four tables. Every table's columns are checked before
    /// any row is read; rows with unparseable dates are skipped.
    pub fn load_snapshot(&self) -> MetricsResult<InputSnapshot> {
        for schema in [USERS, EVENTS, PLANS, SOURCES] {
            self.check_schema(&schema)?;
        }

        let users = self.load_users()?;
        let events = self.load_events()?;
        let plans = self.load_plans()?;
        let sources = self.load_sources()?;

        log::info!("loaded snapshot: {} users, {} events", users.len(), events.len());
        Ok(InputSnapshot::new(users, events, plans, sources))
    }

    fn check_schema(&self, schema: &TableSchema) -> MetricsResult<()> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", schema.name))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        schema.check(&columns)
    }

    fn load_users(&self) -> MetricsResult<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, signup_date, plan_id, source_id FROM Users ORDER BY user_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let total = rows.len();
        let users: Vec<User> = rows
            .into_iter()
            .filter_map(|(user_id, signup, plan_id, source_id)| {
                Some(User {
                    user_id,
                    signup_date: parse_timestamp(&signup)?,
                    plan_id,
                    source_id,
                })
            })
            .collect();
        warn_skipped(&USERS, total, users.len());
        Ok(users)
    }

    fn load_events(&self) -> MetricsResult<Vec<Event>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, event_type, event_date FROM Events ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let total = rows.len();
        let events: Vec<Event> = rows
            .into_iter()
            .filter_map(|(user_id, event_type, date)| {
                Some(Event {
                    user_id,
                    event_type,
                    event_date: parse_timestamp(&date)?,
                })
            })
            .collect();
        warn_skipped(&EVENTS, total, events.len());
        Ok(events)
    }

    fn load_plans(&self) -> MetricsResult<Vec<Plan>> {
        let mut stmt = self
            .conn
            .prepare("SELECT plan_id, plan_name, price FROM Plans ORDER BY plan_id")?;
        let plans = stmt
            .query_map([], |row| {
                Ok(Plan {
                    plan_id:   row.get(0)?,
                    plan_name: row.get(1)?,
                    price:     row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(plans)
    }

    fn load_sources(&self) -> MetricsResult<Vec<Source>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source_id, source_name FROM Sources ORDER BY source_id")?;
        let sources = stmt
            .query_map([], |row| {
                Ok(Source {
                    source_id:   row.get(0)?,
                    source_name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sources)
    }
}

// ── Statements shared by single inserts and batch writes ─────────────────────

fn insert_plan(conn: &Connection, plan: &Plan) -> MetricsResult<()> {
    conn.execute(
        "INSERT INTO Plans (plan_id, plan_name, price) VALUES (?1, ?2, ?3)",
        params![plan.plan_id, plan.plan_name, plan.price],
    )?;
    Ok(())
}

fn insert_source(conn: &Connection, source: &Source) -> MetricsResult<()> {
    conn.execute(
        "INSERT INTO Sources (source_id, source_name) VALUES (?1, ?2)",
        params![source.source_id, source.source_name],
    )?;
    Ok(())
}

fn insert_user(conn: &Connection, user: &User) -> MetricsResult<()> {
    conn.execute(
        "INSERT INTO Users (user_id, signup_date, plan_id, source_id) VALUES (?1, ?2, ?3, ?4)",
        params![
            user.user_id,
            format_timestamp(user.signup_date),
            user.plan_id,
            user.source_id,
        ],
    )?;
    Ok(())
}

fn insert_event(conn: &Connection, event: &Event) -> MetricsResult<()> {
    conn.execute(
        "INSERT INTO Events (user_id, event_type, event_date) VALUES (?1, ?2, ?3)",
        params![event.user_id, event.event_type, format_timestamp(event.event_date)],
    )?;
    Ok(())
}

fn warn_skipped(schema: &TableSchema, total: usize, kept: usize) {
    if kept < total {
        log::warn!(
            "{}: skipped {} rows with unparseable dates",
            schema.name,
            total - kept
        );
    }
}
