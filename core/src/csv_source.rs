//! Delimited-text source — four comma-separated files with header rows.
//!
//! Files: `Users.csv`, `Events.csv`, `Plans.csv`, `Sources.csv`.
//! Columns are matched by header name, in any order; extra columns are
//! ignored. Fields may be double-quoted with `""` escapes; a quoted field
//! cannot span lines.
//!
//! Unparseable dates are coerced away: the row is skipped and counted in
//! a warning. Unparseable ids and prices are hard parse errors.

use crate::{
    calendar::{format_timestamp, parse_timestamp},
    error::{MetricsError, MetricsResult},
    snapshot::{Event, InputSnapshot, Plan, Source, TableSchema, User, EVENTS, PLANS, SOURCES, USERS},
};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const USERS_FILE: &str = "Users.csv";
pub const EVENTS_FILE: &str = "Events.csv";
pub const PLANS_FILE: &str = "Plans.csv";
pub const SOURCES_FILE: &str = "Sources.csv";

// i64::MAX is not exactly representable; 2^63 is the first float past it.
const I64_MIN_F: f64 = -9_223_372_036_854_775_808.0;
const I64_MAX_F: f64 = 9_223_372_036_854_775_808.0;

/// Load all four files from `dir`.
pub fn load_dir(dir: impl AsRef<Path>) -> MetricsResult<InputSnapshot> {
    let dir = dir.as_ref();
    let read = |name: &str| fs::read_to_string(dir.join(name));

    let users = parse_users(&read(USERS_FILE)?)?;
    let events = parse_events(&read(EVENTS_FILE)?)?;
    let plans = parse_plans(&read(PLANS_FILE)?)?;
    let sources = parse_sources(&read(SOURCES_FILE)?)?;

    log::info!(
        "loaded {}: {} users, {} events",
        dir.display(),
        users.len(),
        events.len()
    );
    Ok(InputSnapshot::new(users, events, plans, sources))
}

/// Write a snapshot as the four files into `dir`, creating it if needed.
pub fn write_dir(snapshot: &InputSnapshot, dir: impl AsRef<Path>) -> MetricsResult<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut out = header(&USERS);
    for u in &snapshot.users {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            u.user_id,
            format_timestamp(u.signup_date),
            u.plan_id.map(|id| id.to_string()).unwrap_or_default(),
            u.source_id.map(|id| id.to_string()).unwrap_or_default(),
        );
    }
    fs::write(dir.join(USERS_FILE), out)?;

    let mut out = header(&EVENTS);
    for e in &snapshot.events {
        let _ = writeln!(
            out,
            "{},{},{}",
            e.user_id,
            quote(&e.event_type),
            format_timestamp(e.event_date)
        );
    }
    fs::write(dir.join(EVENTS_FILE), out)?;

    let mut out = header(&PLANS);
    for p in &snapshot.plans {
        let _ = writeln!(out, "{},{},{}", p.plan_id, quote(&p.plan_name), p.price);
    }
    fs::write(dir.join(PLANS_FILE), out)?;

    let mut out = header(&SOURCES);
    for s in &snapshot.sources {
        let _ = writeln!(out, "{},{}", s.source_id, quote(&s.source_name));
    }
    fs::write(dir.join(SOURCES_FILE), out)?;

    log::info!("wrote snapshot to {}", dir.display());
    Ok(())
}

// ── Per-table parsers ────────────────────────────────────────────────────────

pub fn parse_users(text: &str) -> MetricsResult<Vec<User>> {
    let table = DelimitedTable::parse(&USERS, text)?;
    let mut users = Vec::with_capacity(table.len());
    let mut skipped = 0;
    for record in table.records() {
        let Some(signup_date) = parse_timestamp(record.field("signup_date")) else {
            skipped += 1;
            continue;
        };
        users.push(User {
            user_id: record.id("user_id")?,
            signup_date,
            plan_id: record.optional_id("plan_id")?,
            source_id: record.optional_id("source_id")?,
        });
    }
    warn_skipped(&USERS, skipped);
    Ok(users)
}

pub fn parse_events(text: &str) -> MetricsResult<Vec<Event>> {
    let table = DelimitedTable::parse(&EVENTS, text)?;
    let mut events = Vec::with_capacity(table.len());
    let mut skipped = 0;
    for record in table.records() {
        let Some(event_date) = parse_timestamp(record.field("event_date")) else {
            skipped += 1;
            continue;
        };
        events.push(Event {
            user_id: record.id("user_id")?,
            event_type: record.field("event_type").to_string(),
            event_date,
        });
    }
    warn_skipped(&EVENTS, skipped);
    Ok(events)
}

pub fn parse_plans(text: &str) -> MetricsResult<Vec<Plan>> {
    let table = DelimitedTable::parse(&PLANS, text)?;
    table
        .records()
        .map(|record| {
            Ok(Plan {
                plan_id:   record.id("plan_id")?,
                plan_name: record.field("plan_name").to_string(),
                price:     record.number("price")?,
            })
        })
        .collect()
}

pub fn parse_sources(text: &str) -> MetricsResult<Vec<Source>> {
    let table = DelimitedTable::parse(&SOURCES, text)?;
    table
        .records()
        .map(|record| {
            Ok(Source {
                source_id:   record.id("source_id")?,
                source_name: record.field("source_name").to_string(),
            })
        })
        .collect()
}

// ── Table reader ─────────────────────────────────────────────────────────────

struct DelimitedTable {
    schema: TableSchema,
    header: Vec<String>,
    rows:   Vec<(usize, Vec<String>)>,
}

struct Record<'t> {
    table:  &'t DelimitedTable,
    line:   usize,
    fields: &'t [String],
}

impl DelimitedTable {
    /// Checks the header against the schema before reading any record.
    fn parse(schema: &TableSchema, text: &str) -> MetricsResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
            .filter(|(_, l)| !l.trim().is_empty());

        let header: Vec<String> = match lines.next() {
            Some((_, l)) => split_record(l)
                .into_iter()
                .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
                .collect(),
            None => Vec::new(),
        };
        schema.check(&header)?;

        let rows = lines.map(|(line, l)| (line, split_record(l))).collect();
        Ok(Self { schema: *schema, header, rows })
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |(line, fields)| Record {
            table: self,
            line: *line,
            fields,
        })
    }
}

impl Record<'_> {
    fn field(&self, column: &str) -> &str {
        self.table
            .header
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.fields.get(i))
            .map(|f| f.trim())
            .unwrap_or("")
    }

    fn error(&self, column: &str, message: impl std::fmt::Display) -> MetricsError {
        MetricsError::Parse {
            table:   self.table.schema.name.to_string(),
            line:    self.line,
            message: format!("column '{column}': {message}"),
        }
    }

    /// Integer id; accepts float spellings like `2.0` that spreadsheet
    /// exports produce for integer columns containing blanks. Floats
    /// outside the i64 range are rejected, not saturated.
    fn optional_id(&self, column: &str) -> MetricsResult<Option<i64>> {
        let raw = self.field(column);
        if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("null") {
            return Ok(None);
        }
        if let Ok(id) = raw.parse::<i64>() {
            return Ok(Some(id));
        }
        match raw.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && (I64_MIN_F..I64_MAX_F).contains(&f) => Ok(Some(f as i64)),
            _ => Err(self.error(column, format!("'{raw}' is not an integer id"))),
        }
    }

    fn id(&self, column: &str) -> MetricsResult<i64> {
        self.optional_id(column)?
            .ok_or_else(|| self.error(column, "missing value"))
    }

    fn number(&self, column: &str) -> MetricsResult<f64> {
        let raw = self.field(column);
        raw.parse::<f64>()
            .map_err(|_| self.error(column, format!("'{raw}' is not a number")))
    }
}

/// Split one line on commas, honouring double quotes.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn quote(field: &str) -> String {
    if field.contains([',', '"']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn header(schema: &TableSchema) -> String {
    let mut out = schema.columns.join(",");
    out.push('\n');
    out
}

fn warn_skipped(schema: &TableSchema, skipped: usize) {
    if skipped > 0 {
        log::warn!("{}: skipped {skipped} rows with unparseable dates", schema.name);
    }
}
