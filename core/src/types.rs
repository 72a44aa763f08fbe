//! Shared primitive types used across every engine.

/// Identifier of a user. The join key for every other table.
pub type UserId = i64;

pub type PlanId = i64;

pub type SourceId = i64;

/// A timezone-free instant. Date-only inputs land on midnight.
pub type Timestamp = chrono::NaiveDateTime;
