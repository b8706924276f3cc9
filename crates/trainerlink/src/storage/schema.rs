//! `SQLite` schema definitions for trainerlink.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the trainers table.
pub const CREATE_TRAINERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS trainers (
    trainer_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    sport TEXT,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    radius_meters REAL NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the students table.
pub const CREATE_STUDENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS students (
    student_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    trainer_id TEXT NOT NULL REFERENCES trainers(trainer_id),
    sport TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create an index on the student's trainer.
pub const CREATE_STUDENT_TRAINER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_students_trainer ON students(trainer_id)
";

/// SQL statement to create the attendance table.
///
/// The `UNIQUE (user_id, day)` constraint is what keeps attendance to one
/// record per user per day, even under concurrent confirmation attempts.
pub const CREATE_ATTENDANCE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    day TEXT NOT NULL,
    confirmed INTEGER NOT NULL,
    latitude REAL,
    longitude REAL,
    confirmed_at TEXT NOT NULL,
    UNIQUE (user_id, day)
)
";

/// SQL statement to create the per-user key-value table.
pub const CREATE_USER_KV_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS user_kv (
    user_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (user_id, key)
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_TRAINERS_TABLE,
    CREATE_STUDENTS_TABLE,
    CREATE_STUDENT_TRAINER_INDEX,
    CREATE_ATTENDANCE_TABLE,
    CREATE_USER_KV_TABLE,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_attendance_table_is_unique_per_user_and_day() {
        assert!(CREATE_ATTENDANCE_TABLE.contains("UNIQUE (user_id, day)"));
    }

    #[test]
    fn test_trainers_table_stores_fence() {
        assert!(CREATE_TRAINERS_TABLE.contains("latitude REAL NOT NULL"));
        assert!(CREATE_TRAINERS_TABLE.contains("longitude REAL NOT NULL"));
        assert!(CREATE_TRAINERS_TABLE.contains("radius_meters REAL NOT NULL"));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
