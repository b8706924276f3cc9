//! Storage layer for trainerlink.
//!
//! This module provides `SQLite`-based persistent storage for trainer and
//! student profiles, attendance records and per-user key-value state. It is
//! the concrete [`ProfileStore`] and [`KeyValueStore`] used by the binary.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::attendance::AttendanceRecord;
use crate::error::{Error, Result};
use crate::geo::{GeoFence, GeoPoint};
use crate::profile::{StudentProfile, TrainerProfile};
use crate::store::{CreateOutcome, KeyValueStore, ProfileStore};

/// Text format of the `attendance.day` column.
const DAY_FORMAT: &str = "%Y-%m-%d";

/// Storage engine for profiles and attendance.
///
/// The connection sits behind a mutex so a single `Storage` can be shared by
/// async tasks; every operation holds the lock for one short statement or
/// statement pair and never across an `.await`.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("storage connection lock poisoned"))
    }

    // === Trainers ===

    /// Register a new trainer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the trainer id is taken, or an error
    /// if the database operation fails.
    pub fn register_trainer(&self, trainer: &TrainerProfile) -> Result<()> {
        trainer.fence.validate()?;
        let conn = self.conn()?;

        if Self::trainer_exists(&conn, &trainer.trainer_id)? {
            return Err(Error::invalid_input(format!(
                "trainer id {} is already registered",
                trainer.trainer_id
            )));
        }

        conn.execute(
            r"
            INSERT INTO trainers (trainer_id, name, sport, latitude, longitude, radius_meters)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                trainer.trainer_id,
                trainer.name,
                trainer.sport,
                trainer.fence.center.latitude,
                trainer.fence.center.longitude,
                trainer.fence.radius_meters,
            ],
        )?;

        info!("Registered trainer {}", trainer.trainer_id);
        Ok(())
    }

    /// Replace a trainer's geofence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed fence,
    /// [`Error::NotFound`] for an unknown trainer, or an error if the database
    /// operation fails.
    pub fn update_fence(&self, trainer_id: &str, fence: &GeoFence) -> Result<()> {
        fence.validate()?;
        let affected = self.conn()?.execute(
            r"
            UPDATE trainers
            SET latitude = ?2, longitude = ?3, radius_meters = ?4, updated_at = datetime('now')
            WHERE trainer_id = ?1
            ",
            params![
                trainer_id,
                fence.center.latitude,
                fence.center.longitude,
                fence.radius_meters,
            ],
        )?;

        if affected == 0 {
            return Err(Error::not_found("trainer", trainer_id));
        }
        info!("Updated geofence for trainer {}", trainer_id);
        Ok(())
    }

    /// Get a trainer profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_trainer(&self, trainer_id: &str) -> Result<Option<TrainerProfile>> {
        let trainer = self
            .conn()?
            .query_row(
                r"
                SELECT trainer_id, name, sport, latitude, longitude, radius_meters
                FROM trainers WHERE trainer_id = ?1
                ",
                [trainer_id],
                |row| {
                    Ok(TrainerProfile {
                        trainer_id: row.get(0)?,
                        name: row.get(1)?,
                        sport: row.get(2)?,
                        fence: GeoFence {
                            center: GeoPoint::new(row.get(3)?, row.get(4)?),
                            radius_meters: row.get(5)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(trainer)
    }

    /// Get the geofence registered by a trainer.
    ///
    /// The stored values are returned as-is; the evaluator validates them.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn fence_for_trainer(&self, trainer_id: &str) -> Result<Option<GeoFence>> {
        let fence = self
            .conn()?
            .query_row(
                "SELECT latitude, longitude, radius_meters FROM trainers WHERE trainer_id = ?1",
                [trainer_id],
                |row| {
                    Ok(GeoFence {
                        center: GeoPoint::new(row.get(0)?, row.get(1)?),
                        radius_meters: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(fence)
    }

    fn trainer_exists(conn: &Connection, trainer_id: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM trainers WHERE trainer_id = ?1",
            [trainer_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // === Students ===

    /// Register a student under an existing trainer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the trainer does not exist,
    /// [`Error::InvalidInput`] if the student id is taken, or an error if the
    /// database operation fails.
    pub fn register_student(&self, student: &StudentProfile) -> Result<()> {
        let conn = self.conn()?;

        if !Self::trainer_exists(&conn, &student.trainer_id)? {
            return Err(Error::not_found("trainer", student.trainer_id.clone()));
        }

        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM students WHERE student_id = ?1",
            [&student.student_id],
            |row| row.get(0),
        )?;
        if taken > 0 {
            return Err(Error::invalid_input(format!(
                "student id {} is already registered",
                student.student_id
            )));
        }

        conn.execute(
            "INSERT INTO students (student_id, name, trainer_id, sport) VALUES (?1, ?2, ?3, ?4)",
            params![
                student.student_id,
                student.name,
                student.trainer_id,
                student.sport
            ],
        )?;

        info!(
            "Registered student {} with trainer {}",
            student.student_id, student.trainer_id
        );
        Ok(())
    }

    /// Get a student profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_student(&self, student_id: &str) -> Result<Option<StudentProfile>> {
        let student = self
            .conn()?
            .query_row(
                "SELECT student_id, name, trainer_id, sport FROM students WHERE student_id = ?1",
                [student_id],
                Self::row_to_student,
            )
            .optional()?;
        Ok(student)
    }

    /// All students linked to a trainer, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn roster(&self, trainer_id: &str) -> Result<Vec<StudentProfile>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r"
            SELECT student_id, name, trainer_id, sport
            FROM students WHERE trainer_id = ?1 ORDER BY name, student_id
            ",
        )?;
        let students = stmt
            .query_map([trainer_id], Self::row_to_student)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(students)
    }

    /// Trainer a student is linked to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn trainer_of_student(&self, student_id: &str) -> Result<Option<String>> {
        let trainer_id = self
            .conn()?
            .query_row(
                "SELECT trainer_id FROM students WHERE student_id = ?1",
                [student_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(trainer_id)
    }

    fn row_to_student(row: &rusqlite::Row) -> rusqlite::Result<StudentProfile> {
        Ok(StudentProfile {
            student_id: row.get(0)?,
            name: row.get(1)?,
            trainer_id: row.get(2)?,
            sport: row.get(3)?,
        })
    }

    // === Attendance ===

    /// Attendance record for a user on a day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn attendance_on(&self, user_id: &str, day: NaiveDate) -> Result<Option<AttendanceRecord>> {
        let conn = self.conn()?;
        Self::select_attendance(&conn, user_id, day)
    }

    fn select_attendance(
        conn: &Connection,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>> {
        let record = conn
            .query_row(
                r"
                SELECT user_id, day, confirmed, latitude, longitude, confirmed_at
                FROM attendance WHERE user_id = ?1 AND day = ?2
                ",
                params![user_id, day.format(DAY_FORMAT).to_string()],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Insert a record unless a confirmed one exists for the same user and day.
    ///
    /// A stored unconfirmed row is overwritten by a confirmed record. The write
    /// is a single `INSERT .. ON CONFLICT DO UPDATE .. WHERE` statement, so it
    /// either writes the whole row or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_attendance_if_absent(&self, record: &AttendanceRecord) -> Result<CreateOutcome> {
        let conn = self.conn()?;
        let day = record.day.format(DAY_FORMAT).to_string();

        let affected = conn.execute(
            r"
            INSERT INTO attendance (user_id, day, confirmed, latitude, longitude, confirmed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (user_id, day) DO UPDATE SET
                confirmed = excluded.confirmed,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                confirmed_at = excluded.confirmed_at
            WHERE attendance.confirmed = 0 AND excluded.confirmed = 1
            ",
            params![
                record.user_id,
                day,
                record.confirmed,
                record.confirmed_at_position.map(|p| p.latitude),
                record.confirmed_at_position.map(|p| p.longitude),
                record.confirmed_at.to_rfc3339(),
            ],
        )?;

        if affected > 0 {
            debug!("Created attendance record for {} on {}", record.user_id, day);
            return Ok(CreateOutcome::Created(record.clone()));
        }

        debug!(
            "Attendance record for {} on {} already exists",
            record.user_id, day
        );
        Self::select_attendance(&conn, &record.user_id, record.day)?
            .map(CreateOutcome::AlreadyExists)
            .ok_or_else(|| Error::internal("attendance insert ignored but no record found"))
    }

    /// Records for a user with `since <= day <= until`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn attendance_between(
        &self,
        user_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r"
            SELECT user_id, day, confirmed, latitude, longitude, confirmed_at
            FROM attendance WHERE user_id = ?1 AND day >= ?2 AND day <= ?3
            ORDER BY day ASC
            ",
        )?;
        let records = stmt
            .query_map(
                params![
                    user_id,
                    since.format(DAY_FORMAT).to_string(),
                    until.format(DAY_FORMAT).to_string()
                ],
                Self::row_to_record,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Convert a database row to an `AttendanceRecord`.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<AttendanceRecord> {
        let user_id: String = row.get(0)?;
        let day_str: String = row.get(1)?;
        let confirmed: bool = row.get(2)?;
        let latitude: Option<f64> = row.get(3)?;
        let longitude: Option<f64> = row.get(4)?;
        let confirmed_at_str: String = row.get(5)?;

        let day = NaiveDate::parse_from_str(&day_str, DAY_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
        let confirmed_at = DateTime::parse_from_rfc3339(&confirmed_at_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
            .with_timezone(&Utc);

        let confirmed_at_position = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        };

        Ok(AttendanceRecord {
            user_id,
            day,
            confirmed,
            confirmed_at_position,
            confirmed_at,
        })
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<i64> {
            let n = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
            Ok(n)
        };

        let trainers = count("trainers")?;
        let students = count("students")?;
        let attendance_records = count("attendance")?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            trainers,
            students,
            attendance_records,
            db_size_bytes,
        })
    }
}

impl KeyValueStore for Storage {
    fn get_value(&self, user_id: &str, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM user_kv WHERE user_id = ?1 AND key = ?2",
                [user_id, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put_value(&self, user_id: &str, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            r"
            INSERT INTO user_kv (user_id, key, value) VALUES (?1, ?2, ?3)
            ON CONFLICT (user_id, key)
            DO UPDATE SET value = excluded.value, updated_at = datetime('now')
            ",
            [user_id, key, value],
        )?;
        Ok(())
    }

    fn remove_value(&self, user_id: &str, key: &str) -> Result<bool> {
        let affected = self.conn()?.execute(
            "DELETE FROM user_kv WHERE user_id = ?1 AND key = ?2",
            [user_id, key],
        )?;
        Ok(affected > 0)
    }
}

#[async_trait::async_trait]
impl ProfileStore for Storage {
    async fn get_fence(&self, trainer_id: &str) -> Result<Option<GeoFence>> {
        self.fence_for_trainer(trainer_id)
    }

    async fn trainer_for(&self, user_id: &str) -> Result<Option<String>> {
        self.trainer_of_student(user_id)
    }

    async fn get_attendance_record(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>> {
        self.attendance_on(user_id, day)
    }

    async fn create_attendance_record(&self, record: &AttendanceRecord) -> Result<CreateOutcome> {
        self.insert_attendance_if_absent(record)
    }

    async fn list_attendance_records(
        &self,
        user_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        self.attendance_between(user_id, since, until)
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of registered trainers.
    pub trainers: i64,
    /// Number of registered students.
    pub students: i64,
    /// Number of attendance records.
    pub attendance_records: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn trainer(id: &str) -> TrainerProfile {
        TrainerProfile::new(
            id,
            "Sam Rivera",
            Some("Soccer".to_string()),
            GeoFence::new(GeoPoint::new(34.0549, -118.2426), 100.0).unwrap(),
        )
        .unwrap()
    }

    fn storage_with_student() -> Storage {
        let storage = create_test_storage();
        storage.register_trainer(&trainer("TR100001")).unwrap();
        storage
            .register_student(&StudentProfile::new("s1", "Alice", "TR100001", None).unwrap())
            .unwrap();
        storage
    }

    #[test]
    fn test_open_in_memory() {
        let storage = Storage::open_in_memory();
        assert!(storage.is_ok());
        assert_eq!(storage.unwrap().path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_register_and_get_trainer() {
        let storage = create_test_storage();
        storage.register_trainer(&trainer("TR100001")).unwrap();

        let loaded = storage.get_trainer("TR100001").unwrap().unwrap();
        assert_eq!(loaded, trainer("TR100001"));
        assert!(storage.get_trainer("TR999999").unwrap().is_none());
    }

    #[test]
    fn test_register_trainer_twice() {
        let storage = create_test_storage();
        storage.register_trainer(&trainer("TR100001")).unwrap();
        let err = storage.register_trainer(&trainer("TR100001")).unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_update_fence() {
        let storage = create_test_storage();
        storage.register_trainer(&trainer("TR100001")).unwrap();

        let moved = GeoFence::new(GeoPoint::new(40.0, -74.0), 250.0).unwrap();
        storage.update_fence("TR100001", &moved).unwrap();
        assert_eq!(storage.fence_for_trainer("TR100001").unwrap(), Some(moved));
    }

    #[test]
    fn test_update_fence_unknown_trainer() {
        let storage = create_test_storage();
        let fence = GeoFence::new(GeoPoint::new(0.0, 0.0), 10.0).unwrap();
        let err = storage.update_fence("TR999999", &fence).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "trainer", .. }));
    }

    #[test]
    fn test_update_fence_rejects_invalid() {
        let storage = create_test_storage();
        storage.register_trainer(&trainer("TR100001")).unwrap();
        let bad = GeoFence {
            center: GeoPoint::new(0.0, 200.0),
            radius_meters: 10.0,
        };
        assert!(storage.update_fence("TR100001", &bad).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_register_student_requires_trainer() {
        let storage = create_test_storage();
        let student = StudentProfile::new("s1", "Alice", "TR404040", None).unwrap();
        let err = storage.register_student(&student).unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: "trainer", .. }));
    }

    #[test]
    fn test_register_student_twice() {
        let storage = storage_with_student();
        let again = StudentProfile::new("s1", "Alice B", "TR100001", None).unwrap();
        assert!(storage.register_student(&again).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_student_lookup_and_roster() {
        let storage = storage_with_student();
        storage
            .register_student(&StudentProfile::new("s2", "Aaron", "TR100001", None).unwrap())
            .unwrap();

        assert_eq!(
            storage.trainer_of_student("s1").unwrap().as_deref(),
            Some("TR100001")
        );
        assert!(storage.trainer_of_student("nobody").unwrap().is_none());
        assert_eq!(storage.get_student("s1").unwrap().unwrap().name, "Alice");

        let names: Vec<String> = storage
            .roster("TR100001")
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Aaron".to_string(), "Alice".to_string()]);
    }

    #[test]
    fn test_insert_attendance_once_per_day() {
        let storage = storage_with_student();
        let first = AttendanceRecord::confirmed("s1", day(1), GeoPoint::new(34.0549, -118.2426));
        let second = AttendanceRecord::confirmed("s1", day(1), GeoPoint::new(34.0550, -118.2427));

        let created = storage.insert_attendance_if_absent(&first).unwrap();
        assert!(matches!(created, CreateOutcome::Created(_)));

        match storage.insert_attendance_if_absent(&second).unwrap() {
            CreateOutcome::AlreadyExists(existing) => {
                assert_eq!(existing.confirmed_at_position, first.confirmed_at_position);
            }
            CreateOutcome::Created(_) => panic!("second insert should not create a record"),
        }
        assert_eq!(storage.stats().unwrap().attendance_records, 1);
    }

    #[test]
    fn test_confirmed_insert_replaces_unconfirmed_row() {
        let storage = storage_with_student();
        let position = GeoPoint::new(34.0549, -118.2426);
        let pending = AttendanceRecord {
            confirmed: false,
            confirmed_at_position: None,
            ..AttendanceRecord::confirmed("s1", day(2), position)
        };

        assert!(matches!(
            storage.insert_attendance_if_absent(&pending).unwrap(),
            CreateOutcome::Created(_)
        ));
        // Unconfirmed over unconfirmed changes nothing.
        match storage.insert_attendance_if_absent(&pending).unwrap() {
            CreateOutcome::AlreadyExists(existing) => assert!(!existing.confirmed),
            CreateOutcome::Created(_) => panic!("unconfirmed insert should not overwrite"),
        }

        let confirmed = AttendanceRecord::confirmed("s1", day(2), position);
        assert!(matches!(
            storage.insert_attendance_if_absent(&confirmed).unwrap(),
            CreateOutcome::Created(_)
        ));

        let loaded = storage.attendance_on("s1", day(2)).unwrap().unwrap();
        assert!(loaded.confirmed);
        assert_eq!(loaded.confirmed_at_position, Some(position));

        match storage.insert_attendance_if_absent(&pending).unwrap() {
            CreateOutcome::AlreadyExists(existing) => assert!(existing.confirmed),
            CreateOutcome::Created(_) => panic!("confirmed row should not be downgraded"),
        }
        assert_eq!(storage.stats().unwrap().attendance_records, 1);
    }

    #[test]
    fn test_attendance_round_trips_fields() {
        let storage = storage_with_student();
        let record = AttendanceRecord::confirmed("s1", day(5), GeoPoint::new(34.0549, -118.2426));
        storage.insert_attendance_if_absent(&record).unwrap();

        let loaded = storage.attendance_on("s1", day(5)).unwrap().unwrap();
        assert_eq!(loaded.day, day(5));
        assert!(loaded.confirmed);
        assert_eq!(loaded.confirmed_at_position, record.confirmed_at_position);
        assert_eq!(
            loaded.confirmed_at.timestamp_micros(),
            record.confirmed_at.timestamp_micros()
        );
        assert!(storage.attendance_on("s1", day(6)).unwrap().is_none());
    }

    #[test]
    fn test_attendance_between() {
        let storage = storage_with_student();
        for d in [3, 1, 10, 7] {
            storage
                .insert_attendance_if_absent(&AttendanceRecord::confirmed(
                    "s1",
                    day(d),
                    GeoPoint::new(0.0, 0.0),
                ))
                .unwrap();
        }

        let days: Vec<NaiveDate> = storage
            .attendance_between("s1", day(2), day(7))
            .unwrap()
            .into_iter()
            .map(|r| r.day)
            .collect();
        assert_eq!(days, vec![day(3), day(7)]);
    }

    #[test]
    fn test_key_value_store() {
        let storage = create_test_storage();
        assert!(storage.get_value("s1", "tasks").unwrap().is_none());

        storage.put_value("s1", "tasks", "[]").unwrap();
        storage.put_value("s1", "tasks", "[1]").unwrap();
        storage.put_value("s2", "tasks", "[2]").unwrap();

        assert_eq!(storage.get_value("s1", "tasks").unwrap().as_deref(), Some("[1]"));
        assert_eq!(storage.get_value("s2", "tasks").unwrap().as_deref(), Some("[2]"));

        assert!(storage.remove_value("s1", "tasks").unwrap());
        assert!(!storage.remove_value("s1", "tasks").unwrap());
        assert!(storage.get_value("s1", "tasks").unwrap().is_none());
    }

    #[test]
    fn test_stats() {
        let storage = storage_with_student();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.trainers, 1);
        assert_eq!(stats.students, 1);
        assert_eq!(stats.attendance_records, 0);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[tokio::test]
    async fn test_profile_store_impl() {
        let storage = storage_with_student();
        let store: &dyn ProfileStore = &storage;

        assert_eq!(
            store.trainer_for("s1").await.unwrap().as_deref(),
            Some("TR100001")
        );
        assert!(store.get_fence("TR100001").await.unwrap().is_some());

        let record = AttendanceRecord::confirmed("s1", day(2), GeoPoint::new(0.0, 0.0));
        let outcome = store.create_attendance_record(&record).await.unwrap();
        assert_eq!(outcome.into_record().day, day(2));
        assert!(store
            .get_attendance_record("s1", day(2))
            .await
            .unwrap()
            .is_some());
        assert_eq!(
            store
                .list_attendance_records("s1", day(1), day(31))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_open_file_based() {
        let temp_dir = std::env::temp_dir();
        let db_path = temp_dir.join(format!("trainerlink_test_{}.db", std::process::id()));

        let storage = Storage::open(&db_path).unwrap();
        storage.register_trainer(&trainer("TR100001")).unwrap();
        assert_eq!(storage.path(), db_path);
        assert!(storage.stats().unwrap().db_size_bytes > 0);
        drop(storage);

        // Data survives reopening.
        let reopened = Storage::open(&db_path).unwrap();
        assert!(reopened.get_trainer("TR100001").unwrap().is_some());
        drop(reopened);

        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp_dir = std::env::temp_dir();
        let root = temp_dir.join(format!("trainerlink_test_{}", std::process::id()));
        let nested_path = root.join("nested/db.sqlite");
        let _ = std::fs::remove_dir_all(&root);

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());

        drop(storage);
        let _ = std::fs::remove_dir_all(&root);
    }
}
