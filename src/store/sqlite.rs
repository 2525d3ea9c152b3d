// Local SQLite store
// Same record shape as the hosted table; the row id doubles as confirmation number

use super::{CreatedRecord, RecordStore, StoreError};
use crate::record::RegistrationRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Cheap to clone; clones share one connection
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

/// A stored registration row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRegistration {
    pub id: i64,
    pub record: RegistrationRecord,
    pub created_at: String,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    info!(journal_mode = %mode, "sqlite journal mode set");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS registrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            isim_soyisim TEXT NOT NULL,
            yas INTEGER NOT NULL,
            telefon_numarasi TEXT NOT NULL,
            darka_uyesi TEXT NOT NULL,
            misafir_durumu TEXT NOT NULL,
            misafirler TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_registrations_phone ON registrations(telefon_numarasi)",
        [],
    )?;

    Ok(())
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    pub fn insert(&self, record: &RegistrationRecord) -> Result<CreatedRecord, StoreError> {
        let conn = self.lock()?;
        let created_at = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO registrations (
                isim_soyisim, yas, telefon_numarasi, darka_uyesi,
                misafir_durumu, misafirler, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.full_name,
                record.age,
                record.phone,
                record.club_member.label(),
                record.has_guests.label(),
                record.guests,
                created_at,
            ],
        )?;

        let id = conn.last_insert_rowid();
        let fields = match serde_json::to_value(record) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => serde_json::Map::new(),
            Err(e) => return Err(StoreError::Decode(e.to_string())),
        };

        Ok(CreatedRecord {
            id: id.to_string(),
            fields,
            created_time: Some(created_at),
        })
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM registrations", [], |row| row.get(0))?;

        Ok(count)
    }

    pub fn all(&self) -> Result<Vec<StoredRegistration>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, isim_soyisim, yas, telefon_numarasi, darka_uyesi,
                    misafir_durumu, misafirler, created_at
             FROM registrations
             ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            let club: String = row.get(4)?;
            let guests_flag: String = row.get(5)?;
            Ok(StoredRegistration {
                id: row.get(0)?,
                record: RegistrationRecord {
                    full_name: row.get(1)?,
                    age: row.get(2)?,
                    phone: row.get(3)?,
                    club_member: club.parse().unwrap_or_default(),
                    has_guests: guests_flag.parse().unwrap_or_default(),
                    guests: row.get(6)?,
                },
                created_at: row.get(7)?,
            })
        })?;

        let mut registrations = Vec::new();
        for row in rows {
            registrations.push(row?);
        }

        Ok(registrations)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create(&self, record: &RegistrationRecord) -> Result<CreatedRecord, StoreError> {
        // rusqlite blocks; keep it off the async workers
        let store = self.clone();
        let record = record.clone();

        tokio::task::spawn_blocking(move || store.insert(&record))
            .await
            .map_err(|e| StoreError::Database(format!("insert task failed: {e}")))?
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::YesNo;

    fn create_test_record(name: &str) -> RegistrationRecord {
        RegistrationRecord {
            full_name: name.to_string(),
            age: 30,
            phone: "+905551234567".to_string(),
            club_member: YesNo::Yes,
            has_guests: YesNo::Yes,
            guests: r#"[{"isim":"ayşe","yas":5}]"#.to_string(),
        }
    }

    #[test]
    fn test_row_ids_are_confirmation_numbers() {
        let store = SqliteStore::in_memory().unwrap();

        let first = store.insert(&create_test_record("Ali Veli")).unwrap();
        let second = store.insert(&create_test_record("Ayşe Yılmaz")).unwrap();

        assert_eq!(first.identifier("id"), Some("1".to_string()));
        assert_eq!(second.identifier("id"), Some("2".to_string()));
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_created_record_echoes_fields() {
        let store = SqliteStore::in_memory().unwrap();

        let created = store.insert(&create_test_record("Ali Veli")).unwrap();

        assert_eq!(created.fields["isim_soyisim"], "Ali Veli");
        assert_eq!(created.fields["darka_uyesi"], "Evet");
        assert!(created.created_time.is_some());
    }

    #[test]
    fn test_all_reads_back_records() {
        let store = SqliteStore::in_memory().unwrap();
        let record = create_test_record("Ali Veli");
        store.insert(&record).unwrap();

        let rows = store.all().unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].record, record);
        assert_eq!(rows[0].record.guest_entries().unwrap()[0].isim, "ayşe");
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();
    }

    #[tokio::test]
    async fn test_create_through_trait() {
        let store = SqliteStore::in_memory().unwrap();
        let store: &dyn RecordStore = &store;

        let created = store.create(&create_test_record("Ali Veli")).await.unwrap();

        assert_eq!(created.id, "1");
        assert_eq!(store.name(), "sqlite");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_creates_get_distinct_ids() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.create(&create_test_record(&format!("Misafir {i}"))).await
            }));
        }

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap().unwrap().id);
        }
        ids.sort_by_key(|id| id.parse::<i64>().unwrap());

        let expected: Vec<String> = (1..=8).map(|n| n.to_string()).collect();
        assert_eq!(ids, expected);
        assert_eq!(store.count().unwrap(), 8);
    }
}
