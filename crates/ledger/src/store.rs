use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info, warn};

use lazyhire_core::config::DatabaseConfig;
use lazyhire_core::{
    ApplicationId, ApplicationRecord, ApplicationStatus, DocumentUpdate, NewApplication,
};

use crate::error::LedgerError;

const INSERT_SQL: &str = r#"INSERT INTO applications
    (title, company, location, status, notes, date_applied, source, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT DO NOTHING
    RETURNING *"#;

/// Raw `applications` row as stored by SQLite.
#[derive(Debug, sqlx::FromRow)]
struct ApplicationRow {
    id: i64,
    title: String,
    company: String,
    location: Option<String>,
    status: String,
    notes: Option<String>,
    date_applied: Option<String>,
    source: Option<String>,
    document_url: Option<String>,
    contact_name: Option<String>,
    contact_phone: Option<String>,
    contact_email: Option<String>,
    cv_created: bool,
    cover_letter_created: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for ApplicationRecord {
    type Error = LedgerError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        let status = ApplicationStatus::from_str(&row.status).map_err(|e| LedgerError::Corrupt {
            id: row.id,
            reason: e.to_string(),
        })?;
        Ok(ApplicationRecord {
            id: row.id,
            title: row.title,
            company: row.company,
            location: row.location,
            status,
            notes: row.notes,
            date_applied: row.date_applied,
            source: row.source,
            document_url: row.document_url,
            contact_name: row.contact_name,
            contact_phone: row.contact_phone,
            contact_email: row.contact_email,
            cv_created: row.cv_created,
            cover_letter_created: row.cover_letter_created,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Result of a committed bulk insert.
#[derive(Debug, Clone, Default)]
pub struct InsertOutcome {
    /// Newly persisted records, in batch order.
    pub inserted: Vec<ApplicationRecord>,
    /// Rows skipped because their natural key was already present.
    pub skipped_duplicates: usize,
}

/// SQLite-backed application ledger. Cheap to clone (shares the pool).
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Open (creating if missing) the database at `config.url` and apply migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, LedgerError> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        ensure_parent_dir(options.get_filename())?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;
        info!("SQLite ledger connected: {}", config.url);

        let ledger = Self { pool };
        ledger.migrate().await?;
        Ok(ledger)
    }

    /// Private in-memory ledger. A single connection is kept alive for the
    /// lifetime of the pool, since each SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, LedgerError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let ledger = Self { pool };
        ledger.migrate().await?;
        Ok(ledger)
    }

    pub async fn migrate(&self) -> Result<(), LedgerError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        debug!("Ledger migrations applied");
        Ok(())
    }

    /// Insert a batch inside one transaction.
    ///
    /// Every row is validated and inserted in order. The first rejected row
    /// rolls back the whole transaction and returns [`LedgerError::RowRejected`];
    /// nothing from the batch becomes visible. Rows whose natural key
    /// (title, company, source) already exists are skipped, not rejected.
    pub async fn insert_many(
        &self,
        records: &[NewApplication],
    ) -> Result<InsertOutcome, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let mut outcome = InsertOutcome {
            inserted: Vec::with_capacity(records.len()),
            skipped_duplicates: 0,
        };

        for (index, record) in records.iter().enumerate() {
            match insert_row(&mut tx, record).await {
                Ok(Some(row)) => {
                    debug!(id = row.id, title = %row.title, "Inserted application");
                    outcome.inserted.push(row);
                }
                Ok(None) => {
                    debug!(title = %record.title, company = %record.company, "Skipped duplicate application");
                    outcome.skipped_duplicates += 1;
                }
                Err(e) => {
                    warn!(index, title = %record.title, error = %e, "Row rejected, rolling back batch");
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(error = %rollback_err, "Rollback failed; transaction dropped");
                    }
                    return Err(LedgerError::RowRejected {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tx.commit().await?;
        info!(
            inserted = outcome.inserted.len(),
            skipped = outcome.skipped_duplicates,
            "Batch committed"
        );
        Ok(outcome)
    }

    /// Insert a single record (manual-add path).
    ///
    /// Fails with [`LedgerError::Invalid`] when the record breaks an invariant.
    /// A manual record carries no source, so it is never a duplicate.
    pub async fn insert(&self, record: &NewApplication) -> Result<ApplicationRecord, LedgerError> {
        record.validate()?;
        let mut tx = self.pool.begin().await?;
        let row = insert_row(&mut tx, record).await?;
        tx.commit().await?;
        row.ok_or_else(|| {
            LedgerError::Database(sqlx::Error::Protocol(
                "insert returned no row for a non-duplicate record".to_string(),
            ))
        })
    }

    /// Every record, newest first.
    pub async fn list_recent(&self) -> Result<Vec<ApplicationRecord>, LedgerError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ApplicationRecord::try_from).collect()
    }

    pub async fn get(&self, id: ApplicationId) -> Result<ApplicationRecord, LedgerError> {
        sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::NotFound(id))?
            .try_into()
    }

    pub async fn count(&self) -> Result<i64, LedgerError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Move a record to any status.
    pub async fn update_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ApplicationRecord, LedgerError> {
        sqlx::query_as::<_, ApplicationRow>(
            "UPDATE applications SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LedgerError::NotFound(id))?
        .try_into()
    }

    /// Flip document-generation flags and the generated-document URL.
    pub async fn update_documents(
        &self,
        id: ApplicationId,
        update: &DocumentUpdate,
    ) -> Result<ApplicationRecord, LedgerError> {
        sqlx::query_as::<_, ApplicationRow>(
            r#"UPDATE applications SET
                   cv_created = COALESCE(?, cv_created),
                   cover_letter_created = COALESCE(?, cover_letter_created),
                   document_url = COALESCE(?, document_url),
                   updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(update.cv_created)
        .bind(update.cover_letter_created)
        .bind(update.document_url.as_deref())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LedgerError::NotFound(id))?
        .try_into()
    }

    pub async fn delete(&self, id: ApplicationId) -> Result<(), LedgerError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(id));
        }
        info!(id, "Application deleted");
        Ok(())
    }
}

/// Validate and insert one row inside `tx`. `Ok(None)` means a duplicate was skipped.
async fn insert_row(
    tx: &mut Transaction<'_, Sqlite>,
    record: &NewApplication,
) -> Result<Option<ApplicationRecord>, LedgerError> {
    record.validate()?;
    let now = Utc::now();
    let row = sqlx::query_as::<_, ApplicationRow>(INSERT_SQL)
        .bind(&record.title)
        .bind(&record.company)
        .bind(record.location.as_deref())
        .bind(record.status.as_str())
        .bind(record.notes.as_deref())
        .bind(record.date_applied.as_deref())
        .bind(record.source.as_deref())
        .bind(now)
        .bind(now)
        .fetch_optional(&mut **tx)
        .await?;
    row.map(ApplicationRecord::try_from).transpose()
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if path.as_os_str().is_empty() || path == Path::new(":memory:") {
        return Ok(());
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visma() -> NewApplication {
        NewApplication::new("Frontend Engineer", "Visma Oy")
            .location("Finland (Remote)")
            .notes("High priority match due to React/Vue experience.")
            .source("test")
    }

    fn abb() -> NewApplication {
        NewApplication::new("Node.js Backend Developer", "ABB Oy")
            .location("Tampere, Finland")
            .source("test")
    }

    #[tokio::test]
    async fn insert_many_commits_whole_batch() {
        let ledger = Ledger::in_memory().await.unwrap();
        let outcome = ledger.insert_many(&[visma(), abb()]).await.unwrap();

        assert_eq!(outcome.inserted.len(), 2);
        assert_eq!(outcome.skipped_duplicates, 0);
        assert!(outcome.inserted[0].id < outcome.inserted[1].id);
        assert_eq!(outcome.inserted[0].title, "Frontend Engineer");
        assert_eq!(outcome.inserted[1].status, ApplicationStatus::New);
        assert_eq!(ledger.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn insert_many_empty_batch_is_noop() {
        let ledger = Ledger::in_memory().await.unwrap();
        let outcome = ledger.insert_many(&[]).await.unwrap();
        assert!(outcome.inserted.is_empty());
        assert_eq!(ledger.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejected_row_rolls_back_earlier_rows() {
        let ledger = Ledger::in_memory().await.unwrap();
        ledger.insert_many(&[visma()]).await.unwrap();

        let bad = NewApplication::new("", "Nobody Oy").source("test");
        let err = ledger.insert_many(&[abb(), bad]).await.unwrap_err();

        assert!(
            matches!(err, LedgerError::RowRejected { index: 1, .. }),
            "got: {err:?}"
        );
        let titles: Vec<String> = ledger
            .list_recent()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Frontend Engineer".to_string()]);
    }

    #[tokio::test]
    async fn check_constraint_rejects_blank_company() {
        let ledger = Ledger::in_memory().await.unwrap();
        // Bypass validation to reach the schema constraint directly.
        let err = sqlx::query(
            "INSERT INTO applications (title, company, created_at, updated_at) VALUES ('Dev', '  ', ?, ?)",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&ledger.pool)
        .await;
        assert!(err.is_err());
        assert_eq!(ledger.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicates_from_same_source_are_skipped() {
        let ledger = Ledger::in_memory().await.unwrap();
        ledger.insert_many(&[visma(), abb()]).await.unwrap();

        let again = ledger.insert_many(&[visma(), abb()]).await.unwrap();
        assert!(again.inserted.is_empty());
        assert_eq!(again.skipped_duplicates, 2);

        let other_source = visma().source("other-board");
        let outcome = ledger.insert_many(&[other_source]).await.unwrap();
        assert_eq!(outcome.inserted.len(), 1);
        assert_eq!(ledger.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn manual_records_are_never_deduplicated() {
        let ledger = Ledger::in_memory().await.unwrap();
        let manual = NewApplication::new("Frontend Engineer", "Visma Oy");
        ledger.insert(&manual).await.unwrap();
        ledger.insert(&manual).await.unwrap();
        assert_eq!(ledger.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn insert_rejects_invalid_record() {
        let ledger = Ledger::in_memory().await.unwrap();
        let err = ledger
            .insert(&NewApplication::new("Dev", " "))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Invalid(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn list_recent_is_newest_first() {
        let ledger = Ledger::in_memory().await.unwrap();
        ledger.insert(&NewApplication::new("First", "A")).await.unwrap();
        ledger.insert(&NewApplication::new("Second", "B")).await.unwrap();
        ledger.insert(&NewApplication::new("Third", "C")).await.unwrap();

        let titles: Vec<String> = ledger
            .list_recent()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Third", "Second", "First"]);
    }

    #[tokio::test]
    async fn status_transitions_are_unconstrained() {
        let ledger = Ledger::in_memory().await.unwrap();
        let record = ledger.insert(&NewApplication::new("Dev", "Acme")).await.unwrap();

        let offer = ledger
            .update_status(record.id, ApplicationStatus::Offer)
            .await
            .unwrap();
        assert_eq!(offer.status, ApplicationStatus::Offer);

        let back = ledger
            .update_status(record.id, ApplicationStatus::New)
            .await
            .unwrap();
        assert_eq!(back.status, ApplicationStatus::New);
        assert_eq!(back.id, record.id);
    }

    #[tokio::test]
    async fn update_status_unknown_id() {
        let ledger = Ledger::in_memory().await.unwrap();
        let err = ledger
            .update_status(42, ApplicationStatus::Applied)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(42)));
    }

    #[tokio::test]
    async fn document_flags_update_only_given_fields() {
        let ledger = Ledger::in_memory().await.unwrap();
        let record = ledger.insert(&NewApplication::new("Dev", "Acme")).await.unwrap();
        assert!(!record.cv_created);

        let updated = ledger
            .update_documents(
                record.id,
                &DocumentUpdate {
                    cv_created: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.cv_created);
        assert!(!updated.cover_letter_created);

        let updated = ledger
            .update_documents(
                record.id,
                &DocumentUpdate {
                    cover_letter_created: Some(true),
                    document_url: Some("https://docs.example.com/acme".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.cv_created);
        assert!(updated.cover_letter_created);
        assert_eq!(
            updated.document_url.as_deref(),
            Some("https://docs.example.com/acme")
        );
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let ledger = Ledger::in_memory().await.unwrap();
        let record = ledger.insert(&NewApplication::new("Dev", "Acme")).await.unwrap();

        ledger.delete(record.id).await.unwrap();
        assert!(matches!(
            ledger.get(record.id).await,
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.delete(record.id).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn parent_dir_skips_memory_and_bare_names() {
        assert!(ensure_parent_dir(Path::new(":memory:")).is_ok());
        assert!(ensure_parent_dir(Path::new("lazyhire.sqlite")).is_ok());
    }
}
