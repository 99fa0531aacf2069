use chrono::{DateTime, Utc};
use rxscan_core::{DrugLabel, PrescriptionForm, PrescriptionRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Pool, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA cache_size = -32000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prescriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_name TEXT NOT NULL,
            doctor_name TEXT NOT NULL,
            hospital_name TEXT NOT NULL,
            upload_hash TEXT NOT NULL,
            upload_path TEXT NOT NULL,
            interpreted_word TEXT NOT NULL,
            purpose TEXT,
            keep_out_of_reach_of_children TEXT,
            warnings TEXT,
            dosage_and_administration TEXT,
            pregnancy_or_breast_feeding TEXT,
            stop_use TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_prescriptions_created_at ON prescriptions(created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_prescriptions_upload_hash ON prescriptions(upload_hash)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

const SELECT_COLUMNS: &str = "SELECT id, patient_name, doctor_name, hospital_name, upload_hash, \
     upload_path, interpreted_word, purpose, keep_out_of_reach_of_children, warnings, \
     dosage_and_administration, pregnancy_or_breast_feeding, stop_use, created_at \
     FROM prescriptions";

#[derive(FromRow)]
struct PrescriptionRow {
    id: i64,
    patient_name: String,
    doctor_name: String,
    hospital_name: String,
    upload_hash: String,
    upload_path: String,
    interpreted_word: String,
    purpose: Option<String>,
    keep_out_of_reach_of_children: Option<String>,
    warnings: Option<String>,
    dosage_and_administration: Option<String>,
    pregnancy_or_breast_feeding: Option<String>,
    stop_use: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<PrescriptionRow> for PrescriptionRecord {
    fn from(r: PrescriptionRow) -> Self {
        PrescriptionRecord {
            id: Some(r.id),
            form: PrescriptionForm {
                patient_name: r.patient_name,
                doctor_name: r.doctor_name,
                hospital_name: r.hospital_name,
            },
            upload_hash: r.upload_hash,
            upload_path: r.upload_path,
            interpreted_word: r.interpreted_word,
            label: DrugLabel {
                purpose: r.purpose,
                keep_out_of_reach_of_children: r.keep_out_of_reach_of_children,
                warnings: r.warnings,
                dosage_and_administration: r.dosage_and_administration,
                pregnancy_or_breast_feeding: r.pregnancy_or_breast_feeding,
                stop_use: r.stop_use,
            },
            created_at: Some(r.created_at),
        }
    }
}

/// Stores a processed prescription and returns its row id.
///
/// `created_at` defaults to now when the record has none.
pub async fn insert_prescription(
    pool: &DbPool,
    record: &PrescriptionRecord,
) -> Result<i64, sqlx::Error> {
    let created_at = record.created_at.unwrap_or_else(Utc::now);
    let label = &record.label;

    let result = sqlx::query(
        "INSERT INTO prescriptions (patient_name, doctor_name, hospital_name, upload_hash, upload_path, interpreted_word, purpose, keep_out_of_reach_of_children, warnings, dosage_and_administration, pregnancy_or_breast_feeding, stop_use, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&record.form.patient_name)
    .bind(&record.form.doctor_name)
    .bind(&record.form.hospital_name)
    .bind(&record.upload_hash)
    .bind(&record.upload_path)
    .bind(&record.interpreted_word)
    .bind(&label.purpose)
    .bind(&label.keep_out_of_reach_of_children)
    .bind(&label.warnings)
    .bind(&label.dosage_and_administration)
    .bind(&label.pregnancy_or_breast_feeding)
    .bind(&label.stop_use)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_prescription(
    pool: &DbPool,
    id: i64,
) -> Result<Option<PrescriptionRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, PrescriptionRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(PrescriptionRecord::from))
}

/// Newest first; ties on `created_at` fall back to insertion order.
pub async fn list_recent_prescriptions(
    pool: &DbPool,
    limit: u32,
) -> Result<Vec<PrescriptionRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PrescriptionRow>(&format!(
        "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PrescriptionRecord::from).collect())
}
