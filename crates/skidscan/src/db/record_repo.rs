//! Inference-record repository — row types and queries for the
//! `inference_records` and `batches` tables.

use chrono::Utc;
use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A persisted inference record. Never mutated after insertion.
#[derive(Debug, Clone)]
pub struct InferenceRecordRow {
    pub id: i64,
    pub image_name: String,
    pub unique_id: Option<String>,
    pub vin_no: Option<String>,
    pub quantity: Option<u32>,
    pub exclusion: String,
    pub photo_url: Option<String>,
    pub tenant_id: String,
    pub batch_id: Option<String>,
    pub created_at: String,
}

impl InferenceRecordRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            image_name: row.get("image_name")?,
            unique_id: row.get("unique_id")?,
            vin_no: row.get("vin_no")?,
            quantity: row.get("quantity")?,
            exclusion: row.get("exclusion")?,
            photo_url: row.get("photo_url")?,
            tenant_id: row.get("tenant_id")?,
            batch_id: row.get("batch_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Field set for a record about to be inserted; `id` and `created_at` are
/// assigned by the repository.
#[derive(Debug, Clone)]
pub struct NewInferenceRecord {
    pub image_name: String,
    pub unique_id: Option<String>,
    pub vin_no: Option<String>,
    pub quantity: Option<u32>,
    pub exclusion: String,
    pub photo_url: Option<String>,
    pub tenant_id: String,
    pub batch_id: Option<String>,
}

/// Inserts a new record and returns the stored row.
pub fn insert(
    db: &Database,
    record: &NewInferenceRecord,
) -> Result<InferenceRecordRow, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO inference_records
                 (image_name, unique_id, vin_no, quantity, exclusion,
                  photo_url, tenant_id, batch_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.image_name,
                record.unique_id,
                record.vin_no,
                record.quantity,
                record.exclusion,
                record.photo_url,
                record.tenant_id,
                record.batch_id,
                Utc::now().to_rfc3339(),
            ],
        )?;

        let row = conn.query_row(
            "SELECT * FROM inference_records WHERE id = ?1",
            [conn.last_insert_rowid()],
            InferenceRecordRow::from_row,
        )?;
        Ok(row)
    })
}

/// The tenant's most recently issued id, by insertion order (not by value).
pub fn last_issued_id(db: &Database, tenant_id: &str) -> Result<Option<String>, DatabaseError> {
    db.with_conn(|conn| {
        let id = conn
            .query_row(
                "SELECT unique_id FROM inference_records
                 WHERE tenant_id = ?1 AND unique_id IS NOT NULL AND unique_id != ''
                 ORDER BY id DESC LIMIT 1",
                [tenant_id],
                |r| r.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        Ok(id)
    })
}

/// Inserts a manually seeded record (QR pre-generation path) and returns
/// its row id.
pub fn insert_seed(
    db: &Database,
    unique_id: &str,
    vin_no: &str,
    tenant_id: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO inference_records
                 (image_name, unique_id, vin_no, quantity, exclusion,
                  tenant_id, created_at)
             VALUES ('', ?1, ?2, 1, '', ?3, ?4)",
            params![unique_id, vin_no, tenant_id, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Registers a batch row at orchestration start.
pub fn create_batch(
    db: &Database,
    batch_id: &str,
    tenant_id: &str,
    working_dir: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO batches (id, tenant_id, working_dir, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![batch_id, tenant_id, working_dir, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    })
}

/// All records produced by one batch, in insertion order.
pub fn records_for_batch(
    db: &Database,
    batch_id: &str,
) -> Result<Vec<InferenceRecordRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM inference_records WHERE batch_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([batch_id], InferenceRecordRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
