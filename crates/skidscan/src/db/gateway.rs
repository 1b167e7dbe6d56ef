//! Persistence collaborator boundary.
//!
//! Every call is an independent, auto-committing unit; no cross-record
//! transaction spans a batch.

use super::record_repo::{self, InferenceRecordRow, NewInferenceRecord};
use super::{Database, DatabaseError};

pub trait PersistenceGateway: Send + Sync {
    /// Persists one record and returns it with its assigned id.
    fn create_record(
        &self,
        record: NewInferenceRecord,
    ) -> Result<InferenceRecordRow, DatabaseError>;

    /// The tenant's most recently issued id by insertion order, or `None`
    /// for a fresh tenant.
    fn last_issued_id(&self, tenant_id: &str) -> Result<Option<String>, DatabaseError>;

    /// Inserts a manually seeded record and returns its row id.
    fn insert_seed_record(
        &self,
        unique_id: &str,
        vin_no: &str,
        tenant_id: &str,
    ) -> Result<i64, DatabaseError>;

    /// Registers a batch at orchestration start.
    fn create_batch(
        &self,
        batch_id: &str,
        tenant_id: &str,
        working_dir: &str,
    ) -> Result<(), DatabaseError>;

    /// All records produced by one batch, in insertion order.
    fn records_for_batch(&self, batch_id: &str)
        -> Result<Vec<InferenceRecordRow>, DatabaseError>;
}

/// SQLite-backed [`PersistenceGateway`] over the shared [`Database`] handle.
#[derive(Clone)]
pub struct SqliteGateway {
    db: Database,
}

impl SqliteGateway {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl PersistenceGateway for SqliteGateway {
    fn create_record(
        &self,
        record: NewInferenceRecord,
    ) -> Result<InferenceRecordRow, DatabaseError> {
        record_repo::insert(&self.db, &record)
    }

    fn last_issued_id(&self, tenant_id: &str) -> Result<Option<String>, DatabaseError> {
        record_repo::last_issued_id(&self.db, tenant_id)
    }

    fn insert_seed_record(
        &self,
        unique_id: &str,
        vin_no: &str,
        tenant_id: &str,
    ) -> Result<i64, DatabaseError> {
        record_repo::insert_seed(&self.db, unique_id, vin_no, tenant_id)
    }

    fn create_batch(
        &self,
        batch_id: &str,
        tenant_id: &str,
        working_dir: &str,
    ) -> Result<(), DatabaseError> {
        record_repo::create_batch(&self.db, batch_id, tenant_id, working_dir)
    }

    fn records_for_batch(
        &self,
        batch_id: &str,
    ) -> Result<Vec<InferenceRecordRow>, DatabaseError> {
        record_repo::records_for_batch(&self.db, batch_id)
    }
}
