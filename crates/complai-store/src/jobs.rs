//! Job record persistence.
//!
//! The pipeline consumes the store through [`JobStore`]: create a `PENDING`
//! record at submission, apply partial updates at each checkpoint, read back
//! for polling and explanation generation. Each update call is independent —
//! atomicity per update is the store's responsibility, transactions across
//! updates are nobody's.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use complai_core::{JobRecord, JobUpdate};

use crate::StoreError;

/// Durable key-value store for job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a fresh `PENDING` record. Fails on duplicate ids.
    async fn create(&self, job_id: &str) -> Result<JobRecord, StoreError>;

    /// Apply a partial update; set fields overwrite, unset fields are kept.
    async fn update(&self, job_id: &str, update: JobUpdate) -> Result<(), StoreError>;

    /// Fetch a record by id.
    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError>;
}

/// In-memory job store.
///
/// Backs single-process runs and tests; a deployment substitutes its own
/// durable implementation behind the same trait.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job_id: &str) -> Result<JobRecord, StoreError> {
        let mut jobs = self
            .jobs
            .write()
            .map_err(|_| StoreError::Other("job store lock poisoned".to_string()))?;
        if jobs.contains_key(job_id) {
            return Err(StoreError::DuplicateJob(job_id.to_string()));
        }
        let record = JobRecord::new(job_id);
        jobs.insert(job_id.to_string(), record.clone());
        Ok(record)
    }

    async fn update(&self, job_id: &str, update: JobUpdate) -> Result<(), StoreError> {
        let mut jobs = self
            .jobs
            .write()
            .map_err(|_| StoreError::Other("job store lock poisoned".to_string()))?;
        let record = jobs
            .get_mut(job_id)
            .ok_or_else(|| StoreError::JobNotFound(job_id.to_string()))?;
        update.apply(record);
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        let jobs = self
            .jobs
            .read()
            .map_err(|_| StoreError::Other("job store lock poisoned".to_string()))?;
        Ok(jobs.get(job_id).cloned())
    }
}
