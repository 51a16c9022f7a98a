//! Job lifecycle types for asynchronous complaint analysis.
//!
//! A job is created `PENDING` at submission, moves to `PROCESSING` when the
//! pipeline picks it up, and ends in exactly one of `COMPLETE` (report
//! attached) or `ERROR` (message attached). Terminal jobs are never
//! re-processed.

use serde::{Deserialize, Serialize};

use crate::report::Report;

/// Externally visible lifecycle state of an analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "PROCESSING")]
    Processing,
    #[serde(rename = "COMPLETE")]
    Complete,
    #[serde(rename = "ERROR")]
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Complete => "COMPLETE",
            Self::Error => "ERROR",
        }
    }

    /// Terminal states are never left once entered.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted record for a single analysis job.
///
/// `complaint_text`/`frl_text` are populated once extraction succeeds so that
/// explanation generation keeps working even when a later stage fails.
/// `report` is present only when `status` is `Complete`; `error_message` only
/// when `status` is `Error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complaint_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frl_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobRecord {
    /// Fresh `PENDING` record, as created by the submission path.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            complaint_text: None,
            frl_text: None,
            report: None,
            error_message: None,
        }
    }
}

/// Partial field update for a job record.
///
/// Each set field overwrites the stored value (last-write-wins); unset fields
/// are left untouched. Checkpoint writes in the pipeline are independent
/// updates — no transaction spans them.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub complaint_text: Option<String>,
    pub frl_text: Option<String>,
    pub report: Option<Report>,
    pub error_message: Option<String>,
}

impl JobUpdate {
    /// Status-only transition.
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// The post-extraction durability checkpoint.
    pub fn texts(complaint_text: impl Into<String>, frl_text: impl Into<String>) -> Self {
        Self {
            complaint_text: Some(complaint_text.into()),
            frl_text: Some(frl_text.into()),
            ..Default::default()
        }
    }

    /// Terminal success: `COMPLETE` and the report in a single update.
    pub fn complete(report: Report) -> Self {
        Self {
            status: Some(JobStatus::Complete),
            report: Some(report),
            ..Default::default()
        }
    }

    /// Terminal failure: `ERROR` and the captured message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Error),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Apply this update to a record, field by field.
    pub fn apply(self, record: &mut JobRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(text) = self.complaint_text {
            record.complaint_text = Some(text);
        }
        if let Some(text) = self.frl_text {
            record.frl_text = Some(text);
        }
        if let Some(report) = self.report {
            record.report = Some(report);
        }
        if let Some(message) = self.error_message {
            record.error_message = Some(message);
        }
    }
}
