pub mod job;
pub mod precedent;
pub mod report;
pub mod schema;

pub use job::{JobRecord, JobStatus, JobUpdate};
pub use precedent::{CaseFilters, PrecedentMatch};
pub use report::{
    ComplianceCheck, FinancialImpact, PredictedOutcome, Report, ReportValidationError,
};
