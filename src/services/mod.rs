pub mod backfill_service;
pub mod grading_service;
pub mod result_service;
pub mod submission_service;
