pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::services::backfill_service::{BackfillOptions, BackfillService, BackfillSummary};
