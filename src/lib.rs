//! # Meetprep
//!
//! Meeting intelligence reports built from calendar event descriptions.
//!
//! ## Features
//!
//! - **Entity Extraction**: Reads the "Person Name - Company" convention from an event description
//! - **Parallel Research**: Person and company research run concurrently, each degrading to a fallback on failure
//! - **Synthesis**: A meeting summary and preparation tips from one LLM call
//! - **Report Cache**: sled-backed storage, one report per event, generated at most once

pub mod agent;
pub mod chat;
pub mod coalesce;
pub mod config;
pub mod extract;
pub mod report;
pub mod research;
pub mod search;
pub mod service;
pub mod storage;
pub mod synthesis;

pub use config::Config;
pub use extract::extract_entities;
pub use report::{EventDetails, ExtractedEntities, Report};
pub use service::{ReportError, ReportService};
pub use storage::ReportStore;
