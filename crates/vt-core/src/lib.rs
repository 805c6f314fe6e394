//! Core domain logic for the visit tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Visit records: the start/flush/finalize lifecycle with active-time accounting
//! - Sessions: per-tab and per-day aggregates with derived statistics
//! - Classification: hostname extraction and work/social categorization

pub mod category;
pub mod domain;
pub mod export;
pub mod session;
pub mod types;
pub mod visit;

pub use category::{Category, CategoryLists};
pub use domain::DomainName;
pub use export::{VisitRow, rows_to_csv, visit_rows};
pub use session::{BrowsingSession, SessionStats, TabSession, parse_storage_key, storage_key};
pub use types::{TabId, VisitId, WindowId};
pub use visit::{CreationMode, NewVisit, SourceInfo, Visit};
