//! `itvtrack` - Vehicle inspection (ITV) tracker
//!
//! This library keeps a collection of vehicle inspection records, derives the
//! next ITV due date for each one, and persists the collection either as a
//! single local blob or as per-user remote documents.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod inspections;
pub mod links;
pub mod logging;
pub mod record;
pub mod storage;
pub mod sync;
pub mod tracker;

pub use config::Config;
pub use error::{Error, Result};
pub use inspections::Inspections;
pub use links::{CalendarLinks, ImageLinks};
pub use logging::init_logging;
pub use record::{InspectionForm, InspectionRecord, RecordId};
pub use storage::{KeyValueStore, LocalStore, MemoryStore, SqliteStore, StorageStats};
pub use tracker::{LocalTracker, RemoteTracker};
