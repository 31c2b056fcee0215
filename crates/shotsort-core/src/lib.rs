//! # shotsort-core
//!
//! Renames loose screenshots in a watched directory to
//! `Screenshot_<YYYYMMDD>_<n>.png` and files them under `YYYY-MM` folders.
//!
//! - [`Organizer`]: processes single files and sweeps the root
//! - [`CounterStore`]: per-day sequence ids persisted as JSON
//! - [`CanonicalName`]: the canonical file name format
//! - [`Config`]: watched root and counter file location
//! - Error type ([`ShotsortError`])

pub mod config;
pub mod counter;
pub mod error;
pub mod naming;
pub mod organizer;

pub use config::Config;
pub use counter::CounterStore;
pub use error::{Result, ShotsortError};
pub use naming::CanonicalName;
pub use organizer::{
    CreationTime, FsCreationTime, Move, Organizer, Outcome, SkipReason, SweepReport,
};
