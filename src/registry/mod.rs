//! Feed source registry module for feedwatch.
//!
//! This module tracks which feed sources are desired, active and dormant,
//! and reconciles the persisted set against the watchlist.

pub mod repository;
pub mod types;

pub use repository::FeedSourceRepository;
pub use types::{FeedSource, ReconcileOutcome};
