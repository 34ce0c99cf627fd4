//! feedwatch - Feed Registry Watcher
//!
//! A long-running watcher that keeps a persisted registry of syndication
//! feeds in sync with an operator-maintained watchlist, checks each active
//! feed for newly published items, and sends one notification per new item.

pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod notifier;
pub mod registry;
pub mod watcher;
pub mod watchlist;

pub use config::Config;
pub use db::{Database, DbPool};
pub use error::{FeedwatchError, Result};
pub use fetcher::{FeedFetcher, FetchedItem, HttpFeedFetcher};
pub use notifier::{DiscordNotifier, Notifier};
pub use registry::{FeedSource, FeedSourceRepository, ReconcileOutcome};
pub use watcher::Watcher;
