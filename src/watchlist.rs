//! Watchlist loading for feedwatch.
//!
//! The watchlist is an operator-maintained text file with one feed URL per
//! line. It is re-read at the start of every run, so edits take effect
//! without a restart.

use std::collections::HashSet;
use std::path::Path;

use crate::{FeedwatchError, Result};

/// Load the desired feed URLs from a newline-delimited file.
///
/// Lines are trimmed and blank lines are skipped. Duplicates are returned
/// as written; callers collapse them with [`dedup_urls`].
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(FeedwatchError::Io)?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Collapse duplicate URLs, keeping the first occurrence of each in order.
pub fn dedup_urls(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|url| seen.insert(url.clone())).collect()
}
