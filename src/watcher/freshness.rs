//! Freshness evaluation for feedwatch.
//!
//! Decides which fetched items count as new relative to a source's stored
//! checkpoint.

use chrono::{DateTime, Utc};

use crate::fetcher::FetchedItem;

/// Result of evaluating fetched items against a checkpoint.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Items published strictly after the checkpoint, in input order.
    pub fresh: Vec<FetchedItem>,
    /// Items without a publication time. They cannot be evaluated and are
    /// neither notified nor allowed to hold the checkpoint back.
    pub undated: Vec<FetchedItem>,
    /// The checkpoint to persist once notification attempts finish.
    pub next_checkpoint: DateTime<Utc>,
}

/// Partition `items` by the freshness rule.
///
/// An item is fresh iff its publication time is strictly after `checkpoint`;
/// an item published exactly at the checkpoint has already been evaluated.
/// `now` is captured by the caller when evaluation of a source begins and
/// becomes the next checkpoint. The caller persists it after the
/// notification attempts whether or not they succeeded, which makes delivery
/// at-most-once per item: an item the checkpoint has passed is never retried.
pub fn evaluate(
    checkpoint: DateTime<Utc>,
    now: DateTime<Utc>,
    items: Vec<FetchedItem>,
) -> Evaluation {
    let mut fresh = Vec::new();
    let mut undated = Vec::new();

    for item in items {
        match item.published_at {
            Some(published_at) if published_at > checkpoint => fresh.push(item),
            Some(_) => {}
            None => undated.push(item),
        }
    }

    Evaluation {
        fresh,
        undated,
        next_checkpoint: now,
    }
}
