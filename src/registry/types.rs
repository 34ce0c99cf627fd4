//! Registry types for feedwatch.

use chrono::{DateTime, Utc};

/// A tracked feed source.
#[derive(Debug, Clone)]
pub struct FeedSource {
    /// Source ID.
    pub id: i64,
    /// Feed URL, the identity key.
    pub url: String,
    /// When the source was first registered.
    pub created_at: DateTime<Utc>,
    /// Most recent reconciliation run that listed this URL as desired.
    pub last_seen_at: DateTime<Utc>,
    /// When the source was dropped from the desired set. None while active.
    pub deactivated_at: Option<DateTime<Utc>>,
    /// Freshness checkpoint: items published at or before this instant have
    /// already been evaluated.
    pub last_checked_at: DateTime<Utc>,
}

impl FeedSource {
    /// Check whether the source is currently active.
    pub fn is_active(&self) -> bool {
        self.deactivated_at.is_none()
    }
}

/// Diff produced by a reconciliation run.
///
/// Each set holds the state of the affected rows as of the end of the
/// transaction. `reactivated` sources were known but dormant and came back;
/// their checkpoint is untouched, so their backlog is picked up on the next
/// check.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// Sources registered for the first time.
    pub added: Vec<FeedSource>,
    /// Previously deactivated sources that reappeared in the desired set.
    pub reactivated: Vec<FeedSource>,
    /// Sources dropped from the desired set.
    pub deactivated: Vec<FeedSource>,
}

impl ReconcileOutcome {
    /// Check whether the reconciliation changed nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.reactivated.is_empty() && self.deactivated.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_source(deactivated: bool) -> FeedSource {
        let now = Utc::now();
        FeedSource {
            id: 1,
            url: "https://example.com/feed.xml".to_string(),
            created_at: now,
            last_seen_at: now,
            deactivated_at: if deactivated { Some(now) } else { None },
            last_checked_at: now,
        }
    }

    #[test]
    fn test_is_active() {
        assert!(sample_source(false).is_active());
        assert!(!sample_source(true).is_active());
    }

    #[test]
    fn test_outcome_is_empty() {
        let outcome = ReconcileOutcome::default();
        assert!(outcome.is_empty());

        let outcome = ReconcileOutcome {
            added: vec![sample_source(false)],
            ..Default::default()
        };
        assert!(!outcome.is_empty());
    }
}
