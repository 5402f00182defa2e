//! Per-document viewing session tracking
//!
//! The tracker is driven entirely from outside: the owning front end feeds it
//! one-second heartbeats and page changes, and injects timestamps, so the
//! whole lifecycle is deterministic under test.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of a single open-to-close viewing interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewingSession {
    pub session_id: String,
    pub document_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// How many times each page was shown, keyed by 1-based page number.
    pub page_views: BTreeMap<u32, u32>,
    pub total_view_seconds: u64,
    /// Host-supplied client metadata; the tracker never inspects the
    /// environment itself.
    pub user_agent: Option<String>,
    pub client_addr: Option<String>,
}

/// Accumulates view time and per-page counts while a document is open.
///
/// Created disabled when the policy turns tracking off, in which case every
/// operation is a no-op and finalize yields nothing.
#[derive(Debug)]
pub struct SessionTracker {
    session: ViewingSession,
    enabled: bool,
    finalized: bool,
}

impl SessionTracker {
    pub fn start(document_id: &str, enabled: bool, now: DateTime<Utc>) -> Self {
        Self {
            session: ViewingSession {
                session_id: Uuid::new_v4().to_string(),
                document_id: document_id.to_string(),
                started_at: now,
                ended_at: None,
                page_views: BTreeMap::new(),
                total_view_seconds: 0,
                user_agent: None,
                client_addr: None,
            },
            enabled,
            finalized: false,
        }
    }

    pub fn set_client_metadata(&mut self, user_agent: Option<String>, client_addr: Option<String>) {
        self.session.user_agent = user_agent;
        self.session.client_addr = client_addr;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// One-second heartbeat from the owning timer.
    pub fn tick(&mut self) {
        if self.enabled && !self.finalized {
            self.session.total_view_seconds += 1;
        }
    }

    pub fn record_page_view(&mut self, page: u32) {
        if self.enabled && !self.finalized {
            *self.session.page_views.entry(page).or_insert(0) += 1;
        }
    }

    /// Stamp the end time and hand out the finished record. Only the first
    /// call returns the session; repeat calls mutate nothing, so the record
    /// can never be emitted or counted twice.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> Option<ViewingSession> {
        if !self.enabled || self.finalized {
            return None;
        }
        self.finalized = true;
        self.session.ended_at = Some(now);
        Some(self.session.clone())
    }

    pub fn snapshot(&self) -> &ViewingSession {
        &self.session
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Tick,
        PageView(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Tick), (1u32..50).prop_map(Op::PageView)]
    }

    proptest! {
        /// Property: total seconds equal the tick count and every page view
        /// is accounted for exactly once, for any interleaving
        #[test]
        fn counts_match_operations(ops in proptest::collection::vec(op(), 0..200)) {
            let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
            let mut tracker = SessionTracker::start("doc", true, start);

            let mut expected_ticks = 0u64;
            let mut expected_views = 0u32;
            for op in &ops {
                match op {
                    Op::Tick => { tracker.tick(); expected_ticks += 1; }
                    Op::PageView(p) => { tracker.record_page_view(*p); expected_views += 1; }
                }
            }

            let session = tracker.finalize(start).unwrap();
            prop_assert_eq!(session.total_view_seconds, expected_ticks);
            prop_assert_eq!(session.page_views.values().sum::<u32>(), expected_views);

            // Finalize is idempotent-safe: nothing counts twice
            prop_assert!(tracker.finalize(start).is_none());
            prop_assert_eq!(tracker.snapshot().total_view_seconds, expected_ticks);
        }
    }
}
