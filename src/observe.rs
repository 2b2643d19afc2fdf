/*!
 * Diagnostics and observability
 *
 * Tolerated data problems are reported as [`Diagnostic`] values to an
 * injected [`Observer`] so aggregation code stays free of direct I/O.
 */

use std::sync::Mutex;

use serde::Serialize;

use crate::data_types::{FacilityId, QuarterTag, Scope};

/// A tolerated condition encountered while ingesting or summarizing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Two raw identifiers canonicalized to the same key; the first row was kept
    DuplicateFacilityId {
        dataset: &'static str,
        facility_id: FacilityId,
        raw_kept: String,
        raw_dropped: String,
        quarter: Option<QuarterTag>,
    },
    /// A facility row failed the dominance check
    MisalignedRecord {
        facility_id: FacilityId,
        quarter: QuarterTag,
        repaired: bool,
    },
    /// A row could not be converted at all
    RejectedRow {
        dataset: &'static str,
        reason: String,
    },
    /// Facilities present on only one side of the join
    IncompleteJoin {
        scope: Scope,
        metrics_only: usize,
        profile_only: usize,
    },
    MissingPriorQuarter {
        scope: Scope,
        quarter: QuarterTag,
    },
    MissingOptionalDataset {
        dataset: &'static str,
    },
}

/// Receiver of diagnostics
pub trait Observer: Send + Sync {
    fn record(&self, diagnostic: &Diagnostic);
}

/// Emits diagnostics as `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn record(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::DuplicateFacilityId { dataset, facility_id, raw_kept, raw_dropped, quarter } => {
                tracing::warn!(
                    dataset = *dataset,
                    facility_id = %facility_id,
                    raw_kept = %raw_kept,
                    raw_dropped = %raw_dropped,
                    quarter = ?quarter,
                    "duplicate facility identifier, keeping first row"
                );
            }
            Diagnostic::MisalignedRecord { facility_id, quarter, repaired } => {
                tracing::warn!(
                    facility_id = %facility_id,
                    quarter = %quarter,
                    repaired = *repaired,
                    "facility staffing columns misaligned"
                );
            }
            Diagnostic::RejectedRow { dataset, reason } => {
                tracing::warn!(dataset = *dataset, reason = %reason, "row rejected");
            }
            Diagnostic::IncompleteJoin { scope, metrics_only, profile_only } => {
                tracing::debug!(
                    scope = %scope,
                    metrics_only = *metrics_only,
                    profile_only = *profile_only,
                    "facilities missing from one side of the join"
                );
            }
            Diagnostic::MissingPriorQuarter { scope, quarter } => {
                tracing::info!(scope = %scope, quarter = %quarter, "no prior-quarter row");
            }
            Diagnostic::MissingOptionalDataset { dataset } => {
                tracing::debug!(dataset = *dataset, "optional dataset not supplied");
            }
        }
    }
}

/// Keeps diagnostics in memory
#[derive(Debug, Default)]
pub struct CollectingObserver {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Observer for CollectingObserver {
    fn record(&self, diagnostic: &Diagnostic) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(diagnostic.clone());
        }
    }
}

/// Drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn record(&self, _diagnostic: &Diagnostic) {}
}
