use crate::cache::AppliedSet;
use crate::endpoint::{Outcome, UpdateEndpoint};
use crate::error::Result;
use crate::faillog::FailureLog;
use crate::signal::CancelSignal;
use crate::unit::{scan_units, UpdateUnit};
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// Run outcome types
// ---------------------------------------------------------------------------

/// Terminal state of one unit within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    /// Already in the applied-set; the endpoint was not contacted.
    Skipped,
    /// Applied by the endpoint and durably recorded in the applied-set.
    Applied,
    /// Refused by the endpoint; quarantined in the failure log.
    Rejected,
    /// Transport failure; left pending for the next run.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// The cancellation signal was seen before every unit was dispatched.
    Stopped,
}

/// Per-run tally, reported to the operator on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub applied: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub deferred: usize,
}

impl RunReport {
    fn new() -> Self {
        Self {
            status: RunStatus::Completed,
            applied: 0,
            skipped: 0,
            rejected: 0,
            deferred: 0,
        }
    }
}

/// Optional per-unit progress observer. Purely observational; has no
/// bearing on correctness.
pub trait Progress {
    fn on_unit(&mut self, name: &str, done: usize, total: usize);
}

// ---------------------------------------------------------------------------
// IngestController
// ---------------------------------------------------------------------------

/// Orchestrates the resumable batch loop.
///
/// Units are dispatched strictly one at a time, in lexical name order.
/// The cancellation signal is polled once per unit, at the loop boundary
/// only — an in-flight endpoint call is never aborted. Per-unit failures
/// are contained within their iteration; only a failure of the
/// applied-set store itself aborts the run, because without the store the
/// at-most-once guarantee is gone.
pub struct IngestController<'a> {
    cache: &'a mut dyn AppliedSet,
    endpoint: &'a dyn UpdateEndpoint,
    signal: &'a dyn CancelSignal,
    faillog: &'a FailureLog,
}

impl<'a> IngestController<'a> {
    pub fn new(
        cache: &'a mut dyn AppliedSet,
        endpoint: &'a dyn UpdateEndpoint,
        signal: &'a dyn CancelSignal,
        faillog: &'a FailureLog,
    ) -> Self {
        Self {
            cache,
            endpoint,
            signal,
            faillog,
        }
    }

    /// Run the batch over `units_dir`.
    ///
    /// Returns `Err` only when the units directory cannot be enumerated or
    /// the applied-set store fails mid-run. An empty directory completes
    /// immediately with zero dispatches.
    pub fn run(
        &mut self,
        units_dir: &Path,
        mut progress: Option<&mut dyn Progress>,
    ) -> Result<RunReport> {
        let units = scan_units(units_dir)?;
        let total = units.len();
        let mut report = RunReport::new();

        tracing::info!(total, dir = %units_dir.display(), "starting ingest run");

        for (i, unit) in units.iter().enumerate() {
            if self.signal.signalled() {
                tracing::info!(
                    completed = i,
                    remaining = total - i,
                    "cancellation signal present, stopping run"
                );
                report.status = RunStatus::Stopped;
                report.deferred += total - i;
                return Ok(report);
            }

            match self.process_unit(unit)? {
                UnitStatus::Skipped => report.skipped += 1,
                UnitStatus::Applied => report.applied += 1,
                UnitStatus::Rejected => report.rejected += 1,
                UnitStatus::Deferred => report.deferred += 1,
            }

            if let Some(p) = progress.as_mut() {
                p.on_unit(&unit.name, i + 1, total);
            }
        }

        tracing::info!(
            applied = report.applied,
            skipped = report.skipped,
            rejected = report.rejected,
            deferred = report.deferred,
            "ingest run complete"
        );
        Ok(report)
    }

    fn process_unit(&mut self, unit: &UpdateUnit) -> Result<UnitStatus> {
        if self.cache.contains(&unit.name) {
            tracing::debug!(unit = %unit.name, "already applied, skipping");
            return Ok(UnitStatus::Skipped);
        }

        let payload = match unit.payload() {
            Ok(p) => p,
            Err(e) => {
                // An unreadable payload will not succeed on a resume
                // either, so it is quarantined like a rejection.
                tracing::warn!(unit = %unit.name, error = %e, "unreadable payload, quarantining");
                self.faillog.append(&unit.name)?;
                return Ok(UnitStatus::Rejected);
            }
        };

        match self.endpoint.apply(&payload) {
            Outcome::Applied => {
                // Persist before counting the unit applied. If this fails
                // the run aborts: continuing would risk re-applying the
                // unit on the next resume.
                self.cache.add(&unit.name)?;
                tracing::debug!(unit = %unit.name, "applied");
                Ok(UnitStatus::Applied)
            }
            Outcome::Rejected(detail) => {
                tracing::warn!(unit = %unit.name, %detail, "rejected by endpoint");
                self.faillog.append(&unit.name)?;
                Ok(UnitStatus::Rejected)
            }
            Outcome::Unreachable(detail) => {
                tracing::warn!(unit = %unit.name, %detail, "endpoint unreachable, deferring to next run");
                Ok(UnitStatus::Deferred)
            }
        }
    }
}
