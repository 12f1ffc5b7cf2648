//! The scoped "recording region" guaranteeing timing and terminal status
//! updates on every exit path — success, error, or cancellation (§4.C,
//! §9 Design Notes).

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::util::now_utc;

use super::Status;

/// A scoped resource bracketing one node's execution. On construction it
/// sets `status = running` and records `start_ts`. Dropping it without an
/// explicit [`RecordGuard::mark_success`] call finalizes the snapshot as
/// `error` — this is what gives cancellation and panics the same outcome
/// as an explicit error return, without relying on catching anything.
pub struct RecordGuard<'a> {
    status: &'a mut Status,
    start_ts: &'a mut Option<DateTime<Utc>>,
    duration: &'a mut Option<f64>,
    started_at: Instant,
    finished: bool,
}

impl<'a> RecordGuard<'a> {
    /// Enters the recording region: sets `status = running` and captures
    /// `start_ts`, then starts a monotonic timer.
    pub(crate) fn enter(status: &'a mut Status, start_ts: &'a mut Option<DateTime<Utc>>, duration: &'a mut Option<f64>) -> Self {
        *status = Status::Running;
        *start_ts = Some(now_utc());
        Self {
            status,
            start_ts,
            duration,
            started_at: Instant::now(),
            finished: false,
        }
    }

    /// Marks the region as having completed successfully. Must be called
    /// before the guard drops for the snapshot to end in `success` rather
    /// than the `error` default.
    pub fn mark_success(mut self) {
        self.finish(Status::Success);
    }

    fn finish(&mut self, status: Status) {
        if self.finished {
            return;
        }
        *self.duration = Some(self.started_at.elapsed().as_secs_f64());
        *self.status = status;
        self.finished = true;
    }
}

impl<'a> Drop for RecordGuard<'a> {
    fn drop(&mut self) {
        // Reached only if `mark_success` was never called: an error
        // return, a panic unwinding through this scope, or the awaiting
        // task being cancelled. All three get the same `error` outcome.
        self.finish(Status::Error);
    }
}
