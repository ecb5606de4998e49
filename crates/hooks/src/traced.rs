//! Lifecycle logging around any guard.

use contextguard_core::{ContextDecorator, ExcInfo};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::time::{Duration, Instant};

/// Wraps a guard and logs each entry and exit through `tracing`.
///
/// Both hooks delegate to the inner guard; the suppress decision and any
/// hook error are the inner guard's.
///
/// One entry time is kept per `Traced`. Entering it again before the
/// matching exit overwrites that time, so nested or reentrant use of the
/// same instance reports the elapsed time of the innermost use only.
#[derive(Debug)]
pub struct Traced<G> {
    inner: G,
    label: Cow<'static, str>,
    entered_at: Mutex<Option<Instant>>,
    last_elapsed: Mutex<Option<Duration>>,
}

impl<G: ContextDecorator> Traced<G> {
    pub fn new(label: impl Into<Cow<'static, str>>, inner: G) -> Self {
        Self {
            inner,
            label: label.into(),
            entered_at: Mutex::new(None),
            last_elapsed: Mutex::new(None),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn into_inner(self) -> G {
        self.inner
    }

    /// Time between the most recent entry and exit.
    pub fn last_elapsed(&self) -> Option<Duration> {
        *self.last_elapsed.lock()
    }
}

impl<G: ContextDecorator> ContextDecorator for Traced<G> {
    type Bound = G::Bound;
    type Error = G::Error;

    fn before(&self) -> Result<Option<G::Bound>, G::Error> {
        tracing::info!(label = %self.label, "entering");
        let bound = self.inner.before();
        *self.entered_at.lock() = match bound {
            Ok(_) => Some(Instant::now()),
            Err(_) => {
                tracing::warn!(label = %self.label, "entry hook failed");
                None
            }
        };
        bound
    }

    fn after(&self, exc: ExcInfo<'_>) -> Result<bool, G::Error> {
        let elapsed = self.entered_at.lock().take().map(|t| t.elapsed());
        *self.last_elapsed.lock() = elapsed;

        let elapsed_us = elapsed.map_or(0, micros);
        let suppress = match self.inner.after(exc) {
            Ok(suppress) => suppress,
            Err(err) => {
                tracing::warn!(label = %self.label, elapsed_us, "exit hook failed");
                return Err(err);
            }
        };

        match exc.value() {
            Some(err) => tracing::info!(
                label = %self.label,
                elapsed_us,
                error = %err,
                suppress,
                "exiting with error"
            ),
            None => tracing::info!(label = %self.label, elapsed_us, "exiting"),
        }

        Ok(suppress)
    }
}

/// Whole microseconds, saturating at `u64::MAX`.
fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
