//! A guard that records what its hooks saw.
//!
//! Handy as a test double and as the subject of the CLI's `run` command.

use contextguard_core::{ContextDecorator, ExcInfo, ExcRecord};
use parking_lot::Mutex;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

/// What the exit hook observed on the most recent use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Exit {
    /// `after` has not run yet.
    #[default]
    Pending,
    /// `after` ran with the all-absent triple.
    Clean,
    /// `after` ran with a raised error.
    Raised(ExcRecord),
}

impl Exit {
    pub fn record(&self) -> Option<&ExcRecord> {
        match self {
            Exit::Raised(record) => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub started: bool,
    pub exit: Exit,
    pub catch: bool,
    /// Number of times `before` ran.
    pub entries: u32,
}

/// Cloneable handle; clones share state.
///
/// `before` marks the recorder started and yields a clone of the handle,
/// so a scoped block gets the recorder itself as its bound value. `after`
/// keeps a snapshot of the triple and answers with the `catch` flag.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    state: Arc<Mutex<Snapshot>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose `after` suppresses errors.
    pub fn catching() -> Self {
        let recorder = Self::new();
        recorder.set_catch(true);
        recorder
    }

    pub fn set_catch(&self, catch: bool) {
        self.state.lock().catch = catch;
    }

    pub fn started(&self) -> bool {
        self.state.lock().started
    }

    /// What `after` saw on the most recent use.
    pub fn exc(&self) -> Exit {
        self.state.lock().exit.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().clone()
    }

    /// `true` if both handles share the same state.
    pub fn ptr_eq(&self, other: &Recorder) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Forgets everything observed; keeps `catch`.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let catch = state.catch;
        *state = Snapshot {
            catch,
            ..Snapshot::default()
        };
    }
}

impl ContextDecorator for Recorder {
    type Bound = Recorder;
    type Error = Infallible;

    fn before(&self) -> Result<Option<Recorder>, Infallible> {
        let mut state = self.state.lock();
        state.started = true;
        state.entries += 1;
        Ok(Some(self.clone()))
    }

    fn after(&self, exc: ExcInfo<'_>) -> Result<bool, Infallible> {
        let mut state = self.state.lock();
        state.exit = match exc.to_record() {
            Some(record) => Exit::Raised(record),
            None => Exit::Clean,
        };
        Ok(state.catch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextguard_core::{ContextDecoratorExt, Outcome};

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct NameError(&'static str);

    #[test]
    fn fresh_recorder_is_pending() {
        let recorder = Recorder::new();
        assert!(!recorder.started());
        assert_eq!(recorder.exc(), Exit::Pending);
    }

    #[test]
    fn bound_value_is_the_recorder() {
        let recorder = Recorder::new();
        let outcome = recorder.scope(|bound| {
            assert!(bound.unwrap().ptr_eq(&recorder));
            Ok::<_, NameError>(())
        });
        assert_eq!(outcome.unwrap(), Outcome::Returned(()));
        assert_eq!(recorder.exc(), Exit::Clean);
    }

    #[test]
    fn catching_recorder_keeps_the_triple() {
        let recorder = Recorder::catching();
        let outcome = recorder.scope(|_| Err::<(), _>(NameError("foo")));
        assert!(outcome.unwrap().is_suppressed());

        let record = recorder.exc().record().cloned().unwrap();
        assert_eq!(record.short_kind(), "NameError");
        assert_eq!(record.message, "foo");
    }

    #[test]
    fn reset_keeps_catch() {
        let recorder = Recorder::catching();
        let _ = recorder.scope(|_| Ok::<_, NameError>(()));
        assert_eq!(recorder.snapshot().entries, 1);

        recorder.reset();
        let snapshot = recorder.snapshot();
        assert_eq!(
            snapshot,
            Snapshot {
                catch: true,
                ..Snapshot::default()
            }
        );
    }

    #[test]
    fn snapshot_serializes_with_status_tag() {
        let recorder = Recorder::new();
        let _ = recorder.scope(|_| Err::<(), _>(NameError("foo")));

        let json = serde_json::to_value(recorder.snapshot()).unwrap();
        assert_eq!(json["started"], true);
        assert_eq!(json["exit"]["status"], "raised");
        assert_eq!(json["exit"]["message"], "foo");
    }

    #[test]
    fn exit_method_runs_the_exit_hook() {
        let recorder = Recorder::catching();
        assert_eq!(recorder.enter().unwrap().map(|r| r.ptr_eq(&recorder)), Some(true));

        assert!(recorder.exit(ExcInfo::NONE).unwrap());
        assert_eq!(recorder.exc(), Exit::Clean);

        let err = NameError("late");
        assert!(recorder.exit(ExcInfo::raised(&err)).unwrap());
        assert_eq!(recorder.exc().record().unwrap().message, "late");
    }
}
