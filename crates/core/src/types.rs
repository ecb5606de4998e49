//! Shared types for the dual-mode guard.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

use crate::error::ContextError;

// ---------------------------------------------------------------------------
// Raised errors
// ---------------------------------------------------------------------------

/// Marker for error types that implement [`Error`] themselves.
pub enum Typed {}

/// Marker for boxed trait-object errors.
pub enum Boxed {}

/// Anything a guarded block or call may fail with.
///
/// Covers every concrete `E: Error + 'static` as well as
/// `Box<dyn Error>` and its `Send`/`Sync` variants, which do not implement
/// [`Error`]. The marker `M` keeps the two families of impls apart; it is
/// always inferred.
pub trait AsDynError<M> {
    fn as_dyn_error(&self) -> &(dyn Error + 'static);

    /// Name reported as the triple's kind.
    fn kind() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }
}

impl<E: Error + 'static> AsDynError<Typed> for E {
    fn as_dyn_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

impl AsDynError<Boxed> for Box<dyn Error + 'static> {
    fn as_dyn_error(&self) -> &(dyn Error + 'static) {
        &**self
    }

    fn kind() -> &'static str {
        "Box<dyn Error>"
    }
}

impl AsDynError<Boxed> for Box<dyn Error + Send + 'static> {
    fn as_dyn_error(&self) -> &(dyn Error + 'static) {
        &**self
    }

    fn kind() -> &'static str {
        "Box<dyn Error + Send>"
    }
}

impl AsDynError<Boxed> for Box<dyn Error + Send + Sync + 'static> {
    fn as_dyn_error(&self) -> &(dyn Error + 'static) {
        &**self
    }

    fn kind() -> &'static str {
        "Box<dyn Error + Send + Sync>"
    }
}

// ---------------------------------------------------------------------------
// Exception triple
// ---------------------------------------------------------------------------

/// The kind/value/context triple handed to an exit hook.
///
/// Either all three parts are present (the governed block or call failed)
/// or all three are absent ([`ExcInfo::NONE`]). The value is the caller's
/// own error, borrowed; its `source()` chain plays the role of the context.
#[derive(Clone, Copy)]
pub struct ExcInfo<'a> {
    raised: Option<Raised<'a>>,
}

#[derive(Clone, Copy)]
struct Raised<'a> {
    kind: &'static str,
    value: &'a (dyn Error + 'static),
}

impl<'a> ExcInfo<'a> {
    /// The all-absent triple: nothing was raised.
    pub const NONE: ExcInfo<'static> = ExcInfo { raised: None };

    /// Captures a present triple for `err`.
    pub fn raised<E, M>(err: &'a E) -> Self
    where
        E: AsDynError<M>,
    {
        Self {
            raised: Some(Raised {
                kind: E::kind(),
                value: err.as_dyn_error(),
            }),
        }
    }

    pub fn is_none(&self) -> bool {
        self.raised.is_none()
    }

    pub fn is_some(&self) -> bool {
        self.raised.is_some()
    }

    /// Fully qualified type name of the raised error.
    pub fn kind(&self) -> Option<&'static str> {
        self.raised.map(|r| r.kind)
    }

    pub fn value(&self) -> Option<&'a (dyn Error + 'static)> {
        self.raised.map(|r| r.value)
    }

    /// Walks the cause chain below the raised value, nearest first.
    pub fn sources(&self) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
        std::iter::successors(self.value().and_then(|v| v.source()), |e| (*e).source())
    }

    /// `true` if the raised value is an `E`.
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.downcast_ref::<E>().is_some()
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&'a E> {
        self.value().and_then(|v| v.downcast_ref::<E>())
    }

    /// Owned snapshot, `None` for the all-absent triple.
    pub fn to_record(&self) -> Option<ExcRecord> {
        self.raised.map(|r| ExcRecord {
            kind: r.kind.to_string(),
            message: r.value.to_string(),
            sources: self.sources().map(|e| e.to_string()).collect(),
        })
    }
}

impl Default for ExcInfo<'_> {
    fn default() -> Self {
        ExcInfo::NONE
    }
}

impl fmt::Debug for ExcInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raised {
            None => f.write_str("ExcInfo(None, None, None)"),
            Some(r) => f
                .debug_struct("ExcInfo")
                .field("kind", &r.kind)
                .field("value", &r.value)
                .finish(),
        }
    }
}

impl fmt::Display for ExcInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raised {
            None => f.write_str("no exception"),
            Some(r) => write!(f, "{}: {}", r.kind, r.value),
        }
    }
}

// ---------------------------------------------------------------------------
// Owned snapshot
// ---------------------------------------------------------------------------

/// Owned copy of a present [`ExcInfo`], for hooks that keep it past the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcRecord {
    pub kind: String,
    pub message: String,
    /// Rendered cause chain, nearest first.
    pub sources: Vec<String>,
}

impl ExcRecord {
    /// Short type name: the last path segment of `kind`.
    pub fn short_kind(&self) -> &str {
        self.kind.rsplit("::").next().unwrap_or(&self.kind)
    }
}

impl fmt::Display for ExcRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.short_kind(), self.message)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What a guarded block or decorated call produced when it did not raise.
///
/// `Suppressed` carries no value: the governed code failed, so there is no
/// result, and the exit hook chose to swallow the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[must_use]
pub enum Outcome<T> {
    Returned(T),
    Suppressed,
}

impl<T> Outcome<T> {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Outcome::Suppressed)
    }

    pub fn returned(self) -> Option<T> {
        match self {
            Outcome::Returned(value) => Some(value),
            Outcome::Suppressed => None,
        }
    }

    pub fn as_ref(&self) -> Outcome<&T> {
        match self {
            Outcome::Returned(value) => Outcome::Returned(value),
            Outcome::Suppressed => Outcome::Suppressed,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Returned(value) => Outcome::Returned(f(value)),
            Outcome::Suppressed => Outcome::Suppressed,
        }
    }

    /// Demands the result; a suppressed call has none to give.
    pub fn into_result(self, callable: &str) -> Result<T, ContextError> {
        match self {
            Outcome::Returned(value) => Ok(value),
            Outcome::Suppressed => Err(ContextError::ResultSuppressed {
                callable: callable.to_string(),
            }),
        }
    }
}
