//! The dual-mode guard: optional hooks plus the scope and decorator drivers.
//!
//! An implementor supplies zero, one or both of [`ContextDecorator::before`]
//! and [`ContextDecorator::after`]. Everything else lives on
//! [`ContextDecoratorExt`], which every guard gets for free:
//!
//! ```
//! use contextguard_core::{ContextDecorator, ContextDecoratorExt, Outcome};
//! use std::cell::Cell;
//! use std::convert::Infallible;
//!
//! #[derive(Default)]
//! struct Counting {
//!     entries: Cell<u32>,
//! }
//!
//! impl ContextDecorator for Counting {
//!     type Bound = u32;
//!     type Error = Infallible;
//!
//!     fn before(&self) -> Result<Option<u32>, Infallible> {
//!         self.entries.set(self.entries.get() + 1);
//!         Ok(Some(self.entries.get()))
//!     }
//! }
//!
//! let guard = Counting::default();
//!
//! // Scoped block.
//! let outcome = guard.scope(|bound| Ok::<_, std::fmt::Error>(bound.unwrap_or(0) * 10));
//! assert_eq!(outcome.unwrap(), Outcome::Returned(10));
//!
//! // Decorated callable.
//! let mut double = (&guard).decorate(|x: u32| Ok::<_, std::fmt::Error>(x * 2));
//! assert_eq!(double.call((21,)).unwrap(), Outcome::Returned(42));
//! assert_eq!(guard.entries.get(), 2);
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;

use crate::decorate::Decorated;
use crate::error::{Failure, Panicked};
use crate::types::{AsDynError, ExcInfo, Outcome};

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Entry and exit hooks of a guard. Both are optional.
///
/// Hooks take `&self`: a guard that tracks state across uses keeps it behind
/// its own interior mutability, and stays responsible for resetting it.
/// A hook that cannot fail uses `type Error = Infallible`.
pub trait ContextDecorator {
    /// Value a scoped block receives from [`before`](Self::before).
    type Bound;

    /// Failure of the hooks themselves, e.g. a resource that could not be
    /// acquired on entry.
    type Error;

    /// Runs on entry. In scope mode the returned value is handed to the
    /// block; in decorator mode it is dropped. An error skips the governed
    /// code and `after`.
    fn before(&self) -> Result<Option<Self::Bound>, Self::Error> {
        Ok(None)
    }

    /// Runs on exit with the in-flight error, or [`ExcInfo::NONE`] when the
    /// governed code succeeded. `Ok(true)` swallows the error; an `Err`
    /// replaces it.
    fn after(&self, exc: ExcInfo<'_>) -> Result<bool, Self::Error> {
        let _ = exc;
        Ok(false)
    }
}

impl<G: ContextDecorator + ?Sized> ContextDecorator for &G {
    type Bound = G::Bound;
    type Error = G::Error;

    fn before(&self) -> Result<Option<Self::Bound>, Self::Error> {
        (**self).before()
    }

    fn after(&self, exc: ExcInfo<'_>) -> Result<bool, Self::Error> {
        (**self).after(exc)
    }
}

impl<G: ContextDecorator + ?Sized> ContextDecorator for Box<G> {
    type Bound = G::Bound;
    type Error = G::Error;

    fn before(&self) -> Result<Option<Self::Bound>, Self::Error> {
        (**self).before()
    }

    fn after(&self, exc: ExcInfo<'_>) -> Result<bool, Self::Error> {
        (**self).after(exc)
    }
}

impl<G: ContextDecorator + ?Sized> ContextDecorator for Rc<G> {
    type Bound = G::Bound;
    type Error = G::Error;

    fn before(&self) -> Result<Option<Self::Bound>, Self::Error> {
        (**self).before()
    }

    fn after(&self, exc: ExcInfo<'_>) -> Result<bool, Self::Error> {
        (**self).after(exc)
    }
}

impl<G: ContextDecorator + ?Sized> ContextDecorator for Arc<G> {
    type Bound = G::Bound;
    type Error = G::Error;

    fn before(&self) -> Result<Option<Self::Bound>, Self::Error> {
        (**self).before()
    }

    fn after(&self, exc: ExcInfo<'_>) -> Result<bool, Self::Error> {
        (**self).after(exc)
    }
}

// ---------------------------------------------------------------------------
// Drivers
// ---------------------------------------------------------------------------

/// Scope and decorator entry points, available on every [`ContextDecorator`].
pub trait ContextDecoratorExt: ContextDecorator {
    /// Enter-scope: runs `before` and yields the bound value.
    fn enter(&self) -> Result<Option<Self::Bound>, Self::Error> {
        let bound = self.before();
        tracing::trace!(
            ok = bound.is_ok(),
            bound = matches!(bound, Ok(Some(_))),
            "guard entered"
        );
        bound
    }

    /// Exit-scope: runs `after` and returns its suppress flag.
    ///
    /// The flag only matters when `exc` is present.
    fn exit(&self, exc: ExcInfo<'_>) -> Result<bool, Self::Error> {
        let suppress = self.after(exc);
        tracing::trace!(
            raised = exc.is_some(),
            suppress = matches!(suppress, Ok(true)),
            ok = suppress.is_ok(),
            "guard exited"
        );
        suppress
    }

    /// Runs `body` between `enter` and `exit`.
    ///
    /// The body's error comes back unchanged as [`Failure::Raised`] unless
    /// `after` suppresses it, in which case the block yields
    /// [`Outcome::Suppressed`]. If the body panics, `after` sees a
    /// [`Panicked`] triple and the panic then resumes; it is never
    /// suppressed.
    fn scope<T, E, M, F>(&self, body: F) -> Result<Outcome<T>, Failure<Self::Error, E>>
    where
        E: AsDynError<M>,
        F: FnOnce(Option<Self::Bound>) -> Result<T, E>,
    {
        let bound = self.enter().map_err(Failure::Hook)?;

        let result = match panic::catch_unwind(AssertUnwindSafe(|| body(bound))) {
            Ok(result) => result,
            Err(payload) => {
                let panicked = Panicked::from_payload(&*payload);
                match self.exit(ExcInfo::raised(&panicked)) {
                    Ok(true) => {
                        tracing::warn!(panic = %panicked.message, "exit hook cannot suppress a panic")
                    }
                    Ok(false) => {}
                    Err(_) => tracing::warn!(
                        panic = %panicked.message,
                        "exit hook failed while unwinding"
                    ),
                }
                panic::resume_unwind(payload)
            }
        };

        settle(self, result)
    }

    /// Wraps `func` so every call runs between `enter` and `exit`.
    ///
    /// Consumes the guard; decorate `&guard` (or an `Rc`/`Arc`) to keep a
    /// handle on it.
    fn decorate<F>(self, func: F) -> Decorated<Self, F>
    where
        Self: Sized,
    {
        Decorated::new(self, func)
    }
}

impl<G: ContextDecorator + ?Sized> ContextDecoratorExt for G {}

/// Wraps `func` with `guard`. Same as [`ContextDecoratorExt::decorate`].
pub fn decorate<G: ContextDecorator, F>(guard: G, func: F) -> Decorated<G, F> {
    Decorated::new(guard, func)
}

/// Exit half shared by both modes: report the result to `after` and decide
/// whether its error propagates.
pub(crate) fn settle<G, T, E, M>(
    guard: &G,
    result: Result<T, E>,
) -> Result<Outcome<T>, Failure<G::Error, E>>
where
    G: ContextDecorator + ?Sized,
    E: AsDynError<M>,
{
    match result {
        Ok(value) => {
            guard.exit(ExcInfo::NONE).map_err(Failure::Hook)?;
            Ok(Outcome::Returned(value))
        }
        Err(err) => {
            let suppress = guard.exit(ExcInfo::raised(&err)).map_err(Failure::Hook)?;
            if suppress {
                tracing::debug!(kind = <E as AsDynError<M>>::kind(), "error suppressed by exit hook");
                Ok(Outcome::Suppressed)
            } else {
                Err(Failure::Raised(err))
            }
        }
    }
}
