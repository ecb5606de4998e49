//! Decorator mode: a callable wrapped by a guard.

use std::borrow::Cow;
use std::fmt;

use crate::error::Failure;
use crate::guard::{settle, ContextDecorator, ContextDecoratorExt};
use crate::types::{AsDynError, Outcome};

/// A fallible callable taking its positional arguments as a tuple.
///
/// Implemented for every `FnMut(A1, .., An) -> Result<R, E>` up to eight
/// arguments. Methods are plain functions whose first argument is the
/// receiver, so `Type::method` decorates like any other function.
/// Keyword-style arguments are passed as a struct.
pub trait Callable<Args> {
    type Output;
    type Error;

    fn call_with(&mut self, args: Args) -> Result<Self::Output, Self::Error>;
}

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<Func, R, E, $($arg,)*> Callable<($($arg,)*)> for Func
        where
            Func: FnMut($($arg),*) -> Result<R, E>,
        {
            type Output = R;
            type Error = E;

            #[allow(non_snake_case)]
            #[inline]
            fn call_with(&mut self, ($($arg,)*): ($($arg,)*)) -> Result<R, E> {
                self($($arg),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(A1);
impl_callable!(A1, A2);
impl_callable!(A1, A2, A3);
impl_callable!(A1, A2, A3, A4);
impl_callable!(A1, A2, A3, A4, A5);
impl_callable!(A1, A2, A3, A4, A5, A6);
impl_callable!(A1, A2, A3, A4, A5, A6, A7);
impl_callable!(A1, A2, A3, A4, A5, A6, A7, A8);

/// A callable whose every invocation is bracketed by a guard's hooks.
///
/// Keeps the wrapped callable's name, taken from its type unless set with
/// [`named`](Self::named).
pub struct Decorated<G, F> {
    guard: G,
    func: F,
    name: Cow<'static, str>,
}

impl<G: ContextDecorator, F> Decorated<G, F> {
    pub fn new(guard: G, func: F) -> Self {
        Self {
            guard,
            func,
            name: Cow::Borrowed(std::any::type_name::<F>()),
        }
    }

    /// Overrides the recorded name, for closures whose type name is opaque.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Name of the wrapped callable.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn guard(&self) -> &G {
        &self.guard
    }

    /// The wrapped callable itself.
    pub fn inner(&self) -> &F {
        &self.func
    }

    pub fn into_parts(self) -> (G, F) {
        (self.guard, self.func)
    }

    /// Calls the wrapped callable between the guard's hooks.
    ///
    /// - `Ok(Outcome::Returned(r))` when the call succeeded.
    /// - `Ok(Outcome::Suppressed)` when it failed and `after` swallowed the
    ///   error. There is no result in this case.
    /// - `Err(Failure::Raised(e))` with the call's own error otherwise.
    /// - `Err(Failure::Hook(h))` when a hook failed. A failing `before`
    ///   skips the call.
    ///
    /// Panics in the callable are not caught and `after` does not see them.
    pub fn call<Args, M>(
        &mut self,
        args: Args,
    ) -> Result<Outcome<F::Output>, Failure<G::Error, F::Error>>
    where
        F: Callable<Args>,
        F::Error: AsDynError<M>,
    {
        let _span = tracing::trace_span!("decorated", name = %self.name).entered();

        // The bound value has no taker in this mode.
        let _ = self.guard.enter().map_err(Failure::Hook)?;
        let result = self.func.call_with(args);
        settle(&self.guard, result)
    }

    /// Like [`call`](Self::call) but demands the result, turning a
    /// suppressed call into [`ContextError::ResultSuppressed`].
    ///
    /// The call's own error still propagates unchanged through the outer
    /// `Result`.
    ///
    /// [`ContextError::ResultSuppressed`]: crate::ContextError::ResultSuppressed
    pub fn call_strict<Args, M>(
        &mut self,
        args: Args,
    ) -> Result<crate::ContextResult<F::Output>, Failure<G::Error, F::Error>>
    where
        F: Callable<Args>,
        F::Error: AsDynError<M>,
    {
        let outcome = self.call(args)?;
        Ok(outcome.into_result(&self.name))
    }
}

impl<G: fmt::Debug, F> fmt::Debug for Decorated<G, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorated")
            .field("name", &self.name)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl<G: Clone, F: Clone> Clone for Decorated<G, F> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
            func: self.func.clone(),
            name: self.name.clone(),
        }
    }
}
