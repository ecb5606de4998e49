//! Error types raised by the guard machinery itself.
//!
//! Errors produced by guarded code are never wrapped in these; they reach
//! the caller as the caller's own type, inside [`Failure::Raised`].

use std::any::Any;
use std::convert::Infallible;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContextError {
    /// The exit hook swallowed the call's error, so no result exists.
    #[error("no result from `{callable}`: its error was suppressed by the exit hook")]
    ResultSuppressed { callable: String },
}

pub type ContextResult<T> = Result<T, ContextError>;

/// Why a guarded block or call did not produce an [`Outcome`].
///
/// `Hook` is a failure of the guard's own `before`/`after`. A failing
/// `after` masks whatever the governed code raised. `Raised` is the
/// governed code's error, untouched.
///
/// [`Outcome`]: crate::Outcome
#[derive(Debug, Error)]
pub enum Failure<H, E> {
    #[error(transparent)]
    Hook(H),

    #[error(transparent)]
    Raised(E),
}

impl<H, E> Failure<H, E> {
    pub fn is_hook(&self) -> bool {
        matches!(self, Failure::Hook(_))
    }

    pub fn hook(self) -> Option<H> {
        match self {
            Failure::Hook(err) => Some(err),
            Failure::Raised(_) => None,
        }
    }

    pub fn raised(self) -> Option<E> {
        match self {
            Failure::Hook(_) => None,
            Failure::Raised(err) => Some(err),
        }
    }

    /// Collapses both sides into one error type, for use with `?`.
    pub fn unify<X>(self) -> X
    where
        H: Into<X>,
        E: Into<X>,
    {
        match self {
            Failure::Hook(err) => err.into(),
            Failure::Raised(err) => err.into(),
        }
    }
}

impl<E> Failure<Infallible, E> {
    /// The governed code's error; guards with infallible hooks have no other.
    pub fn into_raised(self) -> E {
        match self {
            Failure::Hook(never) => match never {},
            Failure::Raised(err) => err,
        }
    }
}

/// A panic that unwound out of a scoped block, as seen by the exit hook.
///
/// The hook's suppress flag is ignored for panics; unwinding resumes after
/// the hook returns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("panicked: {message}")]
pub struct Panicked {
    pub message: String,
}

impl Panicked {
    pub(crate) fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "Box<dyn Any>".to_string()
        };
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("lock busy")]
    struct Busy;

    #[derive(Debug, Error, PartialEq)]
    #[error("write failed")]
    struct WriteFailed;

    #[derive(Debug, Error, PartialEq)]
    enum AppError {
        #[error(transparent)]
        Busy(#[from] Busy),
        #[error(transparent)]
        Write(#[from] WriteFailed),
    }

    #[test]
    fn failure_displays_transparently() {
        let hook: Failure<Busy, WriteFailed> = Failure::Hook(Busy);
        assert_eq!(hook.to_string(), "lock busy");
        assert!(hook.is_hook());

        let raised: Failure<Busy, WriteFailed> = Failure::Raised(WriteFailed);
        assert_eq!(raised.to_string(), "write failed");
        assert_eq!(raised.raised(), Some(WriteFailed));
    }

    #[test]
    fn unify_into_application_error() {
        let err: AppError = Failure::<Busy, WriteFailed>::Hook(Busy).unify();
        assert_eq!(err, AppError::Busy(Busy));
    }

    #[test]
    fn infallible_hooks_yield_the_raised_error() {
        let failure: Failure<Infallible, WriteFailed> = Failure::Raised(WriteFailed);
        assert_eq!(failure.into_raised(), WriteFailed);
    }

    #[test]
    fn panic_payload_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(Panicked::from_payload(&*payload).message, "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("formatted 7"));
        assert_eq!(Panicked::from_payload(&*payload).message, "formatted 7");

        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(Panicked::from_payload(&*payload).message, "Box<dyn Any>");
    }
}
