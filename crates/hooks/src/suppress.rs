//! Swallow errors of one type, let everything else through.

use contextguard_core::{ContextDecorator, ExcInfo};
use std::convert::Infallible;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;

/// Guard whose `after` suppresses exactly the errors of type `E`.
pub struct Suppress<E> {
    _kind: PhantomData<fn() -> E>,
}

impl<E> Suppress<E> {
    pub fn new() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<E> Default for Suppress<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Suppress<E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<E> Copy for Suppress<E> {}

impl<E> fmt::Debug for Suppress<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Suppress<{}>", std::any::type_name::<E>())
    }
}

impl<E: Error + 'static> ContextDecorator for Suppress<E> {
    type Bound = ();
    type Error = Infallible;

    fn after(&self, exc: ExcInfo<'_>) -> Result<bool, Infallible> {
        Ok(exc.is::<E>())
    }
}

/// Shorthand for [`Suppress::new`].
pub fn suppress<E: Error + 'static>() -> Suppress<E> {
    Suppress::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextguard_core::{decorate, ContextDecoratorExt, Outcome};

    #[derive(Debug, thiserror::Error)]
    #[error("not found")]
    struct NotFound;

    #[derive(Debug, thiserror::Error)]
    #[error("denied")]
    struct Denied;

    #[test]
    fn swallows_matching_kind() {
        let outcome = suppress::<NotFound>().scope(|_| Err::<u8, _>(NotFound));
        assert_eq!(outcome.unwrap(), Outcome::Suppressed);
    }

    #[test]
    fn lets_other_kinds_through() {
        let mut remove = decorate(suppress::<NotFound>(), |_path: &str| Err::<(), _>(Denied));
        assert!(remove.call(("/etc/passwd",)).is_err());
    }

    #[test]
    fn success_passes_through() {
        let outcome = suppress::<NotFound>().scope(|_| Ok::<_, Denied>("done"));
        assert_eq!(outcome.unwrap(), Outcome::Returned("done"));
    }

    #[test]
    fn debug_names_the_kind() {
        assert!(format!("{:?}", suppress::<NotFound>()).contains("NotFound"));
    }
}
