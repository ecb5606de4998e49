//! Guards that work both as a scoped block and as a function decorator.
//!
//! Foundation crate -- no async or I/O dependencies.

pub mod decorate;
pub mod error;
pub mod guard;
pub mod types;

pub use decorate::{Callable, Decorated};
pub use error::{ContextError, ContextResult, Failure, Panicked};
pub use guard::{decorate, ContextDecorator, ContextDecoratorExt};
pub use types::{AsDynError, Boxed, ExcInfo, ExcRecord, Outcome, Typed};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
