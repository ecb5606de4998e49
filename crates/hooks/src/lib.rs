//! Ready-made guards built on `contextguard-core`.

pub mod recorder;
pub mod suppress;
pub mod traced;

pub use recorder::{Exit, Recorder, Snapshot};
pub use suppress::{suppress, Suppress};
pub use traced::Traced;
