//! # MacroChef State
//!
//! Profile lookup and the time-bounded result store that correlates
//! asynchronous jobs with their pollers.

pub mod clock;
pub mod profile;
pub mod store;
pub mod subscription;

pub use clock::{Clock, ManualClock, SystemClock};
pub use profile::{InMemoryProfileStore, ProfileStore};
pub use store::{InMemoryResultStore, ResultStore};
pub use subscription::{CompletionNotifier, CompletionSubscription};
