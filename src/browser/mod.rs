//! Browser runtime discovery and profile pre-warm.

pub mod discovery;
pub mod prewarm;

pub use discovery::discover_executable;
pub use prewarm::{prewarm, PrewarmOutcome};
