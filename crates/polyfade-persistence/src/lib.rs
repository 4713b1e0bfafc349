//! Engine state persistence.
//!
//! A single JSON snapshot of the position, live target, and session
//! counters, rewritten after every state-changing action. Load failures
//! are downgraded to a fresh start — the engine must never refuse to boot
//! over a bad state file — but the three failure modes (no file, corrupt
//! file, I/O error) are logged distinctly so operators can tell them apart.

pub mod error;
pub mod store;

pub use error::{PersistenceError, PersistenceResult};
pub use store::{BotState, LoadOutcome, StateStore};
