//! Persistence layer
//!
//! Only the processing history lives here; the subscription ledger belongs to
//! the subscription service it backs.

pub mod history;

pub use history::{HistoryStore, InMemoryHistoryStore, JsonFileHistoryStore};
