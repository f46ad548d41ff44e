pub mod message_store;
pub mod status_tracker;

pub use message_store::{MessageStore, PgMessageStore};
pub use status_tracker::{StatusChange, StatusTracker};
