//! Input schema for users/events exports
//!
//! Raw records keep every field optional; the loader converts them into the
//! typed records of [`crate::types`] and builds a validated snapshot.

mod loader;
mod records;

pub use loader::*;
pub use records::*;
