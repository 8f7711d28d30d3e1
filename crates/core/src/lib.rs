//! Domain building blocks shared by every dex crate.
//!
//! Nothing in here performs I/O: errors, id aliases, role lists, the
//! content normalizer, entry-resolution planning, and input validation.

pub mod content;
pub mod entry;
pub mod error;
pub mod resolve;
pub mod roles;
pub mod search;
pub mod session;
pub mod types;
