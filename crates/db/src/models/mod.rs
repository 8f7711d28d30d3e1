//! Row models and write DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! table row, plus any input structs its repository accepts.

pub mod config;
pub mod entry;
pub mod session;
pub mod user_preference;
