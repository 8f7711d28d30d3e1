//! The entry store adapter and its collaborators.
//!
//! [`EntryStore`] is the single entry point both front ends use: lookups,
//! the resolution chain, edits with their forward-log history, moderation,
//! ownership, and the featured pointer. Every entry it returns has been
//! through [`normalize`].

pub mod error;
pub mod identity;
pub mod images;
pub mod normalize;
pub mod store;

pub use error::StoreError;
pub use identity::{IdentityCache, IdentityCacheConfig};
pub use images::{HttpImageResolver, ImageError, ImageResolver};
pub use store::{EditOutcome, EditRequest, EntryStore};
