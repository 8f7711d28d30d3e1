//! Dex event bus, outbound webhooks, and the moderation audit log.
//!
//! - [`EventBus`] : in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`EntryEvent`]: a committed create, edit, or delete.
//! - [`delivery`] : webhook delivery with retry.
//! - [`AuditLog`] : sink for edit/delete moderation records.
//! - [`NewEntryNotifier`] : background task announcing new entries.

pub mod audit;
pub mod bus;
pub mod delivery;
pub mod notifier;

pub use audit::{AuditAction, AuditError, AuditLog, AuditRecord, ChatLogWebhook, TracingAuditLog};
pub use bus::{EntryEvent, EntryEventKind, EventBus};
pub use delivery::webhook::WebhookDelivery;
pub use notifier::NewEntryNotifier;
