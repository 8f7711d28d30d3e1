//! Authentication and authorization extractors.
//!
//! - [`session::AuthUser`] -- Resolves the `sid` cookie to a user.
//! - [`session::Viewer`] -- Like `AuthUser`, but anonymous requests pass.
//! - [`rbac::RequireEditor`] -- Requires an editor (admins included, blacklisted excluded).
//! - [`rbac::RequireAdmin`] -- Requires an admin.

pub mod rbac;
pub mod session;
