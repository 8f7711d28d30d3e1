//! External identity provider login.

pub mod oauth;
