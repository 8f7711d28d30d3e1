//! Chat front end for the entry store.
//!
//! Messages come in through a [`ChatTransport`](transport::ChatTransport),
//! are parsed into a [`Command`](command::Command), and answered with
//! [`Embed`](embed::Embed)s by the [`Dispatcher`](dispatcher::Dispatcher).

pub mod command;
pub mod config;
pub mod console;
pub mod dispatcher;
pub mod embed;
pub mod picker;
pub mod reactions;
pub mod transport;
